// Plain-text rendering of UI updates for the terminal.

use std::fmt::Write as _;

use auction_core::{RoundSnapshot, Stage, Team, UnsoldEntry};

use crate::protocol::{PoolGroup, TeamSummary, UiUpdate};

pub const HELP_TEXT: &str = "\
Commands:
  pool                                  list the player pool
  send <player>                         open a round for a player
  bid <team> <amount>                   place a bid
  undo                                  reverse the last bid
  sold | unsold                         close the round
  back                                  abandon the round / leave results
  results                               show every roster and the unsold list
  refund <team> <player>                take a player off a roster
  add-player <cat> <base|-> <role> <name>
  edit-base <player> <amount>  reset-base <player>  remove-player <player>
  add-team <name>  remove-team <team>  set-base <cat> <amount>
  clear-unsold  status  help  quit
  reset confirm                         wipe everything and start over
Categories: legends, elite, rising, uncapped, unsold";

/// Render one update as terminal text.
pub fn render(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Info(msg) => msg.clone(),
        UiUpdate::Rejected(err) => format!("! {err}"),
        UiUpdate::Round(snapshot) => render_round(snapshot),
        UiUpdate::Sold(sale) => format!(
            "SOLD: {} to {} for {}",
            sale.player_name,
            sale.team_name,
            format_points(sale.bid)
        ),
        UiUpdate::Unsold(receipt) => format!("UNSOLD: {}", receipt.player_name),
        UiUpdate::Refunded(refund) => format!(
            "Removed {} from {}; refunded {}",
            refund.player_name,
            refund.team_name,
            format_points(refund.refund)
        ),
        UiUpdate::Pool(groups) => render_pool(groups),
        UiUpdate::Teams(teams) => render_teams(teams),
        UiUpdate::Results { teams, unsold } => render_results(teams, unsold),
        UiUpdate::Help => HELP_TEXT.to_string(),
    }
}

/// `1234567` -> `1,234,567 pts`
pub fn format_points(points: u64) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + 8);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push_str(" pts");
    out
}

fn render_round(snapshot: &RoundSnapshot) -> String {
    let Some(player) = &snapshot.active_player else {
        let stage = match snapshot.stage {
            Stage::Pool => "pool",
            Stage::Auction => "auction",
            Stage::Results => "results",
        };
        return format!("No player on the block (stage: {stage})");
    };

    let mut out = format!(
        "On the block: {} ({}, {}) base {}",
        player.name,
        player.role,
        player.category,
        format_points(player.base_price)
    );
    match (&snapshot.current_leader, snapshot.current_bid) {
        (Some(leader), Some(bid)) => {
            let _ = write!(out, "\n  Leading: {} at {}", leader.name, format_points(bid));
        }
        _ => out.push_str("\n  No bids yet"),
    }
    let _ = write!(
        out,
        "\n  Next bid: {}",
        format_points(snapshot.suggested_next_bid)
    );
    if !snapshot.bid_history.is_empty() {
        out.push_str("\n  History:");
        for record in snapshot.bid_history.iter().rev() {
            let _ = write!(out, "\n    {:<20} {}", record.team_name, format_points(record.bid));
        }
    }
    out
}

fn render_pool(groups: &[PoolGroup]) -> String {
    if groups.is_empty() {
        return "The player pool is empty".to_string();
    }
    let mut out = String::new();
    for group in groups {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{} ({})", group.category, group.players.len());
        for p in &group.players {
            let _ = write!(
                out,
                "\n  {:<6} {:<24} {:<14} {:>12}",
                p.id,
                p.name,
                p.role,
                format_points(p.base_price)
            );
            if let Some(owner) = &p.owner {
                let _ = write!(out, "  [{owner}]");
            }
        }
    }
    out
}

fn render_teams(teams: &[TeamSummary]) -> String {
    if teams.is_empty() {
        return "No teams registered".to_string();
    }
    teams
        .iter()
        .map(|t| {
            format!(
                "{:<6} {:<24} {:>14} left  {:>14} spent  {} player(s)",
                t.id,
                t.name,
                format_points(t.budget),
                format_points(t.spent),
                t.roster_len
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_results(teams: &[Team], unsold: &[UnsoldEntry]) -> String {
    let mut out = String::new();
    if teams.is_empty() {
        out.push_str("No teams registered");
    }
    for team in teams {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        let _ = write!(
            out,
            "{} ({} left)",
            team.name,
            format_points(team.budget)
        );
        if team.roster.is_empty() {
            out.push_str("\n  (no players)");
        }
        for entry in &team.roster {
            let _ = write!(
                out,
                "\n  {:<24} {:<14} {:>12}",
                entry.player.name,
                entry.player.role,
                format_points(entry.winning_bid)
            );
        }
    }

    let _ = write!(out, "\n\nUnsold Players ({})", unsold.len());
    if unsold.is_empty() {
        out.push_str("\n  (none)");
    }
    for entry in unsold {
        let player = &entry.player;
        let _ = write!(
            out,
            "\n  {:<24} {:<14} {:<14} {:>12}",
            player.name,
            player.role,
            player.category.display_str(),
            format_points(player.base_price)
        );
    }
    out
}
