// Operator command-line parsing.
//
// Translates one line of terminal input into a UserCommand for the app
// loop. Validation that needs auction state (does the team exist, is the bid
// high enough) is left to the engine.

use auction_core::Category;
use thiserror::Error;

use crate::protocol::UserCommand;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("type a command, or `help` for the list")]
    Empty,

    #[error("unknown command `{0}`; type `help` for the list")]
    UnknownCommand(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{0}` is not a whole number of points")]
    InvalidNumber(String),

    #[error("unknown category `{0}` (legends, elite, rising, uncapped, unsold)")]
    UnknownCategory(String),
}

/// Parse one line of operator input.
pub fn parse_command(line: &str) -> Result<UserCommand, InputError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    if verb.is_empty() {
        return Err(InputError::Empty);
    }

    match verb.to_ascii_lowercase().as_str() {
        "pool" | "p" => Ok(UserCommand::ShowPool),
        "send" => Ok(UserCommand::Send {
            player: required(rest, "send", "a player")?,
        }),
        "bid" | "b" => {
            // Team names may contain spaces, so the amount is the last word.
            let (team, amount) = rest
                .rsplit_once(char::is_whitespace)
                .map(|(t, a)| (t.trim(), a))
                .filter(|(t, _)| !t.is_empty())
                .ok_or(InputError::MissingArgument {
                    command: "bid",
                    argument: "a team and an amount",
                })?;
            Ok(UserCommand::Bid {
                team: team.to_string(),
                amount: amount.to_string(),
            })
        }
        "undo" | "u" => Ok(UserCommand::Undo),
        "sold" => Ok(UserCommand::Sold),
        "unsold" => Ok(UserCommand::Unsold),
        "back" => Ok(UserCommand::Back),
        "results" => Ok(UserCommand::Results),
        "refund" => {
            if split_first(rest).is_none() {
                return Err(InputError::MissingArgument {
                    command: "refund",
                    argument: "a team and a player",
                });
            }
            Ok(UserCommand::Refund {
                target: rest.to_string(),
            })
        }
        "add-player" => parse_add_player(rest),
        "edit-base" => {
            let (player, amount) = rest
                .rsplit_once(char::is_whitespace)
                .map(|(p, a)| (p.trim(), a))
                .filter(|(p, _)| !p.is_empty())
                .ok_or(InputError::MissingArgument {
                    command: "edit-base",
                    argument: "a player and an amount",
                })?;
            Ok(UserCommand::EditBase {
                player: player.to_string(),
                amount: parse_points(amount)?,
            })
        }
        "reset-base" => Ok(UserCommand::ResetBase {
            player: required(rest, "reset-base", "a player")?,
        }),
        "remove-player" => Ok(UserCommand::RemovePlayer {
            player: required(rest, "remove-player", "a player")?,
        }),
        "add-team" => Ok(UserCommand::AddTeam {
            name: required(rest, "add-team", "a team name")?,
        }),
        "remove-team" => Ok(UserCommand::RemoveTeam {
            team: required(rest, "remove-team", "a team")?,
        }),
        "set-base" => {
            let (category, amount) = rest
                .rsplit_once(char::is_whitespace)
                .map(|(c, a)| (c.trim(), a))
                .ok_or(InputError::MissingArgument {
                    command: "set-base",
                    argument: "a category and an amount",
                })?;
            Ok(UserCommand::SetBase {
                category: parse_category(category)?,
                amount: parse_points(amount)?,
            })
        }
        "clear-unsold" => Ok(UserCommand::ClearUnsold),
        "reset" => match rest.to_ascii_lowercase().as_str() {
            "" => Ok(UserCommand::Reset { confirmed: false }),
            "confirm" => Ok(UserCommand::Reset { confirmed: true }),
            _ => Err(InputError::MissingArgument {
                command: "reset",
                argument: "`confirm` as its only argument",
            }),
        },
        "status" | "s" => Ok(UserCommand::Status),
        "help" | "h" | "?" => Ok(UserCommand::Help),
        "quit" | "q" | "exit" => Ok(UserCommand::Quit),
        other => Err(InputError::UnknownCommand(other.to_string())),
    }
}

/// `add-player <category> <base|-> <role> <name…>`
fn parse_add_player(rest: &str) -> Result<UserCommand, InputError> {
    const MISSING: InputError = InputError::MissingArgument {
        command: "add-player",
        argument: "a category, base price (or -), role and name",
    };
    let (category, rest) = split_first(rest).ok_or(MISSING)?;
    let (base, rest) = split_first(rest).ok_or(MISSING)?;
    let (role, name) = split_first(rest).ok_or(MISSING)?;

    let base_price = match base {
        "-" => None,
        amount => Some(parse_points(amount)?),
    };

    Ok(UserCommand::AddPlayer {
        category: parse_category(category)?,
        base_price,
        role: role.to_string(),
        name: name.to_string(),
    })
}

fn required(rest: &str, command: &'static str, argument: &'static str) -> Result<String, InputError> {
    if rest.is_empty() {
        Err(InputError::MissingArgument { command, argument })
    } else {
        Ok(rest.to_string())
    }
}

/// Split off the first word; both halves must be non-empty.
fn split_first(s: &str) -> Option<(&str, &str)> {
    let (first, rest) = s.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some((first, rest))
}

fn parse_points(s: &str) -> Result<u64, InputError> {
    s.replace(',', "")
        .parse()
        .map_err(|_| InputError::InvalidNumber(s.to_string()))
}

fn parse_category(s: &str) -> Result<Category, InputError> {
    Category::from_str_cat(s).ok_or_else(|| InputError::UnknownCategory(s.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_verbs_and_aliases() {
        assert_eq!(parse_command("pool").unwrap(), UserCommand::ShowPool);
        assert_eq!(parse_command("  SOLD ").unwrap(), UserCommand::Sold);
        assert_eq!(parse_command("u").unwrap(), UserCommand::Undo);
        assert_eq!(parse_command("q").unwrap(), UserCommand::Quit);
        assert_eq!(parse_command("?").unwrap(), UserCommand::Help);
    }

    #[test]
    fn send_takes_the_rest_of_the_line() {
        assert_eq!(
            parse_command("send Virat  Kohli").unwrap(),
            UserCommand::Send {
                player: "Virat  Kohli".into()
            }
        );
        assert_eq!(
            parse_command("send").unwrap_err(),
            InputError::MissingArgument {
                command: "send",
                argument: "a player"
            }
        );
    }

    #[test]
    fn bid_amount_is_last_word_and_kept_raw() {
        assert_eq!(
            parse_command("bid Royal Challengers 7500.5").unwrap(),
            UserCommand::Bid {
                team: "Royal Challengers".into(),
                amount: "7500.5".into()
            }
        );
        assert!(matches!(
            parse_command("bid 7000").unwrap_err(),
            InputError::MissingArgument { command: "bid", .. }
        ));
    }

    #[test]
    fn refund_keeps_team_and_player_together() {
        assert_eq!(
            parse_command("refund Thunder Strikers Asha Rao").unwrap(),
            UserCommand::Refund {
                target: "Thunder Strikers Asha Rao".into()
            }
        );
        assert!(matches!(
            parse_command("refund t-1").unwrap_err(),
            InputError::MissingArgument { command: "refund", .. }
        ));
    }

    #[test]
    fn reset_needs_explicit_confirmation() {
        assert_eq!(
            parse_command("reset").unwrap(),
            UserCommand::Reset { confirmed: false }
        );
        assert_eq!(
            parse_command("reset CONFIRM").unwrap(),
            UserCommand::Reset { confirmed: true }
        );
        assert!(matches!(
            parse_command("reset now").unwrap_err(),
            InputError::MissingArgument { command: "reset", .. }
        ));
    }

    #[test]
    fn add_player_with_and_without_base() {
        assert_eq!(
            parse_command("add-player rising 12,000 Bowler Asha Rao").unwrap(),
            UserCommand::AddPlayer {
                category: Category::RisingStars,
                base_price: Some(12_000),
                role: "Bowler".into(),
                name: "Asha Rao".into()
            }
        );
        assert_eq!(
            parse_command("add-player Elite - Keeper Ravi").unwrap(),
            UserCommand::AddPlayer {
                category: Category::Elite,
                base_price: None,
                role: "Keeper".into(),
                name: "Ravi".into()
            }
        );
        assert_eq!(
            parse_command("add-player captains - Keeper Ravi").unwrap_err(),
            InputError::UnknownCategory("captains".into())
        );
        assert!(matches!(
            parse_command("add-player elite -").unwrap_err(),
            InputError::MissingArgument { .. }
        ));
    }

    #[test]
    fn numeric_arguments_are_validated() {
        assert_eq!(
            parse_command("edit-base Asha Rao 9000").unwrap(),
            UserCommand::EditBase {
                player: "Asha Rao".into(),
                amount: 9000
            }
        );
        assert_eq!(
            parse_command("edit-base Asha lots").unwrap_err(),
            InputError::InvalidNumber("lots".into())
        );
        assert_eq!(
            parse_command("set-base Rising Stars 11000").unwrap(),
            UserCommand::SetBase {
                category: Category::RisingStars,
                amount: 11_000
            }
        );
    }

    #[test]
    fn empty_and_unknown_lines() {
        assert_eq!(parse_command("   ").unwrap_err(), InputError::Empty);
        assert_eq!(
            parse_command("hammer").unwrap_err(),
            InputError::UnknownCommand("hammer".into())
        );
    }
}
