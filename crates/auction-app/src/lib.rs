// Library root: exposes the application modules to the binary and to
// integration tests.

pub mod app;
pub mod config;
pub mod db;
pub mod import;
pub mod input;
pub mod protocol;
pub mod view;
