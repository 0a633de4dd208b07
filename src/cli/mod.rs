pub mod commands;

pub use commands::{Cli, Commands, USER_ENV, execute, run};
