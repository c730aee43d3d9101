pub mod console;
pub mod output;
mod shell;

pub use shell::{run_cli, CliMode, CliOptions, SCRIPT_ENV};
