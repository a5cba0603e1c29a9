//! CLI argument parsing and user prompts for Mapwatch.

mod args;
mod prompts;

pub use args::{parse_args, CliConfig, VERSION};
pub use prompts::prompt_credentials;
