pub mod cli;
pub mod config;
pub mod formats;
pub mod model;
pub mod runtime;
pub mod source;
pub mod viewer;

pub fn run_cli() -> Result<(), String> {
    cli::run_cli()
}
