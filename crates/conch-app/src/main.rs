//! conch interactive shell entry point.
//!
//! Composes the built-in and demo command registries behind one help
//! listing, one completer and one tool-tip resolver, then reads commands
//! from stdin until `quit`, `exit` or end of input.
//! The first argument (or `$CONCH_CONFIG`) names a TOML config file.

mod background;
mod commands;
mod completers;
mod shell;

use anyhow::Result;

use conch_console::Session;
use conch_types::ShellConfig;

use shell::Shell;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = ShellConfig::resolve(std::env::args().nth(1).as_deref())?;
    log::info!(
        "Starting conch (completer: {:?}, multiline: {})",
        config.completer,
        config.multiline,
    );

    let session = Session::stdout();
    let mut shell = Shell::build(&config, session.clone())?;
    // Tickers run until the process exits.
    let _tasks = background::start(&config, &session, shell.tasks())?;

    shell.run(std::io::stdin().lock())?;
    log::info!("conch exiting");
    Ok(())
}
