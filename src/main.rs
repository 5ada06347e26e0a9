mod builtins;
mod completion;
mod config;
mod dispatch;
mod error;
mod history;
mod parser;
mod process;
mod reader;
mod recall;
mod repl;
mod signals;
mod util;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("TINYSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Without the handler the read loop cannot survive Ctrl-C.
    signals::install_interrupt_handler().context("unable to install SIGINT handler")?;

    let config = config::Config::from_env();
    repl::start_repl(&config);
    Ok(())
}
