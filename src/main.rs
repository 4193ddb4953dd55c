mod actions;
mod cli;
mod config;
mod control;
mod dispatch;
mod doctor;
mod error;
mod logging;
mod overlay;
mod pipeline;
mod signal;
mod source;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
