use clap::Parser;
use playdeck::ui::{OutputMode, PlainRenderer, Renderer};
use playdeck::Cli;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PLAYDECK_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match playdeck::runner::run(cli) {
        Ok(output) => {
            if !output.trim().is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            let mut renderer = PlainRenderer::stderr(OutputMode::from_env());
            let _ = renderer.error_block(&err.into_message_block());
            std::process::exit(1);
        }
    }
}
