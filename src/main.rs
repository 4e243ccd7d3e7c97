use anyhow::Context;
use umbra::{AppConfig, LoggingConfig, init_logging};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = AppConfig::new().title("Umbra").size(1280, 720);
    umbra::run(config).context("shadow demo exited with an error")
}
