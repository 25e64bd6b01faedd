use anyhow::Context;
use clap::Parser;
use rosterkit::{
    console_app::{self, ConsoleOptions},
    exporter_for, init_logging, open_store, Config, RosterScreen, StoreBackend, BUILD_DATE,
    VERSION,
};
use std::path::PathBuf;
use tokio::io::BufReader;

/// Student roster manager
#[derive(Debug, Parser)]
#[command(name = "rosterkit", version)]
struct Args {
    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Student data file, overriding the configured one
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Keep records in memory only
    #[arg(long, conflicts_with = "data")]
    memory: bool,

    /// Seed an empty store with sample students
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(data) = args.data {
        config.store.backend = StoreBackend::JsonFile;
        config.store.data_path = data;
    }
    if args.memory {
        config.store.backend = StoreBackend::Memory;
    }
    if args.demo {
        config.store.seed_demo_data = true;
    }
    config.validate()?;

    init_logging(&config.logging)?;
    tracing::info!("RosterKit {} (built {})", VERSION, BUILD_DATE);

    let store = open_store(&config.store).await?;
    let criteria = config.list.criteria()?;
    let screen = RosterScreen::new(store, criteria, tokio::runtime::Handle::current());

    let options = ConsoleOptions {
        exporter: exporter_for(config.export.format, &config.export.title),
        output_directory: config.export.output_directory.clone(),
    };

    let stdin = BufReader::new(tokio::io::stdin());
    console_app::run(&screen, &options, stdin, std::io::stdout()).await?;

    screen.teardown();
    Ok(())
}
