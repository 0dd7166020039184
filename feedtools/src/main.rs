use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use feed_engine::config::FeedSettings;
use log::*;

mod feeds;
mod formatting;

use feeds::{handle_feed_command, FeedCommand};

#[derive(Parser, Debug)]
#[command(version, about = "Variant-level advertising feeds for Shopify stores")]
pub struct Arguments {
    /// The store credentials file. Overrides FEED_CONFIG_PATH
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
    /// The channel mappings file. Overrides FEED_MAPPINGS_PATH
    #[arg(short = 'm', long = "mappings", global = true)]
    mappings: Option<PathBuf>,
    /// The directory feeds are written to and read from. Overrides FEED_OUTPUT_DIR
    #[arg(short = 'o', long = "output", global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: FeedCommand,
}

impl Arguments {
    fn settings(&self) -> FeedSettings {
        let mut settings = FeedSettings::from_env_or_default();
        if let Some(path) = &self.config {
            settings.config_path = path.clone();
        }
        if let Some(path) = &self.mappings {
            settings.mappings_path = path.clone();
        }
        if let Some(dir) = &self.output {
            settings.output.output_dir = dir.clone();
        }
        settings
    }
}

fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let settings = cli.settings();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Could not start the async runtime. {e}");
            std::process::exit(2);
        },
    };
    match runtime.block_on(handle_feed_command(settings, cli.command)) {
        Ok(true) => debug!("Bye!"),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(2);
        },
    }
}
