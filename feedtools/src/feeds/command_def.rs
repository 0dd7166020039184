use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum FeedCommand {
    /// Fetch products from every configured store and write one feed per store and channel.
    Generate(GenerateParams),
    /// Load the configuration files and report any problems. No requests are made.
    Check,
    /// Map a local product dump with one store's settings and print the feed to stdout. Handy for trying out
    /// mapping changes without touching the API.
    Render(RenderParams),
    /// Upload the feed files that are already on disk to Shopify Files.
    Upload(UploadParams),
}

#[derive(Debug, Args)]
pub struct GenerateParams {
    /// Only generate feeds for these stores. May be repeated
    #[arg(short = 's', long = "store")]
    pub stores: Vec<String>,
    /// Only generate these channels. May be repeated
    #[arg(short = 'n', long = "channel")]
    pub channels: Vec<String>,
    /// Upload the compressed feeds to Shopify Files once they are written
    #[arg(short = 'u', long = "upload")]
    pub upload: bool,
    /// Also copy every compressed feed into this directory, e.g. for static hosting. Overrides FEED_PUBLISH_DIR
    #[arg(long = "publish-dir")]
    pub publish_dir: Option<PathBuf>,
    /// Do not write the gzipped feeds
    #[arg(long = "no-compress")]
    pub no_compress: bool,
    /// Do not write the plain XML feeds
    #[arg(long = "no-xml")]
    pub no_xml: bool,
}

#[derive(Debug, Args)]
pub struct RenderParams {
    /// A JSON file with products, either a products.json response or a bare array of products
    #[arg(short = 'p', long = "products")]
    pub products: PathBuf,
    /// The store whose language, currency and domain are used
    #[arg(short = 's', long = "store")]
    pub store: String,
    /// The channel to render
    #[arg(short = 'n', long = "channel")]
    pub channel: String,
    /// Parse the rendered feed back and compare it against the mapped items
    #[arg(long = "check")]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct UploadParams {
    /// Only upload feeds of these stores. May be repeated
    #[arg(short = 's', long = "store")]
    pub stores: Vec<String>,
    /// Only upload these channels. May be repeated
    #[arg(short = 'n', long = "channel")]
    pub channels: Vec<String>,
}
