//! The feed run: for each store, fetch all products, map every variant for every channel, write the feed files and
//! optionally upload them. Stores are processed one after the other, and a failure only ends the run of the store it
//! happened in.
use std::path::PathBuf;

use log::*;
use shopify_tools::ShopifyApiError;

use crate::{
    config::{ChannelMapping, ChannelMappings, OutputOptions, StoreEntry},
    errors::{ConfigError, FeedError},
    feed_types::Store,
    mapping::{AssembledFeed, FeedAssembler},
    output::{gzip_path, published_file_name, write_feed_files, xml_path, WrittenFeed},
    traits::{FeedUploader, NoUpload, ProductSource},
    xml::{write_feed, FeedHeader},
};

/// What happened to one channel of one store.
#[derive(Debug)]
pub struct ChannelReport {
    pub channel: String,
    pub items: usize,
    /// Source paths that resolved to nothing, over all items.
    pub misses: usize,
    pub files: WrittenFeed,
    /// `None` if no upload was attempted.
    pub upload: Option<Result<String, FeedError>>,
}

impl ChannelReport {
    fn new(channel: &str) -> Self {
        Self { channel: channel.to_string(), items: 0, misses: 0, files: WrittenFeed::default(), upload: None }
    }

    pub fn upload_failed(&self) -> bool {
        matches!(self.upload, Some(Err(_)))
    }
}

/// The outcome of one store's run.
#[derive(Debug)]
pub struct StoreRunReport {
    pub store: String,
    pub products: usize,
    pub variants: usize,
    pub channels: Vec<ChannelReport>,
    /// The error that ended the store's run early, if any. Upload errors are reported per channel instead.
    pub error: Option<FeedError>,
}

impl StoreRunReport {
    fn new(store: &str) -> Self {
        Self { store: store.to_string(), products: 0, variants: 0, channels: vec![], error: None }
    }

    fn failed(store: &str, error: FeedError) -> Self {
        Self { error: Some(error), ..Self::new(store) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct FeedPipeline<S, U = NoUpload> {
    source: S,
    uploader: U,
    mappings: ChannelMappings,
    output: OutputOptions,
}

impl<S: ProductSource> FeedPipeline<S, NoUpload> {
    pub fn new(source: S, mappings: ChannelMappings, output: OutputOptions) -> Self {
        Self { source, uploader: NoUpload, mappings, output: output.normalized() }
    }
}

impl<S, U> FeedPipeline<S, U>
where
    S: ProductSource,
    U: FeedUploader,
{
    /// Replaces the uploader. Feeds are uploaded right after they are written.
    pub fn with_uploader<V: FeedUploader>(self, uploader: V) -> FeedPipeline<S, V> {
        FeedPipeline { source: self.source, uploader, mappings: self.mappings, output: self.output }
    }

    pub fn mappings(&self) -> &ChannelMappings {
        &self.mappings
    }

    pub fn output(&self) -> &OutputOptions {
        &self.output
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Runs every store in `stores` for the channels named in `channels` (every channel if empty).
    ///
    /// Unknown channel names fail the whole run before anything is fetched. Otherwise there is one report per store
    /// entry, in the same order.
    pub async fn run(&self, stores: Vec<StoreEntry>, channels: &[String]) -> Result<Vec<StoreRunReport>, ConfigError> {
        let channels = self.mappings.select(channels)?;
        let mut reports = Vec::with_capacity(stores.len());
        for entry in stores {
            let report = match entry {
                Ok(store) => self.run_store(&store, &channels).await,
                Err(e) => {
                    let name = match &e {
                        ConfigError::Store { store, .. } => store.clone(),
                        _ => "?".to_string(),
                    };
                    error!("🪛️ Skipping store {name}. {e}");
                    StoreRunReport::failed(&name, e.into())
                },
            };
            reports.push(report);
        }
        Ok(reports)
    }

    async fn run_store(&self, store: &Store, channels: &[&ChannelMapping]) -> StoreRunReport {
        let mut report = StoreRunReport::new(&store.name);
        let products = match self.source.fetch_products(store).await {
            Ok(products) => products,
            Err(source) => {
                let e = FeedError::Fetch { store: store.name.clone(), source };
                error!("📦️ {e}. Existing feeds of {} are left untouched.", store.name);
                report.error = Some(e);
                return report;
            },
        };
        report.products = products.len();
        report.variants = products.iter().map(|p| p.variants.len()).sum();
        info!("📦️ {} has {} products with {} variants", store.name, report.products, report.variants);
        let feeds = FeedAssembler::new(store).assemble(&products, channels);
        for (feed, mapping) in feeds.into_iter().zip(channels) {
            match self.build_channel_feed(store, mapping, feed) {
                Ok(channel_report) => report.channels.push(channel_report),
                Err(e) => {
                    error!("💾️ {e}");
                    report.error = Some(e);
                    return report;
                },
            }
        }
        if self.uploader.is_enabled() {
            for channel in &mut report.channels {
                let local = channel.files.gzip_path.clone().or_else(|| channel.files.xml_path.clone());
                if let Some(local) = local {
                    channel.upload = Some(self.upload_one(store, &channel.channel, local).await);
                }
            }
        }
        report
    }

    /// Serialises and writes one channel's feed.
    fn build_channel_feed(
        &self,
        store: &Store,
        mapping: &ChannelMapping,
        feed: AssembledFeed,
    ) -> Result<ChannelReport, FeedError> {
        let mut report = ChannelReport::new(&mapping.name);
        report.items = feed.items.len();
        report.misses = feed.misses;
        if feed.misses > 0 {
            debug!("{} source lookups found nothing in the {} feed of {}", feed.misses, mapping.name, store.name);
        }
        let header = FeedHeader::for_channel(store, &mapping.name);
        let xml = write_feed(&header, mapping.namespace.as_ref(), &feed.items).map_err(|source| {
            FeedError::Serialization { store: store.name.clone(), channel: mapping.name.clone(), source }
        })?;
        report.files = write_feed_files(&self.output, store, &mapping.name, &xml)
            .map_err(|source| FeedError::Write { store: store.name.clone(), channel: mapping.name.clone(), source })?;
        info!("💾️ {} {} feed: {} variants", store.name, mapping.name, report.items);
        Ok(report)
    }

    async fn upload_one(&self, store: &Store, channel: &str, local: PathBuf) -> Result<String, FeedError> {
        let mut file_name = published_file_name(store, channel);
        if local.extension().map_or(false, |ext| ext == "xml") {
            file_name = file_name.trim_end_matches(".gz").to_string();
        }
        match self.uploader.upload(store, &local, &file_name).await {
            Ok(url) => Ok(url),
            Err(source) => {
                let e = FeedError::Upload { store: store.name.clone(), file: file_name, source };
                warn!("📤️ {e}. The local file is kept.");
                Err(e)
            },
        }
    }

    /// Uploads the feed files already on disk, without fetching or writing anything.
    pub async fn upload_existing(
        &self,
        stores: Vec<StoreEntry>,
        channels: &[String],
    ) -> Result<Vec<StoreRunReport>, ConfigError> {
        let channels = self.mappings.select(channels)?;
        let mut reports = Vec::with_capacity(stores.len());
        for entry in stores {
            let store = match entry {
                Ok(store) => store,
                Err(e) => {
                    let name = match &e {
                        ConfigError::Store { store, .. } => store.clone(),
                        _ => "?".to_string(),
                    };
                    reports.push(StoreRunReport::failed(&name, e.into()));
                    continue;
                },
            };
            let mut report = StoreRunReport::new(&store.name);
            for mapping in &channels {
                let mut channel = ChannelReport::new(&mapping.name);
                let gz = gzip_path(&self.output.output_dir, &store, &mapping.name);
                let xml = xml_path(&self.output.output_dir, &store, &mapping.name);
                let local = [gz, xml].into_iter().find(|p| p.is_file());
                channel.upload = Some(match local {
                    Some(local) => self.upload_one(&store, &mapping.name, local).await,
                    None => {
                        let file = published_file_name(&store, &mapping.name);
                        warn!("📤️ There is no {} feed for {} to upload. Generate it first.", mapping.name, store.name);
                        let source = ShopifyApiError::IOError(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("No feed file in {}", self.output.output_dir.join(&store.name).display()),
                        ));
                        Err(FeedError::Upload { store: store.name.clone(), file, source })
                    },
                });
                report.channels.push(channel);
            }
            reports.push(report);
        }
        Ok(reports)
    }
}
