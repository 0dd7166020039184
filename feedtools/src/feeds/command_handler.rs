use std::fs;

use anyhow::{anyhow, Context, Result};
use feed_engine::{
    config::{load_channel_mappings, load_stores, select_stores, ChannelMappings, FeedSettings, StoreEntry},
    helpers::parse_products_dump,
    mapping::FeedAssembler,
    xml::{read_feed_items, write_feed, FeedHeader},
    FeedPipeline,
    ShopifyBackend,
};
use log::*;

use crate::{
    feeds::command_def::{FeedCommand, GenerateParams, RenderParams, UploadParams},
    formatting::{format_channels, format_run_reports, format_stores},
};

/// Runs `command`. Returns `Ok(false)` if the command completed but something in it failed, e.g. one of the stores.
pub async fn handle_feed_command(settings: FeedSettings, command: FeedCommand) -> Result<bool> {
    use FeedCommand::*;
    match command {
        Generate(params) => generate(settings, params).await,
        Check => check(&settings),
        Render(params) => render(&settings, params),
        Upload(params) => upload(settings, params).await,
    }
}

fn load_configuration(settings: &FeedSettings, stores: &[String]) -> Result<(ChannelMappings, Vec<StoreEntry>)> {
    let mappings = load_channel_mappings(&settings.mappings_path)
        .with_context(|| format!("Could not load the channel mappings from {}", settings.mappings_path.display()))?;
    let entries = load_stores(&settings.config_path, &settings.api_version)
        .with_context(|| format!("Could not load the store configuration from {}", settings.config_path.display()))?;
    Ok((mappings, select_stores(entries, stores)))
}

async fn generate(mut settings: FeedSettings, params: GenerateParams) -> Result<bool> {
    if let Some(dir) = params.publish_dir {
        settings.output.publish_dir = Some(dir);
    }
    if params.no_compress {
        settings.output.compress = false;
    }
    if params.no_xml {
        settings.output.keep_xml = false;
    }
    let (mappings, stores) = load_configuration(&settings, &params.stores)?;
    mappings.select(&params.channels)?;
    info!("🚀️ Generating feeds for {} stores into {}", stores.len(), settings.output.output_dir.display());
    let backend = ShopifyBackend::new(settings.clone());
    let pipeline = FeedPipeline::new(backend.clone(), mappings, settings.output.clone());
    let reports = if params.upload {
        pipeline.with_uploader(backend).run(stores, &params.channels).await?
    } else {
        pipeline.run(stores, &params.channels).await?
    };
    println!("{}", format_run_reports(&reports));
    Ok(reports.iter().all(|r| r.is_success()))
}

fn check(settings: &FeedSettings) -> Result<bool> {
    let mappings = match load_channel_mappings(&settings.mappings_path) {
        Ok(mappings) => {
            println!("{}", format_channels(&mappings));
            Some(mappings)
        },
        Err(e) => {
            println!("❌️ {}: {e}", settings.mappings_path.display());
            None
        },
    };
    let stores = match load_stores(&settings.config_path, &settings.api_version) {
        Ok(stores) => {
            println!("{}", format_stores(&stores));
            Some(stores)
        },
        Err(e) => {
            println!("❌️ {}: {e}", settings.config_path.display());
            None
        },
    };
    let ok = mappings.is_some() && stores.map_or(false, |s| !s.is_empty() && s.iter().all(|e| e.is_ok()));
    if ok {
        println!("✅️ The configuration is valid");
    }
    Ok(ok)
}

fn render(settings: &FeedSettings, params: RenderParams) -> Result<bool> {
    let (mappings, stores) = load_configuration(settings, &[params.store.clone()])?;
    let store = stores
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Store {} is not configured", params.store))?
        .with_context(|| format!("Store {} cannot be used", params.store))?;
    let mapping = mappings.select(&[params.channel.clone()])?.remove(0);
    let json = fs::read_to_string(&params.products)
        .with_context(|| format!("Could not read {}", params.products.display()))?;
    let products = parse_products_dump(&json)
        .with_context(|| format!("{} is not a Shopify product list", params.products.display()))?;
    let feed = FeedAssembler::new(&store)
        .assemble(&products, &[mapping])
        .pop()
        .ok_or_else(|| anyhow!("Nothing was assembled for {}", mapping.name))?;
    if feed.misses > 0 {
        eprintln!("ℹ️ {} source lookups found nothing and were left empty", feed.misses);
    }
    let header = FeedHeader::for_channel(&store, &mapping.name);
    let xml = String::from_utf8(write_feed(&header, mapping.namespace.as_ref(), &feed.items)?)?;
    print!("{xml}");
    if !params.check {
        return Ok(true);
    }
    let parsed = read_feed_items(&xml)?;
    let identical = parsed == feed.items;
    if identical {
        eprintln!("✅️ {} items read back unchanged", parsed.len());
    } else {
        eprintln!("❌️ The rendered feed does not read back to the mapped items");
    }
    Ok(identical)
}

async fn upload(settings: FeedSettings, params: UploadParams) -> Result<bool> {
    let (mappings, stores) = load_configuration(&settings, &params.stores)?;
    let backend = ShopifyBackend::new(settings.clone());
    let pipeline = FeedPipeline::new(backend.clone(), mappings, settings.output.clone()).with_uploader(backend);
    let reports = pipeline.upload_existing(stores, &params.channels).await?;
    println!("{}", format_run_reports(&reports));
    Ok(reports.iter().all(|r| r.is_success() && r.channels.iter().all(|c| !c.upload_failed())))
}
