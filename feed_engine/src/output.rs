//! Feed files on disk.
//!
//! Files live at `{output_dir}/{store}/{channel}_{language}_{currency}.xml`, with a gzip sibling ending in `.xml.gz`.
//! Every file is written to a temporary file in the target directory first and then renamed over the old one, so a
//! reader never sees half a feed.
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};
use log::*;
use tempfile::NamedTempFile;

use crate::{config::OutputOptions, feed_types::Store, helpers::human_size};

/// The files written for one store and channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenFeed {
    pub xml_path: Option<PathBuf>,
    pub gzip_path: Option<PathBuf>,
    pub published_path: Option<PathBuf>,
    /// Size of the uncompressed document.
    pub xml_size: u64,
    pub gzip_size: Option<u64>,
}

impl WrittenFeed {
    /// Compressed size as a share of the uncompressed size.
    pub fn compression_ratio(&self) -> Option<f64> {
        match self.gzip_size {
            Some(gz) if self.xml_size > 0 => Some(gz as f64 / self.xml_size as f64),
            _ => None,
        }
    }
}

pub fn store_dir(output_dir: &Path, store: &Store) -> PathBuf {
    output_dir.join(&store.name)
}

pub fn xml_path(output_dir: &Path, store: &Store, channel: &str) -> PathBuf {
    store_dir(output_dir, store).join(format!("{}.xml", store.feed_file_stem(channel)))
}

pub fn gzip_path(output_dir: &Path, store: &Store, channel: &str) -> PathBuf {
    store_dir(output_dir, store).join(format!("{}.xml.gz", store.feed_file_stem(channel)))
}

/// `{store}_{channel}_{language}_{currency}.xml.gz`, the flat name used for published and uploaded copies.
pub fn published_file_name(store: &Store, channel: &str) -> String {
    format!("{}_{}.xml.gz", store.name, store.feed_file_stem(channel))
}

pub fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 4), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Replaces `path` with `bytes`. The parent directory is created if needed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Writes the feed document `xml` for `store` and `channel` according to `options`.
pub fn write_feed_files(options: &OutputOptions, store: &Store, channel: &str, xml: &[u8]) -> io::Result<WrittenFeed> {
    let options = options.clone().normalized();
    let mut written = WrittenFeed { xml_size: xml.len() as u64, ..Default::default() };
    if options.keep_xml {
        let path = xml_path(&options.output_dir, store, channel);
        write_atomically(&path, xml)?;
        info!("💾️ Saved {} ({})", path.display(), human_size(written.xml_size));
        written.xml_path = Some(path);
    }
    if options.compress {
        let compressed = gzip(xml)?;
        let path = gzip_path(&options.output_dir, store, channel);
        write_atomically(&path, &compressed)?;
        written.gzip_size = Some(compressed.len() as u64);
        let ratio = written.compression_ratio().map(|r| format!(", {:.0}% of original", r * 100.0)).unwrap_or_default();
        info!("💾️ Compressed {} ({}{ratio})", path.display(), human_size(compressed.len() as u64));
        if let Some(publish_dir) = &options.publish_dir {
            let published = publish_dir.join(published_file_name(store, channel));
            write_atomically(&published, &compressed)?;
            debug!("💾️ Published {}", published.display());
            written.published_path = Some(published);
        }
        written.gzip_path = Some(path);
    } else if options.publish_dir.is_some() {
        warn!("💾️ Compression is off, so the {channel} feed of {} is not published", store.name);
    }
    Ok(written)
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use feed_common::Secret;
    use flate2::read::GzDecoder;

    use super::*;

    fn store() -> Store {
        Store {
            name: "FR".into(),
            shop_domain: "bisgaard-fr.myshopify.com".into(),
            access_token: Secret::new("t".into()),
            language: "fr".into(),
            currency: "EUR".into(),
            api_version: "2025-10".into(),
        }
    }

    #[test]
    fn file_names() {
        let store = store();
        let dir = Path::new("feeds");
        assert_eq!(xml_path(dir, &store, "google"), PathBuf::from("feeds/FR/google_fr_EUR.xml"));
        assert_eq!(gzip_path(dir, &store, "google"), PathBuf::from("feeds/FR/google_fr_EUR.xml.gz"));
        assert_eq!(published_file_name(&store, "meta"), "FR_meta_fr_EUR.xml.gz");
    }

    #[test]
    fn writes_plain_compressed_and_published_files() {
        let tmp = tempfile::tempdir().unwrap();
        let options = OutputOptions {
            output_dir: tmp.path().join("feeds"),
            publish_dir: Some(tmp.path().join("docs")),
            compress: true,
            keep_xml: true,
        };
        let xml = "<rss>ünïcode</rss>".repeat(100);
        let written = write_feed_files(&options, &store(), "google", xml.as_bytes()).unwrap();
        let plain = fs::read_to_string(written.xml_path.as_ref().unwrap()).unwrap();
        assert_eq!(plain, xml);
        let mut unzipped = String::new();
        GzDecoder::new(fs::File::open(written.gzip_path.as_ref().unwrap()).unwrap())
            .read_to_string(&mut unzipped)
            .unwrap();
        assert_eq!(unzipped, xml);
        assert_eq!(written.published_path, Some(tmp.path().join("docs/FR_google_fr_EUR.xml.gz")));
        assert!(written.compression_ratio().unwrap() < 0.5);
    }

    #[test]
    fn rewrites_replace_the_old_file() {
        let tmp = tempfile::tempdir().unwrap();
        let options = OutputOptions { compress: false, ..OutputOptions::new(tmp.path()) };
        write_feed_files(&options, &store(), "meta", b"old feed with a longer body").unwrap();
        let written = write_feed_files(&options, &store(), "meta", b"new feed").unwrap();
        assert_eq!(fs::read(written.xml_path.unwrap()).unwrap(), b"new feed");
        assert!(written.gzip_path.is_none());
        let leftovers = fs::read_dir(tmp.path().join("FR")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn something_is_always_written() {
        let tmp = tempfile::tempdir().unwrap();
        let options = OutputOptions { compress: false, keep_xml: false, ..OutputOptions::new(tmp.path()) };
        let written = write_feed_files(&options, &store(), "google", b"<rss/>").unwrap();
        assert!(written.xml_path.unwrap().exists());
    }
}
