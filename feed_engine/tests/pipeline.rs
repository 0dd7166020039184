mod support;

use std::fs;

use feed_engine::{
    config::{OutputOptions, StoreEntry},
    xml::read_feed_items,
    ConfigError,
    FeedError,
    FeedPipeline,
};
use support::{bisgaard_products, channel_mappings, init_logging, store, MemorySource, RecordingUploader};

fn stores() -> Vec<StoreEntry> {
    vec![
        Ok(store("FR", "fr", "EUR")),
        Err(ConfigError::Store { store: "DK".into(), message: "shop_domain is missing".into() }),
        Ok(store("DE", "de", "EUR")),
        Ok(store("NO", "nb", "NOK")),
    ]
}

#[tokio::test]
async fn one_failing_store_does_not_stop_the_others() {
    init_logging();
    let tmp = tempfile::tempdir().unwrap();
    let source = MemorySource::default().with_store("FR", bisgaard_products()).with_store("NO", bisgaard_products());
    let pipeline = FeedPipeline::new(source, channel_mappings(), OutputOptions::new(tmp.path()));
    let reports = pipeline.run(stores(), &[]).await.unwrap();
    assert_eq!(reports.iter().map(|r| r.store.as_str()).collect::<Vec<&str>>(), ["FR", "DK", "DE", "NO"]);

    let fr = &reports[0];
    assert!(fr.is_success());
    assert_eq!((fr.products, fr.variants), (2, 3));
    assert_eq!(fr.channels.len(), 2);
    assert!(fr.channels.iter().all(|c| c.upload.is_none()));
    for name in ["google_fr_EUR.xml", "google_fr_EUR.xml.gz", "meta_fr_EUR.xml", "meta_fr_EUR.xml.gz"] {
        assert!(tmp.path().join("FR").join(name).is_file(), "{name} is missing");
    }
    let xml = fs::read_to_string(tmp.path().join("NO/meta_nb_NOK.xml")).unwrap();
    let items = read_feed_items(&xml).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].get("price"), Some("69.95 NOK"));

    assert!(matches!(reports[1].error, Some(FeedError::Config(_))));
    assert!(matches!(&reports[2].error, Some(FeedError::Fetch { store, .. }) if store == "DE"));
    assert!(!tmp.path().join("DE").exists());
}

#[tokio::test]
async fn failed_fetch_keeps_existing_feeds() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("DE")).unwrap();
    fs::write(tmp.path().join("DE/google_de_EUR.xml"), "yesterday's feed").unwrap();
    let pipeline = FeedPipeline::new(MemorySource::default(), channel_mappings(), OutputOptions::new(tmp.path()));
    let reports = pipeline.run(vec![Ok(store("DE", "de", "EUR"))], &["google".to_string()]).await.unwrap();
    assert!(!reports[0].is_success());
    assert_eq!(fs::read_to_string(tmp.path().join("DE/google_de_EUR.xml")).unwrap(), "yesterday's feed");
}

#[tokio::test]
async fn unknown_channels_fail_before_fetching() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = FeedPipeline::new(MemorySource::default(), channel_mappings(), OutputOptions::new(tmp.path()));
    let err = pipeline.run(stores(), &["tiktok".to_string()]).await.unwrap_err();
    assert_eq!(err, ConfigError::UnknownChannel("tiktok".into()));
}

#[tokio::test]
async fn uploads_and_publishing() {
    let tmp = tempfile::tempdir().unwrap();
    let options = OutputOptions { publish_dir: Some(tmp.path().join("docs")), ..OutputOptions::new(tmp.path().join("feeds")) };
    let uploader = RecordingUploader { failing: vec!["FR_meta_fr_EUR.xml.gz".to_string()], ..Default::default() };
    let source = MemorySource::default().with_store("FR", bisgaard_products());
    let pipeline = FeedPipeline::new(source, channel_mappings(), options).with_uploader(uploader);
    let reports = pipeline.run(vec![Ok(store("FR", "fr", "EUR"))], &[]).await.unwrap();
    let fr = &reports[0];
    assert!(fr.is_success());
    let google = &fr.channels[0];
    assert_eq!(
        google.upload.as_ref().unwrap().as_ref().unwrap(),
        "https://cdn.shopify.com/s/files/1/0000/FR_google_fr_EUR.xml.gz"
    );
    assert!(fr.channels[1].upload_failed());
    assert!(fr.channels[1].files.gzip_path.as_ref().unwrap().is_file());
    assert!(tmp.path().join("docs/FR_google_fr_EUR.xml.gz").is_file());
    assert!(tmp.path().join("docs/FR_meta_fr_EUR.xml.gz").is_file());

    let uploads = pipeline.uploader().uploads.borrow();
    assert_eq!(uploads.len(), 1);
    let (store, path, name) = &uploads[0];
    assert_eq!(store, "FR");
    assert_eq!(path, &tmp.path().join("feeds/FR/google_fr_EUR.xml.gz"));
    assert_eq!(name, "FR_google_fr_EUR.xml.gz");
}

#[tokio::test]
async fn uncompressed_feeds_are_uploaded_as_xml() {
    let tmp = tempfile::tempdir().unwrap();
    let options = OutputOptions { compress: false, ..OutputOptions::new(tmp.path()) };
    let source = MemorySource::default().with_store("FR", bisgaard_products());
    let pipeline = FeedPipeline::new(source, channel_mappings(), options).with_uploader(RecordingUploader::default());
    let reports = pipeline.run(vec![Ok(store("FR", "fr", "EUR"))], &["google".to_string()]).await.unwrap();
    assert_eq!(
        reports[0].channels[0].upload.as_ref().unwrap().as_ref().unwrap(),
        "https://cdn.shopify.com/s/files/1/0000/FR_google_fr_EUR.xml"
    );
    assert!(!tmp.path().join("FR/google_fr_EUR.xml.gz").exists());

    let uploads = pipeline.uploader().uploads.borrow();
    let recorded = uploads.iter().map(|(s, p, n)| (s.as_str(), p.clone(), n.as_str())).collect::<Vec<_>>();
    assert_eq!(recorded, [("FR", tmp.path().join("FR/google_fr_EUR.xml"), "FR_google_fr_EUR.xml")]);
}

#[tokio::test]
async fn upload_existing_files() {
    let tmp = tempfile::tempdir().unwrap();
    let options = OutputOptions::new(tmp.path());
    let source = MemorySource::default().with_store("FR", bisgaard_products());
    let pipeline = FeedPipeline::new(source, channel_mappings(), options).with_uploader(RecordingUploader::default());
    pipeline.run(vec![Ok(store("FR", "fr", "EUR"))], &["google".to_string()]).await.unwrap();

    let uploader = RecordingUploader::default();
    let pipeline = FeedPipeline::new(MemorySource::default(), channel_mappings(), OutputOptions::new(tmp.path()))
        .with_uploader(uploader);
    let reports = pipeline.upload_existing(vec![Ok(store("FR", "fr", "EUR"))], &[]).await.unwrap();
    let fr = &reports[0];
    assert!(fr.channels[0].upload.as_ref().unwrap().is_ok());
    // Only the google feed was generated.
    assert!(fr.channels[1].upload_failed());
    let uploads = pipeline.uploader().uploads.borrow();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, tmp.path().join("FR/google_fr_EUR.xml.gz"));
    assert_eq!(uploads[0].2, "FR_google_fr_EUR.xml.gz");
}
