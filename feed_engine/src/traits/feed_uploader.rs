use std::path::Path;

use shopify_tools::ShopifyApiError;

use crate::feed_types::Store;

/// Publishes a feed file somewhere ad platforms can fetch it from.
#[allow(async_fn_in_trait)]
pub trait FeedUploader {
    /// Uploads the file at `local_path` under the name `file_name`, using the credentials of `store`, and returns
    /// the public url of the uploaded copy. The local file is only read.
    async fn upload(&self, store: &Store, local_path: &Path, file_name: &str) -> Result<String, ShopifyApiError>;

    /// False for uploaders that do nothing; the pipeline then skips the upload step entirely.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// The uploader of a pipeline that only writes local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUpload;

impl FeedUploader for NoUpload {
    async fn upload(&self, _store: &Store, _local_path: &Path, file_name: &str) -> Result<String, ShopifyApiError> {
        Err(ShopifyApiError::UploadError(format!("Uploads are disabled. {file_name} was not uploaded")))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
