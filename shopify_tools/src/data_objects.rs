use serde::{Deserialize, Serialize};

use crate::ShopifyProduct;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductsPage {
    #[serde(default)]
    pub products: Vec<ShopifyProduct>,
}

/// A signed upload target handed out by `stagedUploadsCreate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTarget {
    pub url: String,
    pub resource_url: Option<String>,
    #[serde(default)]
    pub parameters: Vec<StagedUploadParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagedUploadParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericFile {
    pub id: Option<String>,
    pub url: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StagedUploadsCreate {
    pub staged_uploads_create: StagedUploadsPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StagedUploadsPayload {
    #[serde(default)]
    pub staged_targets: Vec<StagedTarget>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileCreate {
    pub file_create: FileCreatePayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileCreatePayload {
    // Non-generic file types come back as empty objects because of the `... on GenericFile` fragment.
    #[serde(default)]
    pub files: Vec<Option<GenericFile>>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FileNode {
    pub node: Option<GenericFile>,
}

pub(crate) fn user_error_list(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{}: {}", field.join("."), e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn staged_upload_response() {
        let json = r#"{
          "stagedUploadsCreate": {
            "stagedTargets": [{
              "url": "https://shopify-staged-uploads.storage.googleapis.com/",
              "resourceUrl": "https://shopify-staged-uploads.storage.googleapis.com/tmp/123/FR_google_fr_EUR.xml.gz",
              "parameters": [{"name": "key", "value": "tmp/123/FR_google_fr_EUR.xml.gz"}, {"name": "policy", "value": "abc"}]
            }],
            "userErrors": []
          }
        }"#;
        let result: StagedUploadsCreate = serde_json::from_str(json).unwrap();
        let target = &result.staged_uploads_create.staged_targets[0];
        assert_eq!(target.parameters.len(), 2);
        assert_eq!(target.parameters[0].name, "key");
        assert!(target.resource_url.as_deref().unwrap().ends_with(".xml.gz"));
    }

    #[test]
    fn file_create_with_user_errors() {
        let json = r#"{"fileCreate": {"files": [], "userErrors": [{"field": ["files", "0", "originalSource"], "message": "is invalid"}]}}"#;
        let result: FileCreate = serde_json::from_str(json).unwrap();
        assert_eq!(user_error_list(&result.file_create.user_errors), "files.0.originalSource: is invalid");
    }
}
