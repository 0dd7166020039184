use std::{path::Path, sync::Arc, time::Duration};

use graphql_parser::parse_query;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, LINK, RETRY_AFTER},
    multipart::{Form, Part},
    Client,
    Method,
    RequestBuilder,
    Response,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::ShopifyConfig,
    data_objects::{user_error_list, FileCreate, FileNode, GenericFile, ProductsPage, StagedTarget, StagedUploadsCreate},
    helpers::next_page_url,
    ShopifyApiError,
    ShopifyProduct,
};

const STAGED_UPLOADS_CREATE: &str = r#"
mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets { url resourceUrl parameters { name value } }
    userErrors { field message }
  }
}"#;

const FILE_CREATE: &str = r#"
mutation fileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files { ... on GenericFile { id url alt } }
    userErrors { field message }
  }
}"#;

const FILE_NODE: &str = r#"
query getFile($id: ID!) {
  node(id: $id) { ... on GenericFile { id url } }
}"#;

/// How long Shopify usually needs before a freshly created file has a CDN url.
const FILE_PROCESSING_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct ShopifyApi {
    config: ShopifyConfig,
    client: Arc<Client>,
    /// Staged uploads go to a third-party bucket, so they must not carry the admin token.
    upload_client: Arc<Client>,
}

impl ShopifyApi {
    pub fn new(config: ShopifyConfig) -> Result<Self, ShopifyApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.admin_access_token.reveal().as_str())
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        headers.insert("X-Shopify-Access-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        let upload_client = Client::builder().build().map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), upload_client: Arc::new(upload_client) })
    }

    pub fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    /// Sends the request produced by `build`, retrying throttled and transient failures according to the configured
    /// retry policy. Non-2xx responses are turned into errors.
    async fn send<F>(&self, label: &str, build: F) -> Result<Response, ShopifyApiError>
    where F: Fn() -> Result<RequestBuilder, ShopifyApiError> {
        self.config
            .retry
            .run(label, || {
                let request = build();
                async move {
                    let response = request?.send().await.map_err(ShopifyApiError::from_transport)?;
                    check_status(response).await
                }
            })
            .await
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, ShopifyApiError> {
        let url = self.url(path);
        let body = body
            .map(|b| serde_json::to_value(b))
            .transpose()
            .map_err(|e| ShopifyApiError::RestRequestError(e.to_string()))?;
        trace!("Sending REST query: {url}");
        let response = self
            .send(path, || {
                let mut req = self.client.request(method.clone(), &url);
                if !params.is_empty() {
                    req = req.query(params);
                }
                if let Some(body) = &body {
                    req = req.json(body);
                }
                Ok(req)
            })
            .await?;
        trace!("REST query successful. {}", response.status());
        response.json::<T>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))
    }

    pub async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T, ShopifyApiError> {
        let query = parse_query::<String>(query).map_err(|e| ShopifyApiError::InvalidGraphQL(e.to_string()))?;
        let mut body = serde_json::json!({
            "query": query.to_string(),
        });
        if let Some(vars) = variables {
            body["variables"] = vars;
        }
        trace!("Sending GraphQL query: {body}");
        let result = self.rest_query::<Value, Value>(Method::POST, "/graphql.json", &[], Some(body)).await?;
        if let Some(errors) = result["errors"].as_array() {
            let e = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join(", ");
            return Err(ShopifyApiError::GraphQLError(e));
        }
        let data = result["data"].clone();
        trace!("GraphQL response: {data}");
        if data.is_null() {
            return Err(ShopifyApiError::EmptyResponse);
        }
        let result = serde_json::from_value(data).map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        Ok(result)
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/admin/api/{}{path}", self.config.shop, self.config.api_version)
    }

    /// The first page of active products. Later pages are addressed by the `Link` header of the previous response.
    pub fn products_url(&self) -> String {
        format!("{}?limit={}&status=active", self.url("/products.json"), self.config.page_size)
    }

    /// Fetches one page of products, returning it together with the url of the next page, if there is one.
    pub async fn fetch_products_page(
        &self,
        url: &str,
    ) -> Result<(Vec<ShopifyProduct>, Option<String>), ShopifyApiError> {
        trace!("Fetching products page: {url}");
        let response = self.send("Product page request", || Ok(self.client.get(url))).await?;
        let next = response.headers().get(LINK).and_then(|v| v.to_str().ok()).and_then(next_page_url);
        let page = response.json::<ProductsPage>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        Ok((page.products, next))
    }

    /// Walks every page of active products, in the order Shopify returns them.
    pub async fn fetch_all_products(&self) -> Result<Vec<ShopifyProduct>, ShopifyApiError> {
        let mut products = vec![];
        let mut next = Some(self.products_url());
        let mut page_count = 0;
        while let Some(url) = next {
            if page_count > 0 && !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
            let (page, next_url) = self.fetch_products_page(&url).await?;
            page_count += 1;
            debug!("Fetched page {page_count} from {} with {} products", self.config.shop, page.len());
            products.extend(page);
            next = next_url;
        }
        info!("Fetched {} products in {page_count} pages from {}", products.len(), self.config.shop);
        Ok(products)
    }

    /// Uploads a local file to Shopify Files and returns its public CDN url.
    ///
    /// Shopify needs three steps for this: a staged upload target is requested, the file is posted to that target,
    /// and finally a file record is created from the staged resource. The local file is only read.
    pub async fn upload_file(&self, local_path: &Path, filename: &str) -> Result<String, ShopifyApiError> {
        let bytes = std::fs::read(local_path)?;
        let mime_type = mime_type_for(filename);
        info!("📤️ Uploading {filename} ({:.1}kB)", bytes.len() as f64 / 1024.0);
        let target = self.create_staged_upload(filename, bytes.len(), mime_type).await?;
        self.upload_to_staged_url(&target, &bytes, filename, mime_type).await?;
        let file = self.create_file_record(&target, filename).await?;
        let mut url = file.url;
        if url.is_none() {
            if let Some(id) = &file.id {
                debug!("CDN url for {id} is not available yet. Waiting for Shopify to process the file");
                tokio::time::sleep(FILE_PROCESSING_DELAY).await;
                url = self.fetch_file_url(id).await?;
            }
        }
        let url = match url {
            Some(url) => url,
            None => {
                warn!("📤️ CDN url for {filename} is not available yet. Using the staged resource url instead");
                target
                    .resource_url
                    .clone()
                    .ok_or_else(|| ShopifyApiError::UploadError(format!("No url available for {filename}")))?
            },
        };
        info!("📤️ Uploaded {filename} to {url}");
        if !self.config.upload_delay.is_zero() {
            tokio::time::sleep(self.config.upload_delay).await;
        }
        Ok(url)
    }

    async fn create_staged_upload(
        &self,
        filename: &str,
        file_size: usize,
        mime_type: &str,
    ) -> Result<StagedTarget, ShopifyApiError> {
        let variables = serde_json::json!({
            "input": [{
                "resource": "FILE",
                "filename": filename,
                "mimeType": mime_type,
                "httpMethod": "POST",
                "fileSize": file_size.to_string(),
            }]
        });
        let result = self.graphql_query::<StagedUploadsCreate>(STAGED_UPLOADS_CREATE, Some(variables)).await?;
        let payload = result.staged_uploads_create;
        payload.staged_targets.into_iter().next().ok_or_else(|| {
            ShopifyApiError::UploadError(format!(
                "Could not create a staged upload for {filename}. {}",
                user_error_list(&payload.user_errors)
            ))
        })
    }

    async fn upload_to_staged_url(
        &self,
        target: &StagedTarget,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<(), ShopifyApiError> {
        let response = self
            .send("Staged upload", || {
                // The bucket insists on the signed parameters coming before the file part.
                let form = target.parameters.iter().fold(Form::new(), |form, p| form.text(p.name.clone(), p.value.clone()));
                let part = Part::bytes(bytes.to_vec())
                    .file_name(filename.to_string())
                    .mime_str(mime_type)
                    .map_err(|e| ShopifyApiError::UploadError(e.to_string()))?;
                Ok(self.upload_client.post(&target.url).multipart(form.part("file", part)))
            })
            .await?;
        debug!("Staged upload of {filename} accepted with status {}", response.status());
        Ok(())
    }

    async fn create_file_record(&self, target: &StagedTarget, filename: &str) -> Result<GenericFile, ShopifyApiError> {
        let variables = serde_json::json!({
            "files": [{
                "alt": filename,
                "contentType": "FILE",
                "originalSource": target.resource_url,
            }]
        });
        let result = self.graphql_query::<FileCreate>(FILE_CREATE, Some(variables)).await?;
        let payload = result.file_create;
        if !payload.user_errors.is_empty() {
            return Err(ShopifyApiError::UploadError(format!(
                "Could not create a file record for {filename}. {}",
                user_error_list(&payload.user_errors)
            )));
        }
        payload
            .files
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| ShopifyApiError::UploadError(format!("No file record was returned for {filename}")))
    }

    async fn fetch_file_url(&self, id: &str) -> Result<Option<String>, ShopifyApiError> {
        let variables = serde_json::json!({ "id": id });
        let result = self.graphql_query::<FileNode>(FILE_NODE, Some(variables)).await?;
        Ok(result.node.and_then(|n| n.url))
    }
}

fn mime_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".gz") {
        "application/gzip"
    } else {
        "application/xml"
    }
}

async fn check_status(response: Response) -> Result<Response, ShopifyApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64);
        return Err(ShopifyApiError::RateLimited(retry_after));
    }
    let message = response.text().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
    Err(ShopifyApiError::QueryError { status: status.as_u16(), message })
}
