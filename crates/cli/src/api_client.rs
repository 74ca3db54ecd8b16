use anyhow::{Context, Result};
use larder_core::{CONTENT_DIGEST_HEADER, ContentDigest, SIGNATURE_HEADER};
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid server URL")?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("failed to build API URL")
    }

    async fn checked(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let body = self.checked(req).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a raw update body with its base64 signature.
    pub async fn publish(&self, body: Vec<u8>, signature: &str) -> Result<PublishResponse> {
        let url = self.url("/v1/databases")?;
        let req = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body);
        self.send_json(req).await
    }

    pub async fn get_info(&self, schema_version: i32) -> Result<DatabaseInfo> {
        let url = self.url(&format!("/v1/databases/{schema_version}"))?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn list(&self) -> Result<Vec<DatabaseInfo>> {
        let url = self.url("/v1/databases")?;
        let response: ListDatabasesResponse = self.send_json(self.http.get(url)).await?;
        Ok(response.databases)
    }

    /// Download the content for `schema_version` and check it against the
    /// digest header sent by the server.
    pub async fn fetch(&self, schema_version: i32) -> Result<FetchedContent> {
        let url = self.url(&format!("/v1/databases/{schema_version}/content"))?;
        let response = self.checked(self.http.get(url)).await?;

        let expected = response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .ok_or_else(|| anyhow::anyhow!("server did not send {CONTENT_DIGEST_HEADER}"))?
            .to_str()
            .context("digest header is not ASCII")?;
        let expected = ContentDigest::from_hex(expected)
            .with_context(|| format!("invalid digest header: {expected}"))?;

        let content = response.bytes().await?.to_vec();
        let actual = ContentDigest::compute(&content);
        if actual != expected {
            anyhow::bail!("content digest mismatch: expected {expected}, got {actual}");
        }

        Ok(FetchedContent {
            content,
            digest: actual,
        })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("/v1/health")?;
        self.send_json(self.http.get(url)).await
    }
}

#[derive(Debug, Deserialize)]
pub struct PublishResponse {
    pub version: String,
    pub created: Vec<i32>,
    pub replaced: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseInfo {
    pub schema_version: i32,
    pub version: String,
    #[serde(default)]
    pub content_size: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDatabasesResponse {
    pub databases: Vec<DatabaseInfo>,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug)]
pub struct FetchedContent {
    pub content: Vec<u8>,
    pub digest: ContentDigest,
}
