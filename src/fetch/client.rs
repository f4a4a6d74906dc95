use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::NewstrendsError;

/// Where GKG artifacts come from. The production impl is HTTP; tests swap
/// in a fixture-backed source.
#[async_trait]
pub trait GkgSource: Send + Sync {
    /// Stream the artifact at `url` into `dest`. Non-2xx statuses and
    /// timeouts are errors; partial files left behind on failure live in
    /// scratch directories the caller discards.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<(), NewstrendsError>;
}

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, NewstrendsError> {
        // GDELT's mirrors occasionally present stale certificates.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GkgSource for HttpSource {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<(), NewstrendsError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}
