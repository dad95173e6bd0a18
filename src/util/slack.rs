use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

/// Channel the exported artifacts get pushed to. Built once at startup and
/// passed through `AppState`; tests substitute a fake.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn upload_file(&self, path: &Path, title: &str, comment: Option<&str>) -> Result<()>;
}

/// Slack file upload over the Web API. Holds only the shared reqwest client
/// and static credentials, so one instance is safe across concurrent requests.
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    channel: String,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

impl SlackClient {
    pub fn new(api_base: &str, token: &str, channel: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            channel: channel.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SlackClient {
    async fn upload_file(&self, path: &Path, title: &str, comment: Option<&str>) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());

        let mut form = reqwest::multipart::Form::new()
            .text("channels", self.channel.clone())
            .text("title", title.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );
        if let Some(comment) = comment {
            form = form.text("initial_comment", comment.to_string());
        }

        let resp: SlackResponse = self
            .http
            .post(format!("{}/files.upload", self.api_base))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .context("slack request failed")?
            .json()
            .await
            .context("slack returned non-JSON")?;

        if !resp.ok {
            bail!(
                "slack upload rejected: {}",
                resp.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        info!(channel = %self.channel, title, "uploaded file to slack");
        Ok(())
    }
}
