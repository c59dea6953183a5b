//! Async HTTP client for the marketplace KYC endpoints.

use std::time::Duration;

use anyhow::{Context, bail};
use kyc_core::{Decision, KycBackend, RawDocumentRecord, VerificationRow};
use reqwest::{Client, Url};

/// Connection settings for the marketplace API.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request limit. `None` waits for as long as the server takes.
  pub timeout:  Option<Duration>,
}

/// [`KycBackend`] over HTTP.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpBackend {
  client: Client,
  base:   Url,
}

impl HttpBackend {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    let base = Url::parse(&config.base_url)
      .with_context(|| format!("invalid base url {:?}", config.base_url))?;
    if base.cannot_be_a_base() {
      bail!("base url {:?} cannot carry a path", config.base_url);
    }
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build().context("failed to build HTTP client")?;
    Ok(Self { client, base })
  }

  /// `base` with `segments` appended, each percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }
}

impl KycBackend for HttpBackend {
  type Error = reqwest::Error;

  /// `GET /kyc/`
  async fn list_documents(
    &self,
    token: &str,
  ) -> Result<Vec<RawDocumentRecord>, reqwest::Error> {
    let url = self.endpoint(&["kyc", ""]);
    tracing::debug!(%url, "GET kyc listing");
    self
      .client
      .get(url)
      .bearer_auth(token)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await
  }

  /// `PUT /kyc/{user_id}`
  async fn submit_decision(
    &self,
    token: &str,
    user_id: &str,
    decision: &Decision,
  ) -> Result<VerificationRow, reqwest::Error> {
    let url = self.endpoint(&["kyc", user_id]);
    tracing::debug!(%url, approve = decision.approve, "PUT kyc decision");
    self
      .client
      .put(url)
      .bearer_auth(token)
      .json(decision)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await
  }
}
