//! HTTP-backed collaborators.
//!
//! Each source is a JSON `GET` endpoint, typically served by the desktop
//! app's main process. Payloads may be wrapped (`{"tokens": [...]}`,
//! `{"accounts": [...]}`) or bare arrays.

use crate::config::SourceEndpoints;
use crate::context::gather::ContextGatherer;
use crate::context::sources::{
    AccountSource, ConnectedAccount, EnvironmentSource, ExecutorConnection, ExecutorStatusSource,
    IntegrationSource, TokenSource,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenPayload {
    Wrapped { tokens: Vec<String> },
    Bare(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AccountPayload {
    Wrapped { accounts: Vec<ConnectedAccount> },
    Bare(Vec<ConnectedAccount>),
}

#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", self.url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("{} returned an unexpected payload", self.url))
    }
}

#[async_trait]
impl TokenSource for HttpSource {
    async fn available_tokens(&self) -> anyhow::Result<Vec<String>> {
        Ok(match self.get_json::<TokenPayload>().await? {
            TokenPayload::Wrapped { tokens } | TokenPayload::Bare(tokens) => tokens,
        })
    }
}

#[async_trait]
impl EnvironmentSource for HttpSource {
    async fn environment(&self) -> anyhow::Result<Option<Value>> {
        let value: Value = self.get_json().await?;
        Ok((!value.is_null()).then_some(value))
    }
}

#[async_trait]
impl ExecutorStatusSource for HttpSource {
    async fn executor_status(&self) -> anyhow::Result<ExecutorConnection> {
        self.get_json().await
    }
}

pub struct HttpAccountSource {
    source: IntegrationSource,
    inner: HttpSource,
}

impl HttpAccountSource {
    pub fn new(source: IntegrationSource, inner: HttpSource) -> Self {
        Self { source, inner }
    }
}

#[async_trait]
impl AccountSource for HttpAccountSource {
    fn source(&self) -> IntegrationSource {
        self.source
    }

    async fn connected_accounts(&self) -> anyhow::Result<Vec<ConnectedAccount>> {
        Ok(match self.inner.get_json::<AccountPayload>().await? {
            AccountPayload::Wrapped { accounts } | AccountPayload::Bare(accounts) => accounts,
        })
    }
}

/// Wire every configured endpoint into a gatherer.
pub fn gatherer_from_endpoints(
    endpoints: &SourceEndpoints,
    fetch_timeout: Duration,
) -> anyhow::Result<ContextGatherer> {
    let client = reqwest::Client::builder()
        .timeout(fetch_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let mut gatherer = ContextGatherer::new();
    let mut configured = 0usize;

    if let Some(url) = &endpoints.tokens_url {
        gatherer = gatherer.with_tokens(Arc::new(HttpSource::new(client.clone(), url)));
        configured += 1;
    }
    if let Some(url) = &endpoints.environment_url {
        gatherer = gatherer.with_environment(Arc::new(HttpSource::new(client.clone(), url)));
        configured += 1;
    }
    if let Some(url) = &endpoints.executor_status_url {
        gatherer = gatherer.with_executor(Arc::new(HttpSource::new(client.clone(), url)));
        configured += 1;
    }
    for (source, url) in [
        (IntegrationSource::Pipedream, &endpoints.pipedream_accounts_url),
        (IntegrationSource::Composio, &endpoints.composio_accounts_url),
    ] {
        if let Some(url) = url {
            gatherer = gatherer.with_account_source(Arc::new(HttpAccountSource::new(
                source,
                HttpSource::new(client.clone(), url),
            )));
            configured += 1;
        }
    }

    tracing::info!(configured, "Context collaborators configured");
    Ok(gatherer)
}
