//! HTTP Collection Client
//!
//! reqwest binding of `CollectionClient` against a JSON REST collection:
//! `GET /collection`, `POST /collection`, `PATCH /collection/{id}`,
//! `DELETE /collection/{id}`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::client::CollectionClient;
use crate::config::ApiConfig;
use crate::error::{SyncError, SyncResult};
use crate::record::{Record, RecordId};

/// REST client for one collection of `R`
#[derive(Debug, Clone)]
pub struct HttpCollectionClient<R> {
    client: Client,
    config: ApiConfig,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpCollectionClient<R> {
    /// Create a new client for the configured collection
    pub fn new(config: ApiConfig) -> SyncResult<Self> {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.timeout());

        let client = builder
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            _record: PhantomData,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

/// Turn a non-2xx response into a status error
fn check_status(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        log::debug!("[HTTP] {} answered {}", response.url(), status);
        Err(SyncError::status(status.as_u16()))
    }
}

#[async_trait(?Send)]
impl<R> CollectionClient<R> for HttpCollectionClient<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    async fn fetch_all(&self) -> SyncResult<Vec<R>> {
        let url = self.config.collection_url();
        log::debug!("[HTTP] GET {}", url);
        let response = self.client.get(&url).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn create(&self, record: &R) -> SyncResult<R> {
        let url = self.config.collection_url();
        log::debug!("[HTTP] POST {}", url);
        let response = self.client.post(&url).json(record).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn update(&self, id: RecordId, record: &R) -> SyncResult<()> {
        let url = self.config.record_url(id);
        log::debug!("[HTTP] PATCH {}", url);
        let response = self.client.patch(&url).json(record).send().await?;
        check_status(response)?;
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> SyncResult<()> {
        let url = self.config.record_url(id);
        log::debug!("[HTTP] DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        check_status(response)?;
        Ok(())
    }
}
