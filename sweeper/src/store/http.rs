use super::RecordStore;
use crate::prelude::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Record store backed by a REST collection (`/devices`, `/status`).
#[derive(Debug, Clone)]
pub struct HttpStore {
    client:      Client,
    devices_url: String,
    status_url:  String,
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_matches('/'))
}

impl HttpStore {
    pub fn new(config: &StoreConfiguration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            devices_url: join(&config.base_url, &config.devices_path),
            status_url: join(&config.base_url, &config.status_path),
        })
    }

    fn device_url(&self, id: &str) -> String {
        format!("{}/{}", self.devices_url, id)
    }

    async fn execute(
        &self,
        method: &'static str,
        url: String,
        request: RequestBuilder,
    ) -> StoreResult<reqwest::Response> {
        trace!("{} {}", method, url);
        let response = match request.send().await {
            Ok(r) => r,
            Err(source) => return Err(StoreError::Transport { method, url, source }),
        };
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                method,
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: &'static str,
        url: String,
        request: RequestBuilder,
    ) -> StoreResult<T> {
        self.execute(method, url, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn list(&self) -> StoreResult<Vec<Record>> {
        let url = self.devices_url.clone();
        self.fetch("GET", url.clone(), self.client.get(&url)).await
    }

    async fn get(&self, id: &str) -> StoreResult<Record> {
        let url = self.device_url(id);
        self.fetch("GET", url.clone(), self.client.get(&url)).await
    }

    async fn create(&self, payload: &Value) -> StoreResult<Record> {
        let url = self.devices_url.clone();
        self.fetch("POST", url.clone(), self.client.post(&url).json(payload))
            .await
    }

    async fn update(&self, id: &str, payload: &Value) -> StoreResult<Record> {
        let url = self.device_url(id);
        self.fetch("PUT", url.clone(), self.client.put(&url).json(payload))
            .await
    }

    async fn delete(&self, id: &str) -> StoreResult<Record> {
        let url = self.device_url(id);
        self.fetch("DELETE", url.clone(), self.client.delete(&url))
            .await
    }

    async fn append_status(&self, event: &StatusEvent) -> StoreResult<()> {
        let url = self.status_url.clone();
        self.execute("POST", url.clone(), self.client.post(&url).json(event))
            .await?;
        Ok(())
    }
}
