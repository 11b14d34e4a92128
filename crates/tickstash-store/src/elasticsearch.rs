//! Elasticsearch sink: one `POST` per document.
//!
//! # Addressing
//!
//! | Mode | Request |
//! |------|---------|
//! | default | `POST {base}/{destination}/_doc` |
//! | `mapping_types` | `POST {base}/{destination}/{kind}` |
//!
//! Destinations are created on first write by the store's auto-create
//! behaviour. No index templates are managed here.

use reqwest::Client;
use tickstash_core::config::StoreConfig;
use tickstash_types::Document;
use tracing::{debug, info};

use crate::error::StoreError;

/// Path segment used for documents when mapping types are disabled.
const DOC_ENDPOINT: &str = "_doc";

/// Basic-auth credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BasicAuth {
    username: String,
    password: Option<String>,
}

/// HTTP client bound to one Elasticsearch endpoint.
#[derive(Debug, Clone)]
pub struct ElasticsearchSink {
    client: Client,
    base_url: String,
    auth: Option<BasicAuth>,
    mapping_types: bool,
}

impl ElasticsearchSink {
    /// Build a sink from store settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.endpoint().trim_end_matches('/').to_owned(),
            auth: config.username.clone().map(|username| BasicAuth {
                username,
                password: config.password.clone(),
            }),
            mapping_types: config.mapping_types,
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL a document is posted to.
    pub fn document_url(&self, doc: &Document) -> String {
        let endpoint = if self.mapping_types {
            doc.kind.as_str()
        } else {
            DOC_ENDPOINT
        };
        format!("{}/{}/{endpoint}", self.base_url, doc.destination)
    }

    /// Check that the endpoint answers and log its version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the request fails and
    /// [`StoreError::Rejected`] on a non-success status.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let response = self.authorize(self.client.get(&self.base_url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                destination: String::new(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let info: serde_json::Value = response.json().await?;
        info!(
            url = %self.base_url,
            version = info
                .pointer("/version/number")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown"),
            "Document store reachable"
        );
        Ok(())
    }

    /// Write one document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the request fails and
    /// [`StoreError::Rejected`] if the store refuses the document.
    pub async fn index(&self, doc: &Document) -> Result<(), StoreError> {
        let url = self.document_url(doc);
        let response = self
            .authorize(self.client.post(&url))
            .json(&doc.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                destination: doc.destination.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        debug!(destination = doc.destination, kind = %doc.kind, "Document indexed");
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(auth) => request.basic_auth(&auth.username, auth.password.as_ref()),
            None => request,
        }
    }
}
