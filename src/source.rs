//! Remote source a query chain is bound to.

use std::sync::Arc;

use url::Url;

use crate::config::{ConfigError, SourceConfig};
use crate::decode::{Decode, JsonArray};
use crate::error::Result;
use crate::query::{RecordShape, Table};
use crate::transport::Transport;

/// Base endpoint plus the transport and decoder used to reach it.
///
/// Cloning is cheap; the transport and decoder are shared.
#[derive(Clone, Debug)]
pub struct Source {
    endpoint: Url,
    query_param: String,
    transport: Arc<dyn Transport>,
    decoder: Arc<dyn Decode>,
}

impl Source {
    /// Creates a source that sends `?query=<text>` to `endpoint` and decodes
    /// JSON arrays.
    pub fn new(endpoint: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            query_param: crate::config::DEFAULT_QUERY_PARAM.to_owned(),
            transport,
            decoder: Arc::new(JsonArray),
        }
    }

    /// Creates a source from `config` using the supplied transport.
    pub fn with_config(config: &SourceConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: config.endpoint_url()?,
            query_param: config.query_param.clone(),
            transport,
            decoder: config.format.decoder(),
        })
    }

    /// Creates a source from `config` backed by an HTTP transport.
    #[cfg(feature = "http")]
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let transport = crate::transport::HttpTransport::from_config(config)
            .map_err(|source| ConfigError::Transport { source })?;
        Self::with_config(config, Arc::new(transport))
    }

    /// Replaces the payload decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn Decode>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replaces the name of the query parameter.
    pub fn with_query_param(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyQueryParam.into());
        }
        self.query_param = name;
        Ok(self)
    }

    /// Base endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request target embedding `query_text` as the query parameter.
    pub fn request_url(&self, query_text: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(&self.query_param, query_text);
        url
    }

    /// Starts a query chain against the table `name`.
    pub fn table<M: RecordShape>(&self, name: impl Into<String>) -> Result<Table<M>> {
        Table::new(self, name)
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn decoder(&self) -> &dyn Decode {
        self.decoder.as_ref()
    }
}
