//! Blocking HTTP transport backed by `reqwest`.

use reqwest::blocking::Client;
use tracing::trace;
use url::Url;

use super::{Response, Transport, TransportError};
use crate::config::SourceConfig;

/// [`Transport`] issuing plain `GET` requests.
///
/// The client enforces a timeout only when one is configured.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport honoring the timeout and user agent of `config`.
    pub fn from_config(config: &SourceConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(config.timeout());
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &Url) -> Result<Response, TransportError> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        trace!(status, bytes = body.len(), "transport.http.response");
        Ok(Response { status, body })
    }
}
