use std::future::Future;

use percorsi_shared::{RoutePayload, RouteQuery, RouteResult};

use crate::{config::ClientConfig, error::TransportError};

/// Longest backend error body carried into a notice.
const MAX_ERROR_BODY: usize = 200;

/// Something able to answer a route query.
///
/// Every call is a single attempt: implementations must not retry.
pub trait RoutingBackend {
    fn compute(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<RouteResult, TransportError>>;
}

/// HTTP client for `POST /percorsi`.
#[derive(Debug, Clone)]
pub struct RouteRequestClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RouteRequestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            endpoint: config.route_endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn request(&self, query: &RouteQuery) -> Result<RouteResult, TransportError> {
        let payload = RoutePayload::from(query);
        tracing::debug!(
            "sending route request start={} end={} filters={:?}",
            query.start,
            query.end,
            query.filters
        );

        let response = self.http.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            tracing::warn!("routing backend answered {status}");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let result: RouteResult = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            "route response sole={} ombra={}",
            result.sole.as_ref().map_or(0, |fc| fc.features.len()),
            result.ombra.as_ref().map_or(0, |fc| fc.features.len())
        );
        Ok(result)
    }
}

impl RoutingBackend for RouteRequestClient {
    async fn compute(&self, query: &RouteQuery) -> Result<RouteResult, TransportError> {
        self.request(query).await
    }
}
