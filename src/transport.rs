use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),
}

/// Outbound HTTP used by the catalog providers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and returns the raw response body.
    async fn get(&self, url: Url) -> Result<Vec<u8>, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> ReqwestTransport {
        ReqwestTransport::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> ReqwestTransport {
        ReqwestTransport { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn returns_body_on_success() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search.json?q=dune")
            .with_status(200)
            .with_body(r#"{"docs":[]}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/search.json?q=dune", server.url())).unwrap();
        let body = ReqwestTransport::new().get(url).await.unwrap();

        assert_eq!(body, br#"{"docs":[]}"#.to_vec());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/volumes")
            .with_status(403)
            .with_body(r#"{"error":{"code":403}}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/volumes", server.url())).unwrap();
        let err = ReqwestTransport::new().get(url).await.unwrap_err();

        assert!(matches!(err, TransportError::Status(403)));
        assert_eq!(err.to_string(), "server responded with status 403");
    }
}
