use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::api::error::ClientError;

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// Plain HTTP side of the simulation service.
pub struct ApiClient {
    pub http: HttpClient,
}

impl ApiClient {
    pub fn new() -> Result<Self, ClientError> {
        let http = HttpClient::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self { http })
    }

    /// Maps the socket endpoint onto the service's HTTP base (`ws` to `http`, `wss` to `https`).
    pub fn http_base(endpoint: &Url) -> Result<Url, ClientError> {
        let scheme = match endpoint.scheme() {
            "wss" | "https" => "https",
            _ => "http",
        };
        let host = endpoint.host_str().ok_or(url::ParseError::EmptyHost)?;
        let base = match endpoint.port() {
            Some(port) => format!("{scheme}://{host}:{port}/"),
            None => format!("{scheme}://{host}/"),
        };
        Ok(Url::parse(&base)?)
    }

    /// `GET /healthy`. Returns the reported status string.
    pub async fn health(&self, endpoint: &Url) -> Result<String, ClientError> {
        let url = Self::http_base(endpoint)?.join("healthy")?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status().as_u16()));
        }
        let body: HealthBody = resp.json().await?;
        Ok(body.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn http_base_follows_socket_scheme() {
        let plain = ApiClient::http_base(&Url::parse("ws://103.253.20.13:25050").unwrap()).unwrap();
        assert_eq!(plain.as_str(), "http://103.253.20.13:25050/");
        let secure = ApiClient::http_base(&Url::parse("wss://sim.example.org/socket").unwrap()).unwrap();
        assert_eq!(secure.as_str(), "https://sim.example.org/");
    }

    async fn one_shot_http(response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}", listener.local_addr().unwrap())).unwrap();
        tokio::spawn(async move {
            let (mut tcp, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = tcp.read(&mut buf).await;
            tcp.write_all(response.as_bytes()).await.unwrap();
            tcp.shutdown().await.unwrap();
        });
        url
    }

    #[tokio::test]
    async fn health_reads_status_field() {
        let endpoint = one_shot_http(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 15\r\nconnection: close\r\n\r\n{\"status\":\"ok\"}",
        )
        .await;
        let status = ApiClient::new().unwrap().health(&endpoint).await.unwrap();
        assert_eq!(status, "ok");
    }

    #[tokio::test]
    async fn health_reports_http_failures() {
        let endpoint = one_shot_http(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let err = ApiClient::new().unwrap().health(&endpoint).await.unwrap_err();
        assert!(matches!(err, ClientError::Status(503)));
    }
}
