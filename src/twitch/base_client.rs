use crate::core::error::BooperError;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound for a single Helix call, so a hung request cannot stall a run.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error body Helix returns with non-2xx responses
#[derive(serde::Deserialize)]
struct HelixErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    client_id: String,
    token: String,
}

impl HttpClient {
    pub fn new(
        base_url: String,
        client_id: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, BooperError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client
            .request(method, url)
            .header("Client-Id", &self.client_id)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BooperError> {
        tracing::debug!(path, ?query, "GET");
        let response = self
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, BooperError> {
        tracing::debug!(path, ?query, "POST");
        let response = self
            .request(reqwest::Method::POST, path)
            .query(query)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BooperError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<HelixErrorBody>(&body) {
                Ok(parsed) if !parsed.message.is_empty() => parsed.message,
                Ok(parsed) if !parsed.error.is_empty() => parsed.error,
                _ => body,
            };
            return Err(BooperError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
