//! SwitchBot Open API v1.1 client.

use crate::devices::data::{DeviceRef, DeviceStatus, DeviceType};
use crate::devices::traits::DeviceClient;
use crate::error::DeviceError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

/// Default SwitchBot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.switch-bot.com";

/// Status code the API uses for a successful call.
const API_SUCCESS: i64 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type HmacSha256 = Hmac<Sha256>;

/// Client for the SwitchBot cloud API.
///
/// Holds a single `reqwest::Client`, which pools connections and is safe to
/// share between concurrent cycles.
pub struct SwitchBotClient {
    base_url: Url,
    token: String,
    secret: String,
    client: reqwest::Client,
}

impl SwitchBotClient {
    /// Create a client against the public API endpoint.
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Result<Self, DeviceError> {
        Self::with_base_url(DEFAULT_API_URL, token, secret)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, DeviceError> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| DeviceError::invalid_url(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DeviceError::invalid_url(format!("{} cannot hold a path", base_url)));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            token: token.into(),
            secret: secret.into(),
            client,
        })
    }

    /// Build the authentication headers for one request.
    fn auth_headers(&self) -> Result<HeaderMap, DeviceError> {
        let t = chrono::Utc::now().timestamp_millis().to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        let sign = sign_request(&self.token, &self.secret, &t, &nonce)?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&self.token)?);
        headers.insert("t", header_value(&t)?);
        headers.insert("nonce", header_value(&nonce)?);
        headers.insert("sign", header_value(&sign)?);
        Ok(headers)
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DeviceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DeviceError::invalid_url(format!("{} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, DeviceError> {
        debug!(%url, "Calling SwitchBot API");

        let response: ApiResponse<T> = self
            .client
            .get(url.clone())
            .headers(self.auth_headers()?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status_code != API_SUCCESS {
            return Err(DeviceError::Api {
                code: response.status_code,
                message: response.message,
            });
        }

        response
            .body
            .ok_or_else(|| DeviceError::decode_error(format!("missing body in response to {}", url.path())))
    }
}

#[async_trait::async_trait]
impl DeviceClient for SwitchBotClient {
    async fn list_devices(&self) -> Result<Vec<DeviceRef>, DeviceError> {
        let body: DeviceListBody = self.get(self.endpoint(&["v1.1", "devices"])?).await?;

        Ok(body
            .device_list
            .into_iter()
            .map(|d| DeviceRef {
                id: d.device_id,
                hub_id: d.hub_device_id,
                name: d.device_name,
                device_type: DeviceType(d.device_type),
            })
            .collect())
    }

    async fn device_status(&self, device_id: &str) -> Result<DeviceStatus, DeviceError> {
        self.get(self.endpoint(&["v1.1", "devices", device_id, "status"])?)
            .await
    }
}

/// Compute the request signature: base64(HMAC-SHA256(secret, token + t + nonce)).
pub fn sign_request(token: &str, secret: &str, t: &str, nonce: &str) -> Result<String, DeviceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DeviceError::Signing(e.to_string()))?;
    mac.update(token.as_bytes());
    mac.update(t.as_bytes());
    mac.update(nonce.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn header_value(value: &str) -> Result<HeaderValue, DeviceError> {
    HeaderValue::from_str(value).map_err(|e| DeviceError::Signing(format!("invalid header value: {}", e)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T> {
    status_code: i64,
    #[serde(default)]
    message: String,
    body: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceListBody {
    #[serde(default)]
    device_list: Vec<ApiDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDevice {
    device_id: String,
    #[serde(default)]
    device_name: String,
    #[serde(default)]
    device_type: String,
    #[serde(default)]
    hub_device_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const LIST_BODY: &str = r#"
    {
        "statusCode": 100,
        "message": "success",
        "body": {
            "deviceList": [
                {
                    "deviceId": "A",
                    "deviceName": "Bedroom",
                    "deviceType": "Meter",
                    "enableCloudService": true,
                    "hubDeviceId": "H"
                },
                {
                    "deviceId": "H",
                    "deviceName": "Hub",
                    "deviceType": "Hub Mini",
                    "hubDeviceId": "000000000000"
                }
            ],
            "infraredRemoteList": []
        }
    }"#;

    #[test]
    fn test_signature_is_deterministic() {
        let a = sign_request("token", "secret", "1700000000000", "nonce").unwrap();
        let b = sign_request("token", "secret", "1700000000000", "nonce").unwrap();
        let c = sign_request("token", "secret", "1700000000000", "other").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // 32-byte digest, base64 encoded
        assert_eq!(a.len(), 44);
    }

    #[tokio::test]
    async fn test_list_devices() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1.1/devices")
            .match_header("Authorization", "test_token")
            .match_header("sign", Matcher::Regex(".+".to_string()))
            .match_header("nonce", Matcher::Regex(".+".to_string()))
            .match_header("t", Matcher::Regex("^[0-9]+$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LIST_BODY)
            .create_async()
            .await;

        let client = SwitchBotClient::with_base_url(server.url(), "test_token", "test_secret").unwrap();
        let devices = client.list_devices().await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], DeviceRef::new("A", "H", "Bedroom", "Meter"));
        assert!(devices[1].is_hub_only());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_device_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1.1/devices/A/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "statusCode": 100,
                    "message": "success",
                    "body": {
                        "deviceId": "A",
                        "deviceType": "Meter",
                        "hubDeviceId": "H",
                        "humidity": 55,
                        "temperature": 21.5,
                        "battery": 90
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = SwitchBotClient::with_base_url(server.url(), "t", "s").unwrap();
        let status = client.device_status("A").await.unwrap();

        assert_eq!(
            status,
            DeviceStatus {
                battery: 90,
                humidity: 55,
                temperature: 21.5
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_device_id_is_path_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1.1/devices/A%2FB%20C/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"statusCode": 100, "message": "success", "body": {"battery": 10}}"#)
            .create_async()
            .await;

        let client = SwitchBotClient::with_base_url(format!("{}/", server.url()), "t", "s").unwrap();
        let status = client.device_status("A/B C").await.unwrap();

        assert_eq!(status.battery, 10);
        mock.assert_async().await;
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = SwitchBotClient::with_base_url("not a url", "t", "s");
        assert!(matches!(result, Err(DeviceError::InvalidUrl(_))));

        let result = SwitchBotClient::with_base_url("mailto:ops@example.com", "t", "s");
        assert!(matches!(result, Err(DeviceError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_api_error_status_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1.1/devices/A/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"statusCode": 161, "message": "device offline", "body": {}}"#)
            .create_async()
            .await;

        let client = SwitchBotClient::with_base_url(server.url(), "t", "s").unwrap();
        let err = client.device_status("A").await.unwrap_err();

        match err {
            DeviceError::Api { code, message } => {
                assert_eq!(code, 161);
                assert_eq!(message, "device offline");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1.1/devices")
            .with_status(401)
            .create_async()
            .await;

        let client = SwitchBotClient::with_base_url(server.url(), "t", "s").unwrap();
        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(err, DeviceError::Http(_)));
    }
}
