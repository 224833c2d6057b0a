use crate::core::error::FetchError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Builds the HTTP client shared by all providers. `timeout` bounds every request;
/// expiry surfaces as a transient [`FetchError`].
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("coinwatch/0.1")
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// GETs `url` and decodes the JSON body into `T`.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, FetchError> {
    debug!("Requesting {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status, url));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!(
            error = ?e,
            response = %text,
            "Failed to parse response"
        );
        FetchError::from(e)
    })
}

/// Accepts both `"1.5"` and `1.5`; the ranking API sends numbers as strings.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Number(n)) => Some(n),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
