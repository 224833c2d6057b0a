use super::util::get_json;
use crate::core::error::FetchError;
use crate::core::quote::AssetMetadata;
use crate::core::source::{MetadataSource, MetadataTable};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// CryptoCompare coin list, used for asset logos.
pub struct CryptoCompareProvider {
    api_base_url: String,
    web_base_url: String,
    client: reqwest::Client,
}

impl CryptoCompareProvider {
    pub fn new(api_base_url: &str, web_base_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            web_base_url: web_base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoinListResponse {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "Data", default)]
    data: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    #[serde(rename = "ImageUrl")]
    image_url: Option<String>,
}

#[async_trait]
impl MetadataSource for CryptoCompareProvider {
    #[instrument(name = "CryptoCompareCoinList", skip(self))]
    async fn fetch_metadata(&self) -> Result<MetadataTable, FetchError> {
        let url = format!("{}/data/all/coinlist", self.api_base_url);
        let data: CoinListResponse = get_json(&self.client, &url).await?;

        if data.response.as_deref() == Some("Error") {
            return Err(FetchError::Permanent(
                data.message
                    .unwrap_or_else(|| "coin list request rejected".to_string()),
            ));
        }

        let table: MetadataTable = data
            .data
            .into_iter()
            .filter_map(|(symbol, entry)| {
                let image_url = format!("{}{}", self.web_base_url, entry.image_url?);
                Some((symbol.clone(), AssetMetadata { symbol, image_url }))
            })
            .collect();

        debug!(assets = table.len(), "Loaded asset metadata");
        Ok(table)
    }
}
