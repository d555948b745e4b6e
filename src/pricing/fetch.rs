use async_trait::async_trait;
use reqwest::Client;

use super::extract::extract_median_for_server;

pub const FFXIAH_ITEM_URL: &str = "https://www.ffxiah.com/item/";
const USER_AGENT: &str = "VanaCargo/1.0";

/// Where median prices come from. The worker pools only see this trait, so
/// tests can swap the website out for canned responses.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Comma-formatted median for one item on one server.
    async fn fetch_median(&self, item_id: u32, server: &str) -> Result<String, String>;
}

/// The real source: fetches the FFXIAH item page and scrapes the median out
/// of its embedded per-server stats.
pub struct FfxiahSource {
    client: Client,
}

impl FfxiahSource {
    pub fn new() -> Result<FfxiahSource, String> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to build the http client \n{}", e))?;
        Ok(FfxiahSource { client })
    }
}

#[async_trait]
impl PriceSource for FfxiahSource {
    async fn fetch_median(&self, item_id: u32, server: &str) -> Result<String, String> {
        let url = format!("{}{}/", FFXIAH_ITEM_URL, item_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Request to {} failed \n{}", url, e))?;
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read the body of {} \n{}", url, e))?;
        extract_median_for_server(&body, server).ok_or_else(|| {
            format!("No median for {} found on the page of item {}", server, item_id)
        })
    }
}
