use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// HTTP client for the spreadsheet REST backend.
///
/// Every collection is a tab addressed as `{base}/tabs/{name}`. Rows are
/// listed in sheet order, appended at the end, and deleted by their current
/// zero-based position.
pub struct SheetClient {
    client: Client,
    base_url: String,
}

impl SheetClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.sheet_best_url.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if self.base_url.is_empty() {
            return Err(anyhow!("Sheet backend URL is not configured"));
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Sheet API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Sheet access denied: {}", error_text),
                404 => anyhow!("Sheet resource not found: {}", error_text),
                _ => anyhow!("Sheet API error ({}): {}", status, error_text),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            // Some write endpoints answer with an empty body.
            return Ok(serde_json::from_value(Value::Null)?);
        }

        let data = serde_json::from_slice::<T>(&bytes)?;
        Ok(data)
    }

    /// All rows of a tab, in sheet order.
    ///
    /// A row that does not fit `T` (a cell holding an array, say) is
    /// replaced by `T::default()` and logged. Dropping it would shift the
    /// positions that [`delete_row`](Self::delete_row) addresses.
    pub async fn list_rows<T>(&self, tab: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Default,
    {
        let rows: Value = self.request(Method::GET, &tab_path(tab), None).await?;

        let Value::Array(items) = rows else {
            return Err(anyhow!(
                "Expected a row array from tab {}, got {}",
                tab,
                json_kind(&rows)
            ));
        };

        let rows = items
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                serde_json::from_value(row).unwrap_or_else(|e| {
                    warn!("Malformed row {} in tab {}, reading it as empty: {}", index, tab, e);
                    T::default()
                })
            })
            .collect();

        Ok(rows)
    }

    /// Append one row to the end of a tab.
    pub async fn append_row(&self, tab: &str, row: Value) -> Result<()> {
        let _: Value = self.request(Method::POST, &tab_path(tab), Some(row)).await?;
        Ok(())
    }

    /// Delete the row currently at `index` (zero-based).
    pub async fn delete_row(&self, tab: &str, index: usize) -> Result<()> {
        let path = format!("{}/{}", tab_path(tab), index);
        let _: Value = self.request(Method::DELETE, &path, None).await?;
        Ok(())
    }
}

fn tab_path(tab: &str) -> String {
    format!("/tabs/{}", tab)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
