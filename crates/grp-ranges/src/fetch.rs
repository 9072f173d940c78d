//! HTTP client for the published Okta IP range document.

use grp_types::{RangeFetchError, RangeSource};
use serde_json::Value;

pub const DEFAULT_RANGES_URL: &str = "https://s3.amazonaws.com/okta-ip-ranges/ip_ranges.json";

/// Flatten `{ "<cell>": { "ip_ranges": [..] }, .. }` into one list, in document order.
/// Cells without `ip_ranges`, non-object cells and non-string items are skipped.
pub fn flatten_ranges(doc: &Value) -> Vec<String> {
    let Some(cells) = doc.as_object() else {
        return Vec::new();
    };
    cells
        .values()
        .filter_map(|cell| cell.get("ip_ranges").and_then(|r| r.as_array()))
        .flatten()
        .filter_map(|r| r.as_str().map(String::from))
        .collect()
}

/// RangeSource that downloads the range document on every call.
pub struct HttpRangeSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRangeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl RangeSource for HttpRangeSource {
    async fn fetch_ranges(&self) -> Result<Vec<String>, RangeFetchError> {
        let res = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RangeFetchError::Http(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| RangeFetchError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(RangeFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let doc: Value =
            serde_json::from_str(&body).map_err(|e| RangeFetchError::Parse(e.to_string()))?;
        let ranges = flatten_ranges(&doc);
        tracing::debug!(url = %self.url, count = ranges.len(), "fetched okta ip ranges");
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_doc() -> Value {
        json!({
            "us_cell_1": { "ip_ranges": ["3.209.158.224/28", "146.112.162.0/24"] },
            "legacy": { "note": "no ranges here" },
            "eu_cell_1": { "ip_ranges": ["52.58.54.0/23", 42, "2600:1f18::/36"] },
            "broken": "not an object"
        })
    }

    #[test]
    fn flatten_keeps_document_order_and_skips_missing() {
        let ranges = flatten_ranges(&sample_doc());
        assert_eq!(
            ranges,
            vec![
                "3.209.158.224/28",
                "146.112.162.0/24",
                "52.58.54.0/23",
                "2600:1f18::/36"
            ]
        );
    }

    #[test]
    fn flatten_is_repeatable() {
        let doc = sample_doc();
        assert_eq!(flatten_ranges(&doc), flatten_ranges(&doc));
    }

    #[test]
    fn flatten_non_object_document_is_empty() {
        assert!(flatten_ranges(&json!(["1.2.3.0/24"])).is_empty());
    }

    #[tokio::test]
    async fn fetch_ranges_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip_ranges.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_doc()))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpRangeSource::new(format!("{}/ip_ranges.json", server.uri()));
        let ranges = source.fetch_ranges().await.unwrap();
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[1], "146.112.162.0/24");
    }

    #[tokio::test]
    async fn fetch_ranges_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let source = HttpRangeSource::new(format!("{}/ip_ranges.json", server.uri()));
        match source.fetch_ranges().await {
            Err(RangeFetchError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_ranges_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let source = HttpRangeSource::new(server.uri());
        assert!(matches!(
            source.fetch_ranges().await,
            Err(RangeFetchError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn fetch_ranges_unreachable() {
        let source = HttpRangeSource::new("http://127.0.0.1:1/ip_ranges.json");
        assert!(matches!(
            source.fetch_ranges().await,
            Err(RangeFetchError::Http(_))
        ));
    }
}
