//! History retrieval from the STH-Comet service.
//!
//! [`HistorySource`] is the seam the aggregator depends on. [`SthClient`] is
//! the production implementation: one GET per attribute, no retries, bounded
//! by the configured timeout. Failures surface as [`FetchError`] from
//! `try_fetch`; `fetch` turns them into an empty list after logging.

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::SthConfig;
use crate::error::FetchError;
use crate::models::RawRecord;

// ---

/// Anything that can produce raw history records for a named attribute.
#[allow(async_fn_in_trait)]
pub trait HistorySource {
    // ---
    /// Fetch up to `limit` most-recent records for `attribute`.
    async fn try_fetch(&self, attribute: &str, limit: u32) -> Result<Vec<RawRecord>, FetchError>;

    /// Fail-soft fetch: any error is logged with the attribute name and
    /// becomes an empty list, so one unavailable attribute never stops the rest.
    async fn fetch(&self, attribute: &str, limit: u32) -> Vec<RawRecord> {
        // ---
        match self.try_fetch(attribute, limit).await {
            Ok(records) => {
                debug!("Fetched {} raw records for {}", records.len(), attribute);
                records
            }
            Err(e) => {
                error!("Failed to fetch history for {}: {}", attribute, e);
                Vec::new()
            }
        }
    }
}

/// HTTP client for the STH-Comet `lastN` history endpoint.
#[derive(Debug, Clone)]
pub struct SthClient {
    client: Client,
    sth: SthConfig,
}

impl SthClient {
    // ---
    pub fn new(sth: SthConfig) -> anyhow::Result<Self> {
        // ---
        let client = Client::builder()
            .timeout(sth.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, sth })
    }

    /// `{scheme}://{host}:{port}/STH/v1/contextEntities/type/{type}/id/{id}/attributes/{attr}?lastN={limit}`
    pub fn history_url(&self, attribute: &str, limit: u32) -> Result<Url, FetchError> {
        // ---
        let base = format!("{}://{}:{}", self.sth.scheme, self.sth.host, self.sth.port);
        let mut url = Url::parse(&base).map_err(|e| FetchError::Url(format!("{base}: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::Url(format!("{base}: cannot carry a path")))?
            .clear()
            .extend([
                "STH",
                "v1",
                "contextEntities",
                "type",
                self.sth.entity_type.as_str(),
                "id",
                self.sth.entity_id.as_str(),
                "attributes",
                attribute,
            ]);
        url.query_pairs_mut()
            .append_pair("lastN", &limit.to_string());

        Ok(url)
    }
}

impl HistorySource for SthClient {
    // ---
    async fn try_fetch(&self, attribute: &str, limit: u32) -> Result<Vec<RawRecord>, FetchError> {
        // ---
        let url = self.history_url(attribute, limit)?;
        debug!("Fetching {} history from: {}", attribute, url);

        let response = self
            .client
            .get(url)
            .header("fiware-service", &self.sth.service)
            .header("fiware-servicepath", &self.sth.service_path)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        parse_envelope(&body)
    }
}

/// Expected STH response: `contextResponses[0].contextElement.attributes[0].values`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    context_responses: Vec<ContextResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextResponse {
    context_element: ContextElement,
}

#[derive(Debug, Deserialize)]
struct ContextElement {
    attributes: Vec<AttributeHistory>,
}

#[derive(Debug, Deserialize)]
struct AttributeHistory {
    /// Entries stay untyped here; each one is checked on its own during
    /// normalization.
    values: Vec<Value>,
}

/// Extract the raw value list from an STH response body.
///
/// Any structural mismatch, including empty response or attribute lists or a
/// `values` that is missing or not an array, is a [`FetchError::Shape`].
/// Individual entries are not validated here.
pub fn parse_envelope(body: &str) -> Result<Vec<RawRecord>, FetchError> {
    // ---
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| FetchError::Shape(e.to_string()))?;

    let response = envelope
        .context_responses
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Shape("empty contextResponses".to_string()))?;

    let attribute = response
        .context_element
        .attributes
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Shape("empty attributes".to_string()))?;

    Ok(attribute.values.iter().map(RawRecord::from_value).collect())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::time::Duration;

    fn sth() -> SthConfig {
        // ---
        SthConfig {
            scheme: "http".to_string(),
            host: "10.0.0.5".to_string(),
            port: 8666,
            entity_id: "urn:ngsi-ld:Env:001".to_string(),
            entity_type: "Environment".to_string(),
            service: "smart".to_string(),
            service_path: "/".to_string(),
            timeout: Duration::from_secs(20),
        }
    }

    #[test]
    fn test_history_url() {
        // ---
        let client = SthClient::new(sth()).unwrap();
        let url = client.history_url("noiseLevel", 100).unwrap();

        assert_eq!(
            url.as_str(),
            "http://10.0.0.5:8666/STH/v1/contextEntities/type/Environment/id/urn:ngsi-ld:Env:001/attributes/noiseLevel?lastN=100"
        );
    }

    #[test]
    fn test_history_url_encodes_segments() {
        // ---
        let client = SthClient::new(sth()).unwrap();
        let url = client.history_url("a b/c", 5).unwrap();

        assert!(url.path().ends_with("/attributes/a%20b%2Fc"), "{}", url);
    }

    #[test]
    fn test_parse_envelope() {
        // ---
        let body = r#"{
            "contextResponses": [{
                "contextElement": {
                    "attributes": [{
                        "name": "temperature",
                        "values": [
                            {"_id": "x", "recvTime": "2024-01-01T10:00:00.000Z", "attrType": "Number", "attrValue": "21.5"},
                            {"_id": "y", "recvTime": "2024-01-01T10:05:00Z", "attrType": "Number", "attrValue": 22}
                        ]
                    }],
                    "id": "urn:ngsi-ld:Env:001",
                    "isPattern": false,
                    "type": "Environment"
                },
                "statusCode": {"code": "200", "reasonPhrase": "OK"}
            }]
        }"#;
        let records = parse_envelope(body).unwrap();

        assert_eq!(
            records,
            vec![
                RawRecord::new("2024-01-01T10:00:00.000Z", "21.5"),
                RawRecord {
                    recv_time: Some(Value::from("2024-01-01T10:05:00Z")),
                    attr_value: Some(Value::from(22)),
                },
            ]
        );
    }

    #[test]
    fn test_parse_envelope_shape_errors() {
        // ---
        let cases = [
            "not json",
            "{}",
            r#"{"contextResponses": []}"#,
            r#"{"contextResponses": [{"contextElement": {"attributes": []}}]}"#,
            r#"{"contextResponses": [{"contextElement": {"attributes": [{"name": "t"}]}}]}"#,
            r#"{"contextResponses": [{"contextElement": {"attributes": [{"values": {"recvTime": "x"}}]}}]}"#,
        ];
        for body in cases {
            assert!(
                matches!(parse_envelope(body), Err(FetchError::Shape(_))),
                "expected shape error for {}",
                body
            );
        }
    }

    #[test]
    fn test_parse_envelope_keeps_malformed_entries_for_normalization() {
        // ---
        let body = r#"{"contextResponses": [{"contextElement": {"attributes": [{"values": [
            {"recvTime": "2024-01-01T10:00:00.000Z", "attrValue": "21.0"},
            {"recvTime": "2024-01-01T11:00:00.000Z", "attrValue": null},
            {"attrValue": false},
            {"recvTime": "2024-01-01T12:00:00.000Z", "attrValue": "23.0"}
        ]}]}}]}"#;
        let records = parse_envelope(body).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[1].attr_value, None);
        assert_eq!(records[2].recv_time, None);
    }

    #[test]
    fn test_parse_envelope_empty_values_is_ok() {
        // ---
        let body = r#"{"contextResponses": [{"contextElement": {"attributes": [{"values": []}]}}]}"#;
        assert!(parse_envelope(body).unwrap().is_empty());
    }
}
