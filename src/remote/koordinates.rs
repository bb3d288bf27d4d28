//! Blocking client for the Koordinates v1.x REST API

use super::{CatalogItem, CatalogKind, DataService, Draft, DraftState, Layer, LayerKind};
use crate::defaults::REQUEST_TIMEOUT;
use crate::error::{Error, Result};
use crate::publish::PublishRequest;
use log::debug;
use regex::Regex;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).expect("valid link regex"));

/// A `DataService` backed by a Koordinates deployment
pub struct KoordinatesClient {
    http: Client,
    base: Url,
    api_key: String,
}

impl KoordinatesClient {
    /// Connect to `domain` (e.g. `data.linz.govt.nz`).
    ///
    /// A domain given with a scheme (`http://localhost:8080`) is used as is;
    /// otherwise HTTPS is assumed.
    pub fn new(domain: &str, api_key: impl Into<String>) -> Result<Self> {
        let domain = domain.trim().trim_end_matches('/');
        let root = if domain.contains("://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        };
        let base = Url::parse(&format!("{}/services/api/v1.x/", root))
            .map_err(|e| Error::config(format!("Invalid domain '{}': {}", domain, e)))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("lds-metadata-updater/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::remote("create HTTP client", e.to_string()))?;

        Ok(Self {
            http,
            base,
            api_key: api_key.into(),
        })
    }

    /// Root URL of the API, ending in `/services/api/v1.x/`
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::remote(path.to_string(), e.to_string()))
    }

    /// Send a request with credentials attached. Non-success statuses become
    /// `RemoteServer` errors carrying the status code.
    fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header(AUTHORIZATION, format!("key {}", self.api_key))
            .send()
            .map_err(|e| Error::remote(operation, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(Error::RemoteServer {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            message: error_message(status, &body),
        })
    }

    fn get_json(&self, operation: &str, url: Url) -> Result<(Value, HeaderMap)> {
        debug!("GET {}", url);
        let response = self.send(operation, self.http.get(url))?;
        let headers = response.headers().clone();
        let value = response
            .json::<Value>()
            .map_err(|e| Error::remote(operation, e.to_string()))?;
        Ok((value, headers))
    }

    fn draft_from_response(&self, layer: &Layer, operation: &str, value: Value) -> Result<Draft> {
        draft_from_json(layer, &value, &self.base)
            .ok_or_else(|| Error::remote(operation, "response did not describe a layer version"))
    }
}

impl DataService for KoordinatesClient {
    fn fetch_layer(&self, id: u64) -> Result<Layer> {
        let operation = format!("fetch layer {}", id);
        let (value, _) = self.get_json(&operation, self.endpoint(&format!("layers/{}/", id))?)?;
        serde_json::from_value(value).map_err(|e| Error::remote(operation, e.to_string()))
    }

    fn list_catalog(&self) -> Result<Vec<CatalogItem>> {
        let mut items = Vec::new();
        let mut next = Some(self.endpoint("data/?page_size=100")?);

        while let Some(url) = next.take() {
            let (value, headers) = self.get_json("list catalog", url)?;
            items.extend(catalog_items(&value));
            next = next_link(&headers).and_then(|link| self.base.join(&link).ok());
        }

        Ok(items)
    }

    fn get_draft(&self, layer: &Layer) -> Result<Draft> {
        let operation = format!("get draft of layer {}", layer.id);
        let url = self.endpoint(&format!("layers/{}/versions/draft/", layer.id))?;
        let (value, _) = self.get_json(&operation, url)?;
        self.draft_from_response(layer, &operation, value)
    }

    fn create_draft(&self, layer: &Layer) -> Result<Draft> {
        let operation = format!("create draft of layer {}", layer.id);
        let url = self.endpoint(&format!("layers/{}/versions/", layer.id))?;
        debug!("POST {}", url);
        let response = self.send(&operation, self.http.post(url))?;
        let value = response
            .json::<Value>()
            .map_err(|e| Error::remote(operation.clone(), e.to_string()))?;
        self.draft_from_response(layer, &operation, value)
    }

    fn delete_draft(&self, layer: &Layer, version_id: u64) -> Result<()> {
        let operation = format!("delete draft {} of layer {}", version_id, layer.id);
        let url = self.endpoint(&format!("layers/{}/versions/{}/", layer.id, version_id))?;
        debug!("DELETE {}", url);
        self.send(&operation, self.http.delete(url))?;
        Ok(())
    }

    fn set_draft_metadata(&self, draft: &Draft, xml: &[u8], version_id: u64) -> Result<()> {
        let operation = format!("metadata update for {}", draft.layer_id);
        let url = self.endpoint(&format!(
            "layers/{}/versions/{}/metadata/",
            draft.layer_id, version_id
        ))?;
        let part = Part::bytes(xml.to_vec())
            .file_name("metadata.iso.xml")
            .mime_str("text/xml")
            .map_err(|e| Error::remote(operation.clone(), e.to_string()))?;
        debug!("POST {}", url);
        self.send(
            &operation,
            self.http.post(url).multipart(Form::new().part("metadata", part)),
        )?;
        Ok(())
    }

    fn create_publish(&self, request: &PublishRequest) -> Result<()> {
        let url = self.endpoint("publish/")?;
        debug!("POST {} ({} item(s))", url, request.items.len());
        self.send("publish", self.http.post(url).json(request))?;
        Ok(())
    }

    fn get_metadata_xml(&self, layer: &Layer) -> Result<Option<Vec<u8>>> {
        let Some(iso) = layer.iso_metadata_url() else {
            return Ok(None);
        };
        let operation = format!("download metadata of layer {}", layer.id);
        let url = self
            .base
            .join(iso)
            .map_err(|e| Error::remote(operation.clone(), e.to_string()))?;

        debug!("GET {}", url);
        match self.send(&operation, self.http.get(url)) {
            Ok(response) => {
                let bytes = response
                    .bytes()
                    .map_err(|e| Error::remote(operation, e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            Err(Error::RemoteServer {
                status: Some(404), ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Short message for a failed response, preferring the API's `detail` field
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string));
    match detail {
        Some(detail) => format!("{}: {}", status, detail),
        None => status.to_string(),
    }
}

/// URL of the next page from a `Link` header, if any
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| NEXT_LINK.captures(value).map(|c| c[1].to_string()))
}

/// Catalog entries from one page of the `data/` listing
pub(crate) fn catalog_items(page: &Value) -> Vec<CatalogItem> {
    page.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id")?.as_u64()?;
                    let kind = item.get("type").and_then(Value::as_str).unwrap_or("unknown");
                    Some(CatalogItem {
                        id,
                        kind: CatalogKind::from_type(kind),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Publish status of a version document.
///
/// `active_publish` may sit at the top level or inside `version`. When
/// absent the state is unknown; `null` or `false` means clean.
pub(crate) fn draft_state(value: &Value) -> DraftState {
    let flag = value
        .get("active_publish")
        .or_else(|| value.get("version").and_then(|v| v.get("active_publish")));
    match flag {
        None => DraftState::Unknown,
        Some(Value::Null) | Some(Value::Bool(false)) => DraftState::Clean,
        Some(Value::String(s)) if s.is_empty() => DraftState::Clean,
        Some(_) => DraftState::Conflicted,
    }
}

/// Build a [`Draft`] from a layer version document
pub(crate) fn draft_from_json(layer: &Layer, value: &Value, base: &Url) -> Option<Draft> {
    let version = value.get("version")?;
    let version_id = version.get("id")?.as_u64()?;
    let kind = value
        .get("type")
        .and_then(|t| serde_json::from_value::<LayerKind>(t.clone()).ok())
        .unwrap_or(layer.kind);
    let url = version
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            base.join(&format!("layers/{}/versions/{}/", layer.id, version_id))
                .ok()
                .map(String::from)
        })?;

    Some(Draft {
        layer_id: layer.id,
        version_id,
        kind,
        url,
        state: draft_state(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    const BASE: &str = "https://data.example.com/services/api/v1.x/";

    fn base() -> Url {
        Url::parse(BASE).unwrap()
    }

    fn layer() -> Layer {
        Layer::new(42, LayerKind::Layer, "Roads", BASE, 7)
    }

    #[test]
    fn test_new_builds_versioned_base() {
        let client = KoordinatesClient::new("data.linz.govt.nz", "secret").unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://data.linz.govt.nz/services/api/v1.x/"
        );

        let client = KoordinatesClient::new("http://localhost:8080/", "secret").unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "http://localhost:8080/services/api/v1.x/"
        );
    }

    #[test]
    fn test_next_link() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_link(&headers), None);

        headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://data.example.com/services/api/v1.x/data/?page=1>; rel="prev", <https://data.example.com/services/api/v1.x/data/?page=3>; rel="next""#,
            ),
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("https://data.example.com/services/api/v1.x/data/?page=3")
        );
    }

    #[test]
    fn test_catalog_items() {
        let page = json!([
            {"id": 1, "type": "layer"},
            {"id": 2, "type": "table"},
            {"id": 3, "type": "set"},
            {"type": "layer"}
        ]);
        let items = catalog_items(&page);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].kind, CatalogKind::Layer);
        assert_eq!(items[1].kind, CatalogKind::Table);
        assert_eq!(items[2].kind, CatalogKind::Other("set".to_string()));
        assert!(catalog_items(&json!({"detail": "nope"})).is_empty());
    }

    #[test]
    fn test_draft_state() {
        assert_eq!(draft_state(&json!({"version": {"id": 8}})), DraftState::Unknown);
        assert_eq!(
            draft_state(&json!({"version": {"id": 8, "active_publish": null}})),
            DraftState::Clean
        );
        assert_eq!(draft_state(&json!({"active_publish": false})), DraftState::Clean);
        assert_eq!(
            draft_state(&json!({"version": {"id": 8, "active_publish": "https://x/publish/3/"}})),
            DraftState::Conflicted
        );
        assert_eq!(draft_state(&json!({"active_publish": true})), DraftState::Conflicted);
    }

    #[test]
    fn test_draft_from_json() {
        let value = json!({
            "id": 42,
            "type": "table",
            "version": {"id": 8, "url": "https://data.example.com/services/api/v1.x/layers/42/versions/8/"}
        });
        let draft = draft_from_json(&layer(), &value, &base()).unwrap();
        assert_eq!(draft.version_id, 8);
        assert_eq!(draft.kind, LayerKind::Table);
        assert_eq!(draft.state, DraftState::Unknown);
        assert!(draft.url.ends_with("/layers/42/versions/8/"));
    }

    #[test]
    fn test_draft_from_json_fills_missing_url() {
        let value = json!({"version": {"id": 9, "active_publish": null}});
        let draft = draft_from_json(&layer(), &value, &base()).unwrap();
        assert_eq!(draft.kind, LayerKind::Layer);
        assert_eq!(draft.url, format!("{}layers/42/versions/9/", BASE));
        assert_eq!(draft.state, DraftState::Clean);

        assert!(draft_from_json(&layer(), &json!({"id": 42}), &base()).is_none());
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let message = error_message(StatusCode::BAD_REQUEST, r#"{"detail": "Layer is locked"}"#);
        assert!(message.contains("400"));
        assert!(message.contains("Layer is locked"));
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "<html>"), "502 Bad Gateway");
    }
}
