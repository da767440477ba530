//! HTTP adapter for the query API.
//!
//! Blocking reqwest client (no async runtime required). Endpoints are
//! container-relative: `{base}/{container}/query-selectRows.api` and friends.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::api::QueryApi;
use crate::credentials::{load_credentials, ServerCredentials};
use crate::error::QueryError;
use crate::types::{SchemaQuery, SelectRowsRequest, SelectRowsResponse};

/// Response format that returns `{value, displayValue, formattedValue}` per field.
const API_VERSION: &str = "17.1";

/// Query API client over HTTP (blocking).
#[derive(Clone)]
pub struct HttpQueryApi {
    http: reqwest::blocking::Client,
    base_url: String,
    container_path: String,
    api_key: Option<String>,
}

impl HttpQueryApi {
    /// Create a client from settings plus saved credentials, if any.
    pub fn from_settings(settings: &labgrid_config::Settings) -> Result<Self, QueryError> {
        let base_url = settings
            .server_base_url
            .clone()
            .ok_or(QueryError::NotConfigured)?;
        let api_key = load_credentials()
            .filter(|c| c.base_url == base_url)
            .and_then(|c| c.api_key);
        Self::new(ServerCredentials {
            base_url,
            container_path: settings.server_container_path.clone(),
            api_key,
        })
    }

    pub fn new(creds: ServerCredentials) -> Result<Self, QueryError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("labgrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| QueryError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            container_path: creds.container_path,
            api_key: creds.api_key,
        })
    }

    /// Full URL for a `query-<action>.api` endpoint in the configured container.
    pub fn action_url(&self, action: &str) -> String {
        let container = self.container_path.trim_matches('/');
        if container.is_empty() {
            format!("{}/query-{}.api", self.base_url, action)
        } else {
            format!("{}/{}/query-{}.api", self.base_url, container, action)
        }
    }

    /// Query-string parameters for a select-rows call.
    pub fn select_params(req: &SelectRowsRequest) -> Result<Vec<(String, String)>, QueryError> {
        let target = req
            .schema_query
            .as_ref()
            .ok_or_else(|| QueryError::Validation("select rows requires a schema/query".into()))?;

        let mut params = vec![
            ("schemaName".to_string(), target.schema_name.clone()),
            ("query.queryName".to_string(), target.query_name.clone()),
            ("apiVersion".to_string(), API_VERSION.to_string()),
        ];
        if let Some(view) = &target.view_name {
            params.push(("query.viewName".into(), view.clone()));
        }
        if !req.columns.is_empty() {
            params.push(("query.columns".into(), req.columns.join(",")));
        }
        if let Some(sort) = &req.sort {
            params.push(("query.sort".into(), sort.clone()));
        }
        if let Some(max_rows) = req.max_rows {
            params.push(("query.maxRows".into(), max_rows.to_string()));
        }
        params.extend(req.filters.iter().map(|f| f.url_param()));
        Ok(params)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn authorize(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => req.basic_auth("apikey", Some(key)),
            None => req,
        }
    }

    fn send(&self, req: reqwest::blocking::RequestBuilder) -> Result<Value, QueryError> {
        let response = self
            .authorize(req)
            .send()
            .map_err(|e| QueryError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|j| j["exception"].as_str().map(String::from))
                .unwrap_or(body);
            if status == 400 || status == 422 {
                return Err(QueryError::Validation(message));
            }
            return Err(QueryError::Http(status, message));
        }

        response.json().map_err(|e| QueryError::Parse(e.to_string()))
    }

    fn save_rows(
        &self,
        action: &str,
        target: &SchemaQuery,
        rows: &[Map<String, Value>],
    ) -> Result<(), QueryError> {
        if rows.is_empty() {
            return Ok(());
        }
        let body = serde_json::json!({
            "schemaName": target.schema_name,
            "queryName": target.query_name,
            "rows": rows,
        });
        log::debug!("{} {} row(s) into {}", action, rows.len(), target);
        self.send(self.http.post(self.action_url(action)).json(&body))?;
        Ok(())
    }
}

impl QueryApi for HttpQueryApi {
    fn select_rows(&self, req: &SelectRowsRequest) -> Result<SelectRowsResponse, QueryError> {
        let params = Self::select_params(req)?;
        let json = self.send(self.http.get(self.action_url("selectRows")).query(&params))?;
        SelectRowsResponse::from_json(&json)
    }

    fn insert_rows(
        &self,
        target: &SchemaQuery,
        rows: &[Map<String, Value>],
    ) -> Result<(), QueryError> {
        self.save_rows("insertRows", target, rows)
    }

    fn update_rows(
        &self,
        target: &SchemaQuery,
        rows: &[Map<String, Value>],
    ) -> Result<(), QueryError> {
        self.save_rows("updateRows", target, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Filter, FilterOp};

    fn client(container: &str) -> HttpQueryApi {
        HttpQueryApi::new(ServerCredentials {
            base_url: "https://lims.example.org/".into(),
            container_path: container.into(),
            api_key: None,
        })
        .unwrap()
    }

    #[test]
    fn test_action_url() {
        assert_eq!(
            client("/Project/Assays/").action_url("selectRows"),
            "https://lims.example.org/Project/Assays/query-selectRows.api"
        );
        assert_eq!(
            client("/").action_url("insertRows"),
            "https://lims.example.org/query-insertRows.api"
        );
    }

    #[test]
    fn test_select_params() {
        let mut req =
            SelectRowsRequest::new(SchemaQuery::new("samples", "Blood").with_view("grid"));
        req.columns = vec!["RowId".into(), "Name".into()];
        req.sort = Some("-Created".into());
        req.max_rows = Some(20);
        req.filters.push(Filter::new("Name", FilterOp::StartsWith, "B"));

        let params = HttpQueryApi::select_params(&req).unwrap();
        let get = |k: &str| params.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("schemaName"), Some("samples"));
        assert_eq!(get("query.queryName"), Some("Blood"));
        assert_eq!(get("query.viewName"), Some("grid"));
        assert_eq!(get("query.columns"), Some("RowId,Name"));
        assert_eq!(get("query.sort"), Some("-Created"));
        assert_eq!(get("query.maxRows"), Some("20"));
        assert_eq!(get("query.Name~startswith"), Some("B"));
        assert_eq!(get("apiVersion"), Some(API_VERSION));
    }

    #[test]
    fn test_select_params_requires_target() {
        let err = HttpQueryApi::select_params(&SelectRowsRequest::default()).unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
    }
}
