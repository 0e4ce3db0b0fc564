//! Minimal HTTP client for the Galaxy API.
//!
//! `smolhttp` is a blocking client, so every request runs inside
//! `smol::unblock` and is bounded by the HTTP timeout.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value as JsonValue;

use crate::engine::envelope::Value;
use crate::engine::registry::EngineTimeouts;
use crate::engine::types::{ConnectionDescriptor, DescriptorParams};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

#[derive(Clone)]
pub(crate) struct GalaxyClient {
    base_url: String,
    auth_header: String,
    pub(crate) catalog: Option<String>,
    timeouts: EngineTimeouts,
}

impl GalaxyClient {
    /// Build a client from a descriptor's Galaxy parameters.
    pub fn from_descriptor(
        descriptor: &ConnectionDescriptor,
        timeouts: EngineTimeouts,
    ) -> GatewayResult<Self> {
        match &descriptor.params {
            DescriptorParams::Galaxy { domain, client_id, api_key, catalog } => {
                let base_url = normalize_domain(domain);
                let credentials = format!("{}:{}", client_id, api_key);
                let auth_header = format!("Basic {}", BASE64.encode(credentials));
                Ok(Self { base_url, auth_header, catalog: catalog.clone(), timeouts })
            }
            DescriptorParams::Server { .. } => Err(GatewayError::InvalidDescriptor(
                "Galaxy engines require domain credentials".to_string(),
            )),
        }
    }

    /// GET a path relative to the account domain and parse the JSON body.
    pub async fn get_json(&self, path: &str) -> GatewayResult<JsonValue> {
        let url = format!("{}{}", self.base_url, path);
        let auth_header = self.auth_header.clone();

        let request = smol::unblock(move || {
            let response = smolhttp::Client::new(&url)
                .map_err(|e| GatewayError::Connectivity(format!("http client: {}", e)))?
                .get()
                .headers(vec![("Authorization".to_string(), auth_header)])
                .send()
                .map_err(|e| GatewayError::Connectivity(format!("http request: {}", e)))?;
            Ok::<String, GatewayError>(response.text())
        });

        let body = with_timeout(self.timeouts.http, request).await?;
        parse_json(&body)
    }

    /// POST a body to a path relative to the account domain and parse the
    /// JSON response.
    pub async fn post_json(
        &self,
        path: &str,
        body: String,
        content_type: &str,
    ) -> GatewayResult<JsonValue> {
        let url = format!("{}{}", self.base_url, path);
        let auth_header = self.auth_header.clone();
        let content_type = content_type.to_string();

        let request = smol::unblock(move || {
            let response = smolhttp::Client::new(&url)
                .map_err(|e| GatewayError::Connectivity(format!("http client: {}", e)))?
                .post()
                .headers(vec![
                    ("Authorization".to_string(), auth_header),
                    ("Content-Type".to_string(), content_type),
                ])
                .body(body.into_bytes())
                .send()
                .map_err(|e| GatewayError::Connectivity(format!("http request: {}", e)))?;
            Ok::<String, GatewayError>(response.text())
        });

        let body = with_timeout(self.timeouts.http, request).await?;
        parse_json(&body)
    }
}

fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn parse_json(body: &str) -> GatewayResult<JsonValue> {
    serde_json::from_str(body)
        .map_err(|_| GatewayError::Connectivity(format!("unexpected response: {}", body.trim())))
}

/// Convert a JSON scalar from a statement response into a unified `Value`.
/// Nested arrays and objects are carried as JSON.
pub(crate) fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else {
                Value::Float64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Json(json.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::EngineType;
    use serde_json::json;

    #[test]
    fn domain_gets_https_scheme_by_default() {
        assert_eq!(
            normalize_domain("acme.galaxy.starburst.io"),
            "https://acme.galaxy.starburst.io"
        );
        assert_eq!(normalize_domain("http://localhost:8080/"), "http://localhost:8080");
    }

    #[test]
    fn server_params_are_rejected() {
        let descriptor = ConnectionDescriptor::server(
            EngineType::PostgreSQL,
            "localhost".to_string(),
            5432,
            "user".to_string(),
            "pw".to_string(),
            "db".to_string(),
        );
        let err = GalaxyClient::from_descriptor(&descriptor, EngineTimeouts::default())
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("domain credentials"));
    }

    #[test]
    fn json_scalars_map_to_values() {
        assert_eq!(json_to_value(&json!(null)), Value::Null);
        assert_eq!(json_to_value(&json!(true)), Value::Bool(true));
        assert_eq!(json_to_value(&json!(42)), Value::Int64(42));
        assert_eq!(json_to_value(&json!(1.5)), Value::Float64(1.5));
        assert_eq!(json_to_value(&json!("hi")), Value::Text("hi".to_string()));
        assert_eq!(json_to_value(&json!([1, 2])), Value::Json(json!([1, 2])));
    }
}
