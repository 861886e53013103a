//! CallAPI: HTTP GET against a JSON API.

use async_trait::async_trait;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::error::ActionError;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub struct CallApiAction {
    client: reqwest::Client,
}

impl CallApiAction {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

/// Flatten a `params`/`headers` mapping into string pairs.
///
/// Strings pass through unquoted; other scalars and nested values use
/// their JSON text. `null` entries are dropped.
pub fn string_pairs(parameter: &str, value: Option<&Value>) -> Result<Vec<(String, String)>, ActionError> {
    let map = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ActionError::InvalidParameter {
                action: "CallAPI".into(),
                parameter: parameter.into(),
                reason: format!("expected a mapping, got {other}"),
            });
        }
    };

    Ok(map
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect())
}

#[async_trait]
impl Action for CallApiAction {
    fn kind(&self) -> ActionKind {
        ActionKind::CallApi
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let url = arguments
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ActionError::MissingParameter {
                action: "CallAPI".into(),
                parameter: "url".into(),
            })?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ActionError::InvalidParameter {
                action: "CallAPI".into(),
                parameter: "url".into(),
                reason: "URL must start with http:// or https://".into(),
            });
        }

        let query = string_pairs("params", arguments.get("params"))?;
        let headers = string_pairs("headers", arguments.get("headers"))?;

        debug!(url = %url, params = query.len(), "Calling API");

        let mut request = self.client.get(url).query(&query);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ActionError::failed("CallAPI", format!("API call failed: {e}")))?;

        let response = response.error_for_status().map_err(|e| {
            warn!(url = %url, error = %e, "API returned error status");
            ActionError::failed("CallAPI", format!("API call failed: {e}"))
        })?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ActionError::failed("CallAPI", format!("Response is not JSON: {e}")))?;

        let pretty = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
        Ok(ActionOutcome::content(url, pretty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use serde_json::json;

    fn action() -> CallApiAction {
        CallApiAction::new(Duration::from_secs(5))
    }

    #[test]
    fn pairs_stringify_scalars() {
        let value = json!({"search_query": "cat:cs.AI", "max_results": 5, "skip": null});
        let mut pairs = string_pairs("params", Some(&value)).unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("max_results".to_string(), "5".to_string()),
                ("search_query".to_string(), "cat:cs.AI".to_string()),
            ]
        );
    }

    #[test]
    fn pairs_reject_non_mappings() {
        let err = string_pairs("params", Some(&json!([1, 2]))).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { .. }));
        assert!(string_pairs("params", None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_returns_json_body_and_sends_query() {
        let (url, request) = serve_once(200, "application/json", r#"{"ok":true}"#).await;

        let mut args = Arguments::new();
        args.insert("url".into(), json!(format!("{url}/api/query")));
        args.insert("params".into(), json!({"q": "cs.AI"}));
        let outcome = action().execute(&args).await.unwrap();

        match outcome {
            ActionOutcome::Content { body, .. } => assert!(body.contains("\"ok\": true")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/query?q=cs.AI "));
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let (url, _request) = serve_once(404, "application/json", r#"{"error":"nope"}"#).await;

        let mut args = Arguments::new();
        args.insert("url".into(), json!(url));
        let err = action().execute(&args).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_failure() {
        let (url, _request) = serve_once(200, "text/html", "<html></html>").await;

        let mut args = Arguments::new();
        args.insert("url".into(), json!(url));
        let err = action().execute(&args).await.unwrap_err();
        assert!(err.to_string().contains("not JSON"));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let mut args = Arguments::new();
        args.insert("url".into(), json!("file:///etc/passwd"));
        let err = action().execute(&args).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { .. }));
    }
}
