//! Search: Google Custom Search JSON API.
//!
//! Credentials come from the call's `api_key`/`cse_id` parameters, then the
//! `[actions.search]` config. `GOOGLE_API_KEY`/`GOOGLE_CSE_ID` reach this
//! module through the config's env overrides.

use async_trait::async_trait;
use sentinel_config::SearchConfig;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::error::ActionError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const NO_RESULTS: &str = "No good Google Search Result was found";

pub struct SearchAction {
    client: reqwest::Client,
    config: SearchConfig,
}

impl SearchAction {
    pub fn new(config: SearchConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    fn credential(
        &self,
        arguments: &Arguments,
        parameter: &str,
        configured: &Option<String>,
        env_var: &str,
    ) -> Result<String, ActionError> {
        arguments
            .get(parameter)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| configured.clone())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ActionError::failed(
                "Search",
                format!("no {parameter} given and {env_var} is not set"),
            ))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn format_results(items: &[SearchItem]) -> String {
    if items.is_empty() {
        return NO_RESULTS.to_string();
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                item.title.trim(),
                item.link,
                item.snippet.replace('\n', " ").trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Action for SearchAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Search
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ActionError::MissingParameter {
                action: "Search".into(),
                parameter: "query".into(),
            })?;

        let api_key = self.credential(arguments, "api_key", &self.config.api_key, "GOOGLE_API_KEY")?;
        let cse_id = self.credential(arguments, "cse_id", &self.config.cse_id, "GOOGLE_CSE_ID")?;
        let num = self.config.max_results.clamp(1, 10).to_string();

        debug!(query = %query, "Running Google search");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ActionError::failed("Search", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ActionError::failed(
                "Search",
                format!("Google API error ({status}): {text}"),
            ));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ActionError::failed("Search", format!("failed to parse response: {e}")))?;

        Ok(ActionOutcome::content(
            format!("search: {query}"),
            format_results(&parsed.items),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use serde_json::json;

    fn config(endpoint: &str) -> SearchConfig {
        SearchConfig {
            api_key: Some("cfg-key".into()),
            cse_id: Some("cfg-cse".into()),
            endpoint: endpoint.into(),
            max_results: 3,
        }
    }

    #[test]
    fn parse_google_response() {
        let raw = r#"{
            "kind": "customsearch#search",
            "items": [
                {"title": "arXiv cs.AI", "link": "https://arxiv.org/list/cs.AI/recent", "snippet": "Artificial\nIntelligence"},
                {"title": "Vercel Cron", "link": "https://vercel.com/docs/cron-jobs", "snippet": "Schedule jobs"}
            ]
        }"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        let text = format_results(&resp.items);
        assert!(text.starts_with("1. arXiv cs.AI\n   https://arxiv.org/list/cs.AI/recent"));
        assert!(text.contains("Artificial Intelligence"));
        assert!(text.contains("2. Vercel Cron"));
    }

    #[test]
    fn response_without_items_reports_no_results() {
        let resp: SearchResponse = serde_json::from_str(r#"{"kind":"customsearch#search"}"#).unwrap();
        assert_eq!(format_results(&resp.items), NO_RESULTS);
    }

    #[tokio::test]
    async fn parameters_override_config_credentials() {
        let body = r#"{"items":[{"title":"T","link":"https://t.example","snippet":"s"}]}"#;
        let (url, request) = serve_once(200, "application/json", body).await;
        let action = SearchAction::new(config(&url), Duration::from_secs(5));

        let mut args = Arguments::new();
        args.insert("query".into(), json!("vercel cron"));
        args.insert("api_key".into(), json!("param-key"));
        let outcome = action.execute(&args).await.unwrap();

        assert!(matches!(outcome, ActionOutcome::Content { ref body, .. } if body.contains("https://t.example")));
        let raw = request.await.unwrap();
        assert!(raw.contains("key=param-key"));
        assert!(raw.contains("cx=cfg-cse"));
        assert!(raw.contains("num=3"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let action = SearchAction::new(
            SearchConfig {
                api_key: None,
                cse_id: Some("cfg-cse".into()),
                endpoint: "http://127.0.0.1:9/unreachable".into(),
                max_results: 3,
            },
            Duration::from_secs(5),
        );

        let mut args = Arguments::new();
        args.insert("query".into(), json!("vercel cron"));
        let err = action.execute(&args).await.unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        args.insert("api_key".into(), json!("   "));
        let err = action.execute(&args).await.unwrap_err();
        assert!(err.to_string().contains("no api_key given"));
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let (url, _request) = serve_once(403, "application/json", r#"{"error":"forbidden"}"#).await;
        let action = SearchAction::new(config(&url), Duration::from_secs(5));

        let mut args = Arguments::new();
        args.insert("query".into(), json!("anything"));
        let err = action.execute(&args).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
