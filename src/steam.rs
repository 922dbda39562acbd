use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::StatValues;

const GLOBAL_STATS_PATH: &str = "/ISteamUserStats/GetGlobalStatsForGame/v1/";

/// Steam's `result` value for a successful call.
const RESULT_OK: i64 = 1;

/// Source of global stat totals for a game.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Current totals for `names`. Names the provider does not report resolve to 0.
    async fn global_stats(&self, appid: &str, names: &[String]) -> Result<StatValues>;
}

/// Client for the Steam Web API global stats endpoint.
#[derive(Debug, Clone)]
pub struct SteamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SteamClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{GLOBAL_STATS_PATH}", self.base_url.trim_end_matches('/'))
    }

    async fn get(&self, appid: &str, names: &[String]) -> Result<String> {
        let url = self.endpoint();
        // Key stays out of the log line.
        debug!("GET {url} appid={appid} names={names:?}");

        let resp = self
            .http
            .get(&url)
            .query(&build_query(&self.api_key, appid, names))
            .send()
            .await
            .map_err(|e| Error::Provider(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Provider(status.to_string()));
        }
        resp.text()
            .await
            .map_err(|e| Error::Provider(format!("failed to read response: {e}")))
    }

    /// Fetch the undecoded response body. Used by the probe binary.
    pub async fn raw_global_stats(
        &self,
        appid: &str,
        names: &[String],
    ) -> Result<serde_json::Value> {
        let body = self.get(appid, names).await?;
        serde_json::from_str(&body).map_err(|e| Error::Provider(format!("invalid JSON: {e}")))
    }
}

#[async_trait]
impl StatsSource for SteamClient {
    async fn global_stats(&self, appid: &str, names: &[String]) -> Result<StatValues> {
        let body = self.get(appid, names).await?;
        let stats = parse_global_stats(&body, names)?;
        debug!("Fetched {} stat(s) for app {appid}", stats.len());
        Ok(stats)
    }
}

/// Query parameters: `key`, `appid`, `count`, then `name[i]` for each name.
pub fn build_query(api_key: &str, appid: &str, names: &[String]) -> Vec<(String, String)> {
    let mut query = vec![
        ("key".to_string(), api_key.to_string()),
        ("appid".to_string(), appid.to_string()),
        ("count".to_string(), names.len().to_string()),
    ];
    for (i, name) in names.iter().enumerate() {
        query.push((format!("name[{i}]"), name.clone()));
    }
    query
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: GlobalStatsResponse,
}

#[derive(Debug, Deserialize)]
struct GlobalStatsResponse {
    #[serde(default)]
    result: i64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "globalstats")]
    global_stats: HashMap<String, GlobalStat>,
}

#[derive(Debug, Deserialize)]
struct GlobalStat {
    total: Total,
}

/// Steam sends totals as strings; accept bare numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Text(String),
    Number(i64),
}

impl Total {
    fn value(&self, name: &str) -> Result<i64> {
        match self {
            Total::Number(n) => Ok(*n),
            Total::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::Provider(format!("invalid total for {name}: {s:?}"))),
        }
    }
}

/// Decode a global stats response body into values for `names`.
pub fn parse_global_stats(body: &str, names: &[String]) -> Result<StatValues> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| Error::Provider(format!("invalid response: {e}")))?;
    let response = envelope.response;

    if response.result != RESULT_OK {
        let message = response
            .error
            .unwrap_or_else(|| format!("result code {}", response.result));
        return Err(Error::Provider(message));
    }

    let mut stats = StatValues::new();
    for name in names {
        let value = match response.global_stats.get(name) {
            Some(stat) => stat.total.value(name)?,
            None => 0,
        };
        stats.insert(name.clone(), value);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::CannedServer;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn query_indexes_names() {
        let q = build_query("KEY", "730", &names(&["kills", "wins"]));
        let expected: Vec<(String, String)> = [
            ("key", "KEY"),
            ("appid", "730"),
            ("count", "2"),
            ("name[0]", "kills"),
            ("name[1]", "wins"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(q, expected);
    }

    #[test]
    fn endpoint_joins_base() {
        let client = SteamClient::new("https://api.steampowered.com/", "KEY");
        assert_eq!(
            client.endpoint(),
            "https://api.steampowered.com/ISteamUserStats/GetGlobalStatsForGame/v1/"
        );
    }

    #[test]
    fn parses_string_totals() {
        let body = json!({
            "response": {
                "globalstats": {
                    "kills": {"total": "1234567"},
                    "wins": {"total": "42"}
                },
                "result": 1
            }
        })
        .to_string();
        let stats = parse_global_stats(&body, &names(&["kills", "wins"])).unwrap();
        assert_eq!(stats["kills"], 1_234_567);
        assert_eq!(stats["wins"], 42);
    }

    #[test]
    fn accepts_numeric_totals() {
        let body = json!({
            "response": {"globalstats": {"kills": {"total": 9}}, "result": 1}
        })
        .to_string();
        let stats = parse_global_stats(&body, &names(&["kills"])).unwrap();
        assert_eq!(stats["kills"], 9);
    }

    #[test]
    fn missing_name_is_zero() {
        let body = json!({
            "response": {"globalstats": {"kills": {"total": "10"}}, "result": 1}
        })
        .to_string();
        let stats = parse_global_stats(&body, &names(&["kills", "deaths"])).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["deaths"], 0);
    }

    #[test]
    fn missing_globalstats_is_all_zero() {
        let body = json!({"response": {"result": 1}}).to_string();
        let stats = parse_global_stats(&body, &names(&["a"])).unwrap();
        assert_eq!(stats["a"], 0);
    }

    #[test]
    fn only_requested_names_are_kept() {
        let body = json!({
            "response": {
                "globalstats": {"a": {"total": "1"}, "b": {"total": "2"}},
                "result": 1
            }
        })
        .to_string();
        let stats = parse_global_stats(&body, &names(&["b"])).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["b"], 2);
    }

    #[test]
    fn error_result_carries_message() {
        let body = json!({
            "response": {"result": 8, "error": "Invalid appid"}
        })
        .to_string();
        let err = parse_global_stats(&body, &names(&["kills"])).unwrap_err();
        match err {
            Error::Provider(msg) => assert_eq!(msg, "Invalid appid"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_result_without_message() {
        let body = json!({"response": {"result": 2}}).to_string();
        let err = parse_global_stats(&body, &names(&["kills"])).unwrap_err();
        assert!(matches!(err, Error::Provider(ref m) if m == "result code 2"));
    }

    #[test]
    fn non_integer_total_fails_whole_fetch() {
        let body = json!({
            "response": {
                "globalstats": {"a": {"total": "5"}, "b": {"total": "lots"}},
                "result": 1
            }
        })
        .to_string();
        let err = parse_global_stats(&body, &names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn garbage_body_is_provider_error() {
        let err = parse_global_stats("<html>", &names(&["a"])).unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    // ── HTTP ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn sends_indexed_query_and_decodes() {
        let body = json!({
            "response": {"globalstats": {"kills": {"total": "1500"}}, "result": 1}
        })
        .to_string();
        let server = CannedServer::start("200 OK", &body).await;
        let client = SteamClient::new(&server.base_url, "KEY");

        let stats = client
            .global_stats("730", &names(&["kills", "wins"]))
            .await
            .unwrap();

        assert_eq!(stats["kills"], 1_500);
        assert_eq!(stats["wins"], 0);
        let request = server.request().await;
        let request_line = request.lines().next().unwrap();
        assert_eq!(
            request_line,
            "GET /ISteamUserStats/GetGlobalStatsForGame/v1/?key=KEY&appid=730&count=2&name%5B0%5D=kills&name%5B1%5D=wins HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn http_error_status_is_provider_error() {
        let server = CannedServer::start("500 Internal Server Error", "").await;
        let client = SteamClient::new(&server.base_url, "KEY");

        let err = client
            .global_stats("730", &names(&["kills"]))
            .await
            .unwrap_err();

        match err {
            Error::Provider(msg) => assert_eq!(msg, "500 Internal Server Error"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn result_code_over_http_is_provider_error() {
        let body = json!({"response": {"result": 8, "error": "Invalid appid"}}).to_string();
        let server = CannedServer::start("200 OK", &body).await;
        let client = SteamClient::new(&server.base_url, "KEY");

        let err = client.global_stats("1", &names(&["x"])).await.unwrap_err();

        assert_eq!(err.to_string(), "steam api error: Invalid appid");
    }
}
