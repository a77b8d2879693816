use super::error::BrowserError;
use crate::core::ScraperResult;
use log::debug;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
    #[serde(rename = "Browser", default)]
    browser: String,
}

/// Turns a remote-debugging endpoint into the browser's DevTools websocket
/// URL. `ws://` and `wss://` endpoints are returned unchanged; HTTP endpoints
/// are asked via `/json/version`.
pub async fn discover_ws_endpoint(client: &reqwest::Client, endpoint: &Url) -> ScraperResult<String> {
    if matches!(endpoint.scheme(), "ws" | "wss") {
        return Ok(endpoint.to_string());
    }

    let version_url = endpoint.join("json/version")?;
    debug!("Discovering DevTools endpoint via {}", version_url);

    let response = client.get(version_url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(BrowserError::Discovery(format!(
            "{} returned {}",
            version_url,
            response.status()
        ))
        .into());
    }

    let info: VersionInfo = response.json().await?;
    match info.web_socket_debugger_url {
        Some(ws) if !ws.is_empty() => {
            debug!("Found {} at {}", info.browser, ws);
            Ok(ws)
        }
        _ => Err(BrowserError::Discovery(format!(
            "{} did not advertise a webSocketDebuggerUrl",
            version_url
        ))
        .into()),
    }
}
