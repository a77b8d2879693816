use super::discovery::discover_ws_endpoint;
use super::script;
use super::*;
use crate::locator::{ElementPattern, SelectionRule};
use crate::ScraperError;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (reqwest::Client, MockServer) {
    (reqwest::Client::new(), MockServer::start().await)
}

#[tokio::test]
async fn test_discovery_reads_websocket_url() {
    let (client, server) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Browser": "Chrome/126.0.6478.126",
            "Protocol-Version": "1.3",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc-123"
        })))
        .mount(&server)
        .await;

    let endpoint = Url::parse(&server.uri()).unwrap();
    let ws = discover_ws_endpoint(&client, &endpoint).await.unwrap();

    assert_eq!(ws, "ws://127.0.0.1:9222/devtools/browser/abc-123");
}

#[tokio::test]
async fn test_discovery_passes_websocket_endpoints_through() {
    let client = reqwest::Client::new();
    let endpoint = Url::parse("ws://127.0.0.1:9222/devtools/browser/xyz").unwrap();

    let ws = discover_ws_endpoint(&client, &endpoint).await.unwrap();

    assert_eq!(ws, endpoint.to_string());
}

#[tokio::test]
async fn test_discovery_rejects_missing_debugger_url() {
    let (client, server) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Browser": "Chrome" })))
        .mount(&server)
        .await;

    let endpoint = Url::parse(&server.uri()).unwrap();
    let result = discover_ws_endpoint(&client, &endpoint).await;

    assert!(matches!(
        result,
        Err(ScraperError::BrowserError(BrowserError::Discovery(_)))
    ));
}

#[tokio::test]
async fn test_discovery_reports_http_failure() {
    let (client, server) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let endpoint = Url::parse(&server.uri()).unwrap();
    let result = discover_ws_endpoint(&client, &endpoint).await;

    assert!(matches!(
        result,
        Err(ScraperError::BrowserError(BrowserError::Discovery(_)))
    ));
}

#[tokio::test]
async fn test_mock_query_respects_scope_and_visibility() {
    let browser = MockBrowser::new()
        .with_element(MockElement::new("panel", "div").attr("id", "panel"))
        .with_element(
            MockElement::new("inside", "input")
                .attr("type", "text")
                .inside("panel"),
        )
        .with_element(MockElement::new("outside", "input").attr("type", "text").hidden());

    let rule = SelectionRule::attribute(ElementPattern::tag("input").attr_eq("type", "text"));

    let all = browser.query(&UiContext::document(0), &rule).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].is_interactable());
    assert!(!all[1].is_interactable());

    let panel = browser.handle("panel").unwrap();
    let scoped = browser
        .query(&UiContext::within(panel, ContextKind::Region), &rule)
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].element.token, "inside");
}

#[tokio::test]
async fn test_mock_hidden_ancestor_hides_children() {
    let browser = MockBrowser::new()
        .with_element(MockElement::new("overlay", "div").hidden())
        .with_element(MockElement::new("close", "button").text("닫기").inside("overlay"));

    assert!(!browser.is_visible("close"));

    let rule = SelectionRule::text_exact(Some("button"), "닫기");
    let found = browser.query(&UiContext::document(0), &rule).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(!found[0].visible);
}

#[tokio::test]
async fn test_mock_click_applies_actions_and_opens_pages() {
    let browser = MockBrowser::new()
        .with_element(
            MockElement::new("entry", "a")
                .on_click(MockAction::OpenPage)
                .on_click(MockAction::Hide("entry".to_string())),
        )
        .with_element(MockElement::new("remote", "div").on_page(1));

    assert_eq!(browser.page_count().await.unwrap(), 1);
    let rule = SelectionRule::attribute(ElementPattern::tag("div"));
    assert!(browser.query(&UiContext::document(1), &rule).await.is_err());

    browser.click(&browser.handle("entry").unwrap()).await.unwrap();

    assert_eq!(browser.page_count().await.unwrap(), 2);
    assert!(!browser.is_visible("entry"));
    let found = browser.query(&UiContext::document(1), &rule).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_mock_input_semantics() {
    let browser = MockBrowser::new()
        .with_element(MockElement::new("typed", "input"))
        .with_element(MockElement::new("stubborn", "input").ignoring_input())
        .with_element(MockElement::new("frozen", "input").locked())
        .with_element(MockElement::new("size", "select").options(&["10", "100"]));

    for key in ["typed", "stubborn", "frozen"] {
        browser
            .fill(&browser.handle(key).unwrap(), "컴퓨터")
            .await
            .unwrap();
    }
    assert_eq!(browser.value_of("typed").unwrap(), "컴퓨터");
    assert_eq!(browser.value_of("stubborn").unwrap(), "");

    let stubborn = browser.handle("stubborn").unwrap();
    browser.force_value(&stubborn, "컴퓨터").await.unwrap();
    assert_eq!(browser.read_value(&stubborn).await.unwrap(), "컴퓨터");

    let frozen = browser.handle("frozen").unwrap();
    browser.force_value(&frozen, "컴퓨터").await.unwrap();
    assert_eq!(browser.read_value(&frozen).await.unwrap(), "");

    let size = browser.handle("size").unwrap();
    browser.select_option(&size, "100").await.unwrap();
    assert_eq!(browser.value_of("size").unwrap(), "100");
    assert!(browser.select_option(&size, "1000").await.is_err());
}

#[tokio::test]
async fn test_mock_removed_element_is_detached() {
    let browser = MockBrowser::new()
        .with_element(MockElement::new("box", "div"))
        .with_element(MockElement::new("inner", "input").inside("box"))
        .with_element(MockElement::new("x", "button").on_click(MockAction::Remove("box".to_string())));

    let inner = browser.handle("inner").unwrap();
    browser.click(&browser.handle("x").unwrap()).await.unwrap();

    let result = browser.read_value(&inner).await;
    assert!(matches!(
        result,
        Err(ScraperError::BrowserError(BrowserError::ElementDetached(_)))
    ));
}

#[tokio::test]
async fn test_mock_close_is_counted() {
    let browser = MockBrowser::new();
    let mut session: Box<dyn BrowserSession> = Box::new(browser.clone());

    session.close().await.unwrap();

    assert_eq!(browser.close_calls(), 1);
}

#[test]
fn test_query_script_embeds_selector_and_filter() {
    let rule = SelectionRule::text_exact(Some("a"), "제안공고목록");
    let js = script::query(0, &Scope::Document, &rule);

    assert!(js.contains("querySelectorAll(\"a\")"));
    assert!(js.contains("t === \"제안공고목록\""));
    assert!(js.contains(script::REF_ATTRIBUTE));
}

#[test]
fn test_query_script_scopes_to_frame_document() {
    let rule = SelectionRule::attribute(ElementPattern::tag("table"));
    let frame = ElementHandle::new(0, "gframe1");
    let js = script::query(0, &Scope::Frame(frame), &rule);

    assert!(js.contains("contentDocument"));
    assert!(js.contains("\"gframe1\""));
}

#[test]
fn test_action_scripts_escape_values() {
    let js = script::force_value("g1", "a\"b");
    assert!(js.contains(r#""a\"b""#));

    let js = script::select_option("g1", "100");
    assert!(js.contains("missing-option"));
}
