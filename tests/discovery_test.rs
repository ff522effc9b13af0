//! Integration tests for AnnouncementDiscovery using wiremock

mod common;

use notice_relay::models::{BoardCursor, SelectorConfig};
use notice_relay::services::{AnnouncementDiscovery, BoardScanner};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cursor(server: &MockServer, last: u64) -> BoardCursor {
    BoardCursor::new(
        format!("{}/cse/list.do", server.uri()),
        server.uri(),
        last,
    )
}

/// New rows come back oldest first as absolute URLs
#[tokio::test]
async fn test_discovers_new_rows() {
    let server = MockServer::start().await;
    let html = common::listing_html(&[
        ("103", "/bbs/cse/103/artclView.do"),
        ("102", "/bbs/cse/102/artclView.do"),
        ("101", "/bbs/cse/101/artclView.do"),
        ("100", "/bbs/cse/100/artclView.do"),
    ]);

    Mock::given(method("GET"))
        .and(path("/cse/list.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let discovery = AnnouncementDiscovery::new(common::client(), &SelectorConfig::default()).unwrap();
    let result = discovery.discover(&cursor(&server, 100)).await;

    assert_eq!(result.latest_number, 103);
    assert_eq!(
        result.urls,
        vec![
            format!("{}/bbs/cse/101/artclView.do", server.uri()),
            format!("{}/bbs/cse/102/artclView.do", server.uri()),
            format!("{}/bbs/cse/103/artclView.do", server.uri()),
        ]
    );
}

/// A listing that failed to load leaves the cursor where it was
#[tokio::test]
async fn test_server_error_yields_unchanged_discovery() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cse/list.do"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let discovery = AnnouncementDiscovery::new(common::client(), &SelectorConfig::default()).unwrap();
    let result = discovery.discover(&cursor(&server, 42)).await;

    assert!(result.urls.is_empty());
    assert_eq!(result.latest_number, 42);
}

/// Nothing newer than the cursor
#[tokio::test]
async fn test_up_to_date_board() {
    let server = MockServer::start().await;
    let html = common::listing_html(&[("7", "/bbs/b/7/artclView.do"), ("6", "/bbs/b/6/artclView.do")]);

    Mock::given(method("GET"))
        .and(path("/cse/list.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let discovery = AnnouncementDiscovery::new(common::client(), &SelectorConfig::default()).unwrap();
    let result = discovery.discover(&cursor(&server, 7)).await;

    assert!(result.urls.is_empty());
    assert_eq!(result.latest_number, 7);
}
