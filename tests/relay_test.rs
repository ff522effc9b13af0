//! End-to-end relay run against mock boards and a mock oracle

mod common;

use std::sync::Arc;
use std::time::Duration;

use notice_relay::models::{BoardCursor, ClassifierConfig, OracleConfig, SelectorConfig};
use notice_relay::pipeline::{AnnouncementOutcome, Relay, RunReport};
use notice_relay::services::publisher::DryRunPublisher;
use notice_relay::services::{
    AnnouncementDiscovery, AnnouncementFetcher, Classifier, DuplicateDetector, OpenAiOracle,
};
use notice_relay::storage::{CursorStore, LedgerStore, LocalStorage};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

/// Cursor at 100, listing at 103: one rule match, one oracle verdict, one exclusion
#[tokio::test]
async fn test_relay_run_publishes_and_advances() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page(
        &server,
        "/cse/list.do",
        common::listing_html(&[
            ("103", "/bbs/cse/103/artclView.do"),
            ("102", "/bbs/cse/102/artclView.do"),
            ("101", "/bbs/cse/101/artclView.do"),
            ("100", "/bbs/cse/100/artclView.do"),
        ]),
    )
    .await;
    mount_page(
        &server,
        "/bbs/cse/101/artclView.do",
        common::detail_html(
            "2025학년도 장학금 신청 안내",
            "<p>신청서를 제출하세요.</p>",
            &[("신청서.hwp", "/bbs/cse/101/download.do")],
        ),
    )
    .await;
    mount_page(
        &server,
        "/bbs/cse/102/artclView.do",
        common::detail_html("겨울방학 해외 봉사단 모집", "<p>단원을 모집합니다.</p>", &[]),
    )
    .await;
    mount_page(
        &server,
        "/bbs/cse/103/artclView.do",
        common::detail_html("도서관 대출 기간 연장", "<p>연장합니다.</p>", &[]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/bbs/cse/101/download.do"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"HWP".to_vec()))
        .mount(&server)
        .await;

    // Only the announcement without a keyword match reaches the oracle.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::chat_reply("봉사활동")))
        .expect(1)
        .mount(&server)
        .await;

    let page_url = format!("{}/cse/list.do", server.uri());
    let storage = LocalStorage::new(tmp.path());
    storage
        .save_boards(&[BoardCursor::new(&page_url, server.uri(), 100)])
        .await
        .unwrap();

    let client = common::client();
    let selectors = SelectorConfig::default();
    let scanner = AnnouncementDiscovery::new(client.clone(), &selectors).unwrap();
    let source =
        AnnouncementFetcher::new(client.clone(), &selectors, &tmp.path().join("downloads"))
            .unwrap();
    let oracle_config = OracleConfig {
        endpoint: format!("{}/v1", server.uri()),
        ..OracleConfig::default()
    };
    let oracle = OpenAiOracle::new(client, &oracle_config, "test-key");
    let classifier = Classifier::new(ClassifierConfig::default(), Arc::new(oracle));
    let detector = DuplicateDetector::new(100);
    let mut publisher = DryRunPublisher::new();

    let mut report = RunReport::new(true);
    Relay {
        cursors: &storage,
        ledger: &storage,
        scanner: &scanner,
        source: &source,
        detector: &detector,
        classifier: &classifier,
        publisher: &mut publisher,
        request_delay: Duration::ZERO,
    }
    .run(&mut report)
    .await
    .unwrap();

    assert_eq!(
        publisher.published(),
        ["2025학년도 장학금 신청 안내", "겨울방학 해외 봉사단 모집"]
    );
    assert_eq!(report.cursor_advances, 1);
    assert_eq!(report.count("excluded"), 1);
    assert!(matches!(
        report.announcements[0].outcome,
        AnnouncementOutcome::Published { attached: 1, .. }
    ));
    let staged = std::fs::read_dir(tmp.path().join("downloads")).unwrap().count();
    assert_eq!(staged, 0);

    let cursors = storage.get_all().await.unwrap();
    assert_eq!(cursors[0].last_seen_number, 103);
    assert_eq!(
        storage.load_titles().await.unwrap(),
        vec!["2025학년도 장학금 신청 안내", "겨울방학 해외 봉사단 모집"]
    );

    storage.write_report(&report).await.unwrap();
    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(tmp.path().join("last_run.json")).unwrap()).unwrap();
    assert_eq!(saved["announcements"].as_array().unwrap().len(), 3);
}

/// Second run over the same listing finds nothing and calls nobody
#[tokio::test]
async fn test_relay_rerun_is_idle() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    mount_page(
        &server,
        "/cse/list.do",
        common::listing_html(&[("103", "/bbs/cse/103/artclView.do")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bbs/cse/103/artclView.do"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page_url = format!("{}/cse/list.do", server.uri());
    let storage = LocalStorage::new(tmp.path());
    storage
        .save_boards(&[BoardCursor::new(&page_url, server.uri(), 103)])
        .await
        .unwrap();

    let client = common::client();
    let selectors = SelectorConfig::default();
    let scanner = AnnouncementDiscovery::new(client.clone(), &selectors).unwrap();
    let source =
        AnnouncementFetcher::new(client.clone(), &selectors, &tmp.path().join("downloads"))
            .unwrap();
    let oracle = OpenAiOracle::new(client, &OracleConfig::default(), "unused");
    let classifier = Classifier::new(ClassifierConfig::default(), Arc::new(oracle));
    let detector = DuplicateDetector::new(100);
    let mut publisher = DryRunPublisher::new();

    let mut report = RunReport::new(true);
    Relay {
        cursors: &storage,
        ledger: &storage,
        scanner: &scanner,
        source: &source,
        detector: &detector,
        classifier: &classifier,
        publisher: &mut publisher,
        request_delay: Duration::ZERO,
    }
    .run(&mut report)
    .await
    .unwrap();

    assert!(publisher.published().is_empty());
    assert_eq!(report.boards_scanned, 1);
    assert_eq!(report.cursor_advances, 0);
    assert!(report.announcements.is_empty());
}
