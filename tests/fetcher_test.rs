//! Integration tests for AnnouncementFetcher using wiremock

mod common;

use notice_relay::models::{Fidelity, SelectorConfig};
use notice_relay::services::{AnnouncementFetcher, AnnouncementSource};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETAIL_PATH: &str = "/bbs/cse/1/101/artclView.do";

async fn mount_detail(server: &MockServer, html: String) {
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

fn fetcher(tmp: &TempDir) -> AnnouncementFetcher {
    AnnouncementFetcher::new(
        common::client(),
        &SelectorConfig::default(),
        &tmp.path().join("downloads"),
    )
    .unwrap()
}

/// Partial fetch reads title and text only
#[tokio::test]
async fn test_fetch_partial() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    mount_detail(
        &server,
        common::detail_html(
            "겨울방학 해외 봉사단 모집",
            "<p>봉사단원을 모집합니다.</p>",
            &[("지원서.hwp", "/bbs/cse/1/101/download.do")],
        ),
    )
    .await;

    let url = format!("{}{}", server.uri(), DETAIL_PATH);
    let ann = fetcher(&tmp).fetch_partial(&url).await.unwrap();

    assert_eq!(ann.title(), "겨울방학 해외 봉사단 모집");
    assert_eq!(ann.content_text(), "봉사단원을 모집합니다.");
    assert_eq!(ann.fidelity(), Fidelity::Partial);
    assert!(ann.attachments().is_empty());
    assert!(!tmp.path().join("downloads").exists());
}

/// A failing attachment is skipped, the rest are staged
#[tokio::test]
async fn test_fetch_full_skips_failed_attachment() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    mount_detail(
        &server,
        common::detail_html(
            "장학금 신청 안내",
            r#"<p>안내문</p><img src="/upload/poster.png">"#,
            &[
                ("신청서.hwp", "/bbs/cse/1/101/download.do?file=1"),
                ("요강.pdf", "/bbs/cse/1/102/download.do"),
            ],
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/bbs/cse/1/101/download.do"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"HWP-BYTES".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bbs/cse/1/102/download.do"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), DETAIL_PATH);
    let ann = fetcher(&tmp).fetch_full(&url).await.unwrap();

    assert_eq!(ann.fidelity(), Fidelity::Full);
    assert!(
        ann.content_html()
            .contains(&format!(r#"src="{}/upload/poster.png""#, server.uri()))
    );

    let files = ann.attachments();
    assert_eq!(files.len(), 1);
    assert!(files[0].is_absolute());
    assert_eq!(files[0].file_name().unwrap(), "신청서.hwp");
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"HWP-BYTES");

    let staged = files[0].parent().unwrap().to_path_buf();
    fetcher(&tmp).release(&ann).await;
    assert!(!staged.exists());
    assert!(tmp.path().join("downloads").exists());
}

/// Missing page yields None
#[tokio::test]
async fn test_fetch_full_page_not_found() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}{}", server.uri(), DETAIL_PATH);
    assert!(fetcher(&tmp).fetch_full(&url).await.is_none());
    assert!(fetcher(&tmp).fetch_partial(&url).await.is_none());
}

/// A page without the content container yields None
#[tokio::test]
async fn test_fetch_full_without_body_container() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    mount_detail(
        &server,
        r#"<html><body><h2 class="artclViewTitle">제목</h2><p>삭제된 게시물입니다.</p></body></html>"#
            .to_string(),
    )
    .await;

    let url = format!("{}{}", server.uri(), DETAIL_PATH);
    assert!(fetcher(&tmp).fetch_full(&url).await.is_none());
}

/// A page without the title heading still yields its body
#[tokio::test]
async fn test_fetch_full_without_title_heading() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    mount_detail(
        &server,
        r#"<html><body><div class="artclView"><p>제목 없는 공지 본문</p></div></body></html>"#
            .to_string(),
    )
    .await;

    let url = format!("{}{}", server.uri(), DETAIL_PATH);
    let ann = fetcher(&tmp).fetch_full(&url).await.unwrap();

    assert_eq!(ann.fidelity(), Fidelity::Full);
    assert!(ann.title().is_empty());
    assert_eq!(ann.content_text(), "제목 없는 공지 본문");
}
