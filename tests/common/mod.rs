//! Common test utilities

use notice_relay::models::CrawlerConfig;
use notice_relay::utils::http::create_async_client;

/// HTTP client with default crawler settings.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    create_async_client(&CrawlerConfig::default()).unwrap()
}

/// Listing page with one table row per `(number, href)`.
#[allow(dead_code)]
pub fn listing_html(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(num, href)| {
            format!(
                r#"<tr>
                    <td class="_artclTdNum">{num}</td>
                    <td class="_artclTdTitle"><a class="artclLinkView" href="{href}"><strong>제목</strong></a></td>
                    <td class="_artclTdWriter">학과사무실</td>
                </tr>"#
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><body><table class="artclTable"><thead><tr><th>번호</th><th>제목</th></tr></thead><tbody>{rows}</tbody></table></body></html>"#
    )
}

/// Detail page with the given title, body markup and attachment links.
#[allow(dead_code)]
pub fn detail_html(title: &str, body: &str, attachments: &[(&str, &str)]) -> String {
    let links: String = attachments
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{href}">{name}</a></li>"#))
        .collect();
    format!(
        r#"<!DOCTYPE html><html><body>
            <h2 class="artclViewTitle">{title}</h2>
            <dl class="artclForm"><dd class="artclInsert"><ul>{links}</ul></dd></dl>
            <div class="artclView">{body}</div>
        </body></html>"#
    )
}

/// OpenAI-style chat completion reply.
#[allow(dead_code)]
pub fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}
