//! Body markup adjustments applied before posting.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Classes the portal editor uses to fit images to the viewport.
pub const IMAGE_CLASSES: &str = "img-responsive atto_image_button_text-bottom";

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img tag pattern"));

static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(\sclass\s*=\s*")([^"]*)(")"#).expect("valid class attribute pattern")
});

/// Prepend a paragraph linking back to the source announcement.
pub fn with_source_banner(body_html: &str, source_url: &str) -> String {
    format!("<p>본문 링크 : <a href=\"{source_url}\">{source_url}</a></p>{body_html}")
}

/// Append [`IMAGE_CLASSES`] to every `<img>`, keeping existing classes.
pub fn annotate_images(html: &str) -> String {
    IMG_TAG
        .replace_all(html, |tag: &Captures| {
            let tag = &tag[0];
            if CLASS_ATTR.is_match(tag) {
                CLASS_ATTR
                    .replace(tag, |attr: &Captures| {
                        let existing = attr[2].trim();
                        let classes = if existing.is_empty() {
                            IMAGE_CLASSES.to_string()
                        } else {
                            format!("{existing} {IMAGE_CLASSES}")
                        };
                        format!("{}{}{}", &attr[1], classes, &attr[3])
                    })
                    .into_owned()
            } else {
                format!("<img class=\"{IMAGE_CLASSES}\"{}", &tag[4..])
            }
        })
        .into_owned()
}

/// Full body as posted: banner first, then the annotated content.
pub fn prepare_body(body_html: &str, source_url: &str) -> String {
    annotate_images(&with_source_banner(body_html, source_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_is_prepended() {
        let body = with_source_banner("<p>본문</p>", "https://a.example/1");
        assert_eq!(
            body,
            "<p>본문 링크 : <a href=\"https://a.example/1\">https://a.example/1</a></p><p>본문</p>"
        );
    }

    #[test]
    fn test_image_without_class_gets_classes() {
        let html = annotate_images(r#"<p><img src="https://a.example/x.png"></p>"#);
        assert_eq!(
            html,
            r#"<p><img class="img-responsive atto_image_button_text-bottom" src="https://a.example/x.png"></p>"#
        );
    }

    #[test]
    fn test_existing_classes_are_kept() {
        let html = annotate_images(r#"<IMG class="wide" src="x.png" />"#);
        assert_eq!(
            html,
            r#"<IMG class="wide img-responsive atto_image_button_text-bottom" src="x.png" />"#
        );
    }

    #[test]
    fn test_every_image_is_annotated() {
        let html = annotate_images(r#"<img src="a.png"><span>caption</span><img src="b.png">"#);
        assert_eq!(html.matches(IMAGE_CLASSES).count(), 2);
    }

    #[test]
    fn test_other_tags_untouched() {
        let html = r#"<p class="lead">텍스트</p><imgx src="y">"#;
        assert_eq!(annotate_images(html), html);
    }

    #[test]
    fn test_prepare_body_keeps_banner_first() {
        let body = prepare_body(r#"<img src="a.png">"#, "https://a.example/1");
        assert!(body.starts_with("<p>본문 링크 : "));
        assert!(body.contains(IMAGE_CLASSES));
    }
}
