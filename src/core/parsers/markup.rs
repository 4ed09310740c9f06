use crate::utils::error::{EtlError, Result};
use scraper::{ElementRef, Html, Selector};

// Text inside these never reaches the page text.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

pub fn selector(strategy: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EtlError::ParseError {
        strategy: strategy.to_string(),
        message: format!("invalid selector '{}': {}", css, e),
    })
}

/// 取出整頁可見文字，每個文字節點一行
pub fn page_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join("\n")
}

/// Whitespace-normalized text of one element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_skips_scripts_and_styles() {
        let html = r#"<html><head><style>.x { color: red }</style>
            <script>var price = "$1";</script></head>
            <body><h1>Surf</h1><p>Beginner   <b>$95</b></p></body></html>"#;
        let document = Html::parse_document(html);
        let text = page_text(&document);
        assert_eq!(text, "Surf\nBeginner\n$95");
    }

    #[test]
    fn test_element_text_and_parent() {
        let html = r#"<div class="card"><div><h3> Beginner
            Waves </h3></div><b>$ 103.00</b></div>"#;
        let document = Html::parse_document(html);
        let h3 = selector("test", "h3").unwrap();
        let heading = document.select(&h3).next().unwrap();
        assert_eq!(element_text(heading), "Beginner Waves");

        let parent = parent_element(heading).unwrap();
        let container = parent_element(parent).unwrap();
        assert_eq!(container.value().attr("class"), Some("card"));
        assert_eq!(element_text(container), "Beginner Waves $ 103.00");
    }

    #[test]
    fn test_invalid_selector_is_parse_error() {
        match selector("wave7", "h3[") {
            Err(EtlError::ParseError { strategy, .. }) => assert_eq!(strategy, "wave7"),
            other => panic!("expected ParseError, got {:?}", other.is_ok()),
        }
    }
}
