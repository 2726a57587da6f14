use scraper::{Html, Selector};

/// Text of the first `h1`-`h3` element with non-blank content, in document order.
pub fn first_heading(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse("h1, h2, h3").ok()?;

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

/// All text content with markup removed. Uses the `<body>` when there is one so that the
/// `<title>` in the head does not leak into the prose.
pub fn plain_text(markup: &str) -> String {
    let document = Html::parse_document(markup);

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return body.text().collect();
        }
    }

    document.root_element().text().collect()
}

pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_skips_blank_elements() {
        let html = "<html><body><h1>  </h1><p>x</p><h2>The Storm</h2><h1>Later</h1></body></html>";
        assert_eq!(first_heading(html).as_deref(), Some("The Storm"));
    }

    #[test]
    fn heading_ignores_lower_levels() {
        let html = "<html><body><h4>Aside</h4><p>Only prose.</p></body></html>";
        assert_eq!(first_heading(html), None);
    }

    #[test]
    fn plain_text_drops_tags_and_head() {
        let html = "<html><head><title>Meta</title></head>\
                    <body><h1>One</h1><p>First <em>bold</em> line.</p></body></html>";
        let text = normalize_text(&plain_text(html));
        assert_eq!(text, "OneFirst bold line.");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  a\n\n b\u{00A0}\tc  "), "a b c");
    }
}
