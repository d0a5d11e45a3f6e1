use ammonia::Builder;
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static HTML_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?[a-z][\s\S]*?>").expect("invalid html pattern"));

const ALLOWED_TAGS: &[&str] = &[
    "a", "p", "br", "strong", "b", "em", "i", "u", "s", "span", "ul", "ol", "li", "blockquote", "h1", "h2", "h3", "h4",
];

const STYLED_TAGS: &[&str] = &["span", "p", "h1", "h2", "h3", "h4"];

const ALLOWED_STYLE_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "font-size",
    "font-family",
    "font-weight",
    "font-style",
    "text-decoration",
    "text-align",
    "line-height",
];

/// Keep only allow-listed declarations from an inline style attribute.
fn filter_style(value: &str) -> String {
    value
        .split(';')
        .filter_map(|declaration| {
            let (property, prop_value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let prop_value = prop_value.trim();
            if ALLOWED_STYLE_PROPERTIES.contains(&property.as_str()) && !prop_value.is_empty() {
                Some(format!("{property}: {prop_value}"))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

static SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "title", "target", "rel"].into_iter().collect());
    for tag in STYLED_TAGS {
        tag_attributes.insert(tag, ["style"].into_iter().collect());
    }

    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .attribute_filter(|_element, attribute, value| {
            if attribute == "style" {
                Some(filter_style(value).into())
            } else {
                Some(value.into())
            }
        })
        .link_rel(Some("noopener noreferrer"));
    builder
});

/// Render an admin-entered product summary to HTML that is safe to embed
/// unescaped. Input that already contains markup is sanitized as-is;
/// otherwise it is treated as markdown first. Editors paste both.
pub fn render_rich_text(value: &str) -> String {
    let raw = value.trim();
    if raw.is_empty() {
        return String::new();
    }

    let html_input = if HTML_PATTERN.is_match(raw) {
        raw.to_string()
    } else {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(raw, options);
        let mut rendered = String::new();
        html::push_html(&mut rendered, parser);
        rendered
    };

    SANITIZER.clean(&html_input).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render_rich_text(""), "");
        assert_eq!(render_rich_text("   "), "");
    }

    #[test]
    fn markdown_is_rendered() {
        let html = render_rich_text("**Tough** brake pads");
        assert!(html.contains("<strong>Tough</strong>"));
    }

    #[test]
    fn raw_html_passes_through_sanitized() {
        let html = render_rich_text(r#"<p style="color: red">Red</p>"#);
        assert!(html.contains("<p"));
        assert!(html.contains("color"));
    }

    #[test]
    fn script_tags_are_stripped() {
        let html = render_rich_text("<p>ok</p><script>alert(1)</script>");
        assert!(!html.contains("script"));
        assert!(html.contains("ok"));
    }

    #[test]
    fn event_handler_attributes_are_stripped() {
        let html = render_rich_text(r#"<p onclick="steal()">click</p>"#);
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn filter_style_keeps_only_allowed_declarations() {
        let filtered = filter_style("color: red; position: fixed; FONT-SIZE: 12px");
        assert_eq!(filtered, "color: red; font-size: 12px");
        assert_eq!(filter_style("behavior: url(evil)"), "");
    }

    #[test]
    fn disallowed_style_properties_are_dropped() {
        let html = render_rich_text(r#"<span style="position: fixed; color: blue">x</span>"#);
        assert!(!html.contains("position"));
        assert!(html.contains("color"));
    }
}
