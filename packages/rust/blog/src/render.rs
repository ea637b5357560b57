//! Post body rendering: Markdown → HTML → allow-list sanitizer.
//!
//! CMS bodies may mix Markdown with raw HTML. The sanitizer walks the parsed
//! fragment and re-emits only known-safe elements and attributes; everything
//! else is either unwrapped (its text kept) or dropped with its content.

use pulldown_cmark::{Options, Parser, html};
use scraper::{ElementRef, Html, Node};

/// Elements emitted as is (minus disallowed attributes).
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "del", "div", "em", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "ol", "p", "pre", "s", "span",
    "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

/// Elements removed together with everything inside them.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "template", "svg", "math", "form", "input", "button", "select", "textarea", "link", "meta",
    "base", "title", "head",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Schemes accepted in `href` / `src`.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Markdown (with inline HTML) → HTML, unsanitized.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render a post body to display-safe HTML.
pub fn render_body(body: &str) -> String {
    sanitize_html(&markdown_to_html(body))
}

/// Re-emit `html` keeping only allow-listed markup.
pub fn sanitize_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_element(fragment.root_element(), &mut out);
    out
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

fn write_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();

    if DROPPED_TAGS.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        // html/body wrappers and unknown elements: keep the children only
        write_children(el, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        if keep_attribute(name, attr, value) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            push_escaped(out, value, true);
            out.push('"');
        }
    }
    if name == "a" {
        out.push_str(" rel=\"noopener noreferrer\"");
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    write_children(el, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_children(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_escaped(out, text, false),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, out);
                }
            }
            // Comments, doctypes, processing instructions
            _ => {}
        }
    }
}

fn keep_attribute(tag: &str, attr: &str, value: &str) -> bool {
    let allowed = matches!(
        (tag, attr),
        (_, "title")
            | ("a", "href")
            | ("img", "src" | "alt" | "width" | "height")
            | ("td" | "th", "colspan" | "rowspan" | "align")
            | ("ol", "start")
            | ("code", "class")
    );
    if !allowed {
        return false;
    }

    match attr {
        "href" | "src" => is_safe_url(value),
        // Only syntax-highlighting hints
        "class" => value.starts_with("language-"),
        _ => true,
    }
}

/// Relative URLs and URLs with an allow-listed scheme.
fn is_safe_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();

    let Some(colon) = compact.find(':') else {
        return true;
    };
    let before = &compact[..colon];
    if before.contains(['/', '?', '#']) {
        return true;
    }
    let scheme = before.to_ascii_lowercase();
    SAFE_SCHEMES.contains(&scheme.as_str())
}

fn push_escaped(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_renders_basic_blocks() {
        let html = render_body("## Title\n\nSome **bold** and *em*.\n\n- one\n- two\n");
        assert!(html.contains("<h2>Title</h2>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>em</em>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn tables_and_strikethrough() {
        let html = render_body("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn scripts_and_styles_are_removed_with_content() {
        let html = sanitize_html("<p>ok</p><script>alert('x')</script><style>p{}</style>");
        assert_eq!(html, "<p>ok</p>");
    }

    #[test]
    fn event_handlers_are_stripped() {
        let html = sanitize_html(r#"<img src="/a.png" onerror="alert(1)" alt="A">"#);
        assert!(!html.contains("onerror"));
        assert!(html.contains(r#"src="/a.png""#));
        assert!(html.contains(r#"alt="A""#));
    }

    #[test]
    fn javascript_urls_are_stripped() {
        for href in [
            "javascript:alert(1)",
            "JavaScript:alert(1)",
            " java\tscript:alert(1)",
            "data:text/html;base64,AAAA",
            "vbscript:msgbox",
        ] {
            let html = sanitize_html(&format!(r#"<a href="{href}">x</a>"#));
            assert!(!html.contains("href"), "{href} survived: {html}");
            assert!(html.contains(">x</a>"));
        }
    }

    #[test]
    fn safe_links_keep_href_and_gain_rel() {
        let html = sanitize_html(r#"<a href="https://www.strandly.eu/blog?x=1&y=2">go</a>"#);
        assert_eq!(
            html,
            r#"<a href="https://www.strandly.eu/blog?x=1&amp;y=2" rel="noopener noreferrer">go</a>"#
        );

        assert!(sanitize_html(r#"<a href="/blog/x">r</a>"#).contains(r#"href="/blog/x""#));
        assert!(sanitize_html(r##"<a href="#top">t</a>"##).contains(r##"href="#top""##));
        assert!(sanitize_html(r#"<a href="mailto:hi@strandly.eu">m</a>"#).contains("mailto:"));
    }

    #[test]
    fn unknown_elements_are_unwrapped() {
        let html = sanitize_html("<section><custom-box>inner <b>bold</b></custom-box></section>");
        assert_eq!(html, "inner <b>bold</b>");
    }

    #[test]
    fn text_is_escaped() {
        let html = sanitize_html("<p>1 &lt; 2 &amp; 3 &gt; 0</p>");
        assert_eq!(html, "<p>1 &lt; 2 &amp; 3 &gt; 0</p>");
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(sanitize_html("<p>a<!-- secret --></p>"), "<p>a</p>");
    }

    #[test]
    fn code_language_class_survives() {
        let html = render_body("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<code class="language-rust">"#));

        let html = sanitize_html(r#"<code class="evil">x</code>"#);
        assert_eq!(html, "<code>x</code>");
    }

    #[test]
    fn inline_html_in_markdown_is_sanitized() {
        let html = render_body("Cold air is *drying*.<script>alert('x')</script>");
        assert!(html.contains("<em>drying</em>"));
        assert!(!html.contains("script"));
        assert!(!html.contains("alert"));
    }
}
