use domain::ports::MarkupRenderer;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// CommonMark to HTML. Raw HTML in the input is escaped, not passed through,
/// and link or image targets with any other scheme than http(s)/mailto are
/// blanked.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkRenderer;

impl MarkupRenderer for CommonMarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);

        let parser = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(raw) => Event::Text(raw),
            Event::Start(Tag::Link(kind, dest, title)) => {
                Event::Start(Tag::Link(kind, safe_destination(dest), title))
            }
            Event::Start(Tag::Image(kind, dest, title)) => {
                Event::Start(Tag::Image(kind, safe_destination(dest), title))
            }
            other => other,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    // A colon before any '/', '?' or '#' starts a scheme; otherwise the target is relative.
    let scheme = dest
        .find(|c: char| matches!(c, ':' | '/' | '?' | '#'))
        .filter(|&i| dest[i..].starts_with(':'))
        .map(|i| dest[..i].to_ascii_lowercase());

    match scheme {
        Some(s) if !SAFE_SCHEMES.contains(&s.as_str()) => CowStr::Borrowed(""),
        _ => dest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_markdown() {
        let html = CommonMarkRenderer.render("Hello **world**");
        assert_eq!(html, "<p>Hello <strong>world</strong></p>\n");
    }

    #[test]
    fn escapes_raw_html() {
        let html = CommonMarkRenderer.render("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn script_links_are_blanked() {
        for input in [
            "[click](javascript:alert(document.cookie))",
            "[click](JavaScript:alert(1))",
            "<javascript:alert(1)>",
            "![img](data:text/html;base64,PHNjcmlwdD4=)",
            "[ref]\n\n[ref]: vbscript:msgbox(1)",
        ] {
            let html = CommonMarkRenderer.render(input).to_ascii_lowercase();
            for scheme in ["javascript:", "data:", "vbscript:"] {
                assert!(!html.contains(&format!("=\"{}", scheme)), "{}", html);
            }
        }

        let html = CommonMarkRenderer.render("[click](javascript:alert(document.cookie))");
        assert_eq!(html, "<p><a href=\"\">click</a></p>\n");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn web_and_relative_links_kept() {
        assert_eq!(
            CommonMarkRenderer.render("[a](https://example.org/x?y=1)"),
            "<p><a href=\"https://example.org/x?y=1\">a</a></p>\n"
        );
        assert_eq!(
            CommonMarkRenderer.render("[a](/blog/post#c1)"),
            "<p><a href=\"/blog/post#c1\">a</a></p>\n"
        );
        assert_eq!(
            CommonMarkRenderer.render("[a](mailto:ferris@example.org)"),
            "<p><a href=\"mailto:ferris@example.org\">a</a></p>\n"
        );
    }

    #[test]
    fn strikethrough_enabled() {
        assert_eq!(CommonMarkRenderer.render("~~gone~~"), "<p><del>gone</del></p>\n");
    }
}
