//! Page renderer
//!
//! Every response body is wrapped in a single HTML page template loaded from
//! disk. The template is read at most once per process, normally at startup
//! through [`PageRenderer::preload`]; if that read fails, every render returns
//! [`FALLBACK_PAGE`] instead.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Marker replaced with the page title
pub const TITLE_MARKER: &str = "{{TITLE}}";
/// Marker replaced with the raw body HTML
pub const CONTENT_MARKER: &str = "{{CONTENT}}";
/// Returned in place of a page when the template cannot be read
pub const FALLBACK_PAGE: &str = "Error: the page template could not be loaded.";

#[derive(Debug)]
pub struct PageRenderer {
    path: PathBuf,
    template: OnceLock<Option<String>>,
}

impl PageRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PageRenderer {
            path: path.into(),
            template: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the template now so request handlers never touch the filesystem.
    pub fn preload(&self) {
        let _ = self.template();
    }

    /// Render a full page. `body` is inserted as-is, without escaping.
    pub fn render(&self, title: &str, body: &str) -> String {
        match self.template() {
            Some(template) => substitute(template, title, body),
            None => FALLBACK_PAGE.to_string(),
        }
    }

    fn template(&self) -> Option<&str> {
        self.template
            .get_or_init(|| match std::fs::read_to_string(&self.path) {
                Ok(text) => {
                    tracing::info!(path = %self.path.display(), "Page template loaded");
                    Some(text)
                }
                Err(e) => {
                    tracing::error!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to read page template, serving fallback text"
                    );
                    None
                }
            })
            .as_deref()
    }
}

/// Replace the first occurrence of each marker.
///
/// Both markers are located in the template before anything is inserted, so
/// marker text inside `title` or `body` is never substituted.
pub fn substitute(template: &str, title: &str, body: &str) -> String {
    let mut slots: Vec<(usize, &str, &str)> = [(TITLE_MARKER, title), (CONTENT_MARKER, body)]
        .into_iter()
        .filter_map(|(marker, value)| template.find(marker).map(|at| (at, marker, value)))
        .collect();
    slots.sort_by_key(|(at, _, _)| *at);

    let mut page = String::with_capacity(template.len() + title.len() + body.len());
    let mut cursor = 0;
    for (at, marker, value) in slots {
        page.push_str(&template[cursor..at]);
        page.push_str(value);
        cursor = at + marker.len();
    }
    page.push_str(&template[cursor..]);
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_template(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "access-gate-{}-{}.html",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_substitute_both_markers() {
        let page = substitute(
            "<title>{{TITLE}}</title><main>{{CONTENT}}</main>",
            "Hello",
            "<p>body</p>",
        );
        assert_eq!(page, "<title>Hello</title><main><p>body</p></main>");
    }

    #[test]
    fn test_substitute_only_first_occurrence() {
        let page = substitute("{{TITLE}} {{TITLE}} {{CONTENT}} {{CONTENT}}", "t", "c");
        assert_eq!(page, "t {{TITLE}} c {{CONTENT}}");
    }

    #[test]
    fn test_marker_text_in_title_is_not_substituted() {
        let page = substitute(
            "<h1>{{TITLE}}</h1><div>{{CONTENT}}</div>",
            "{{CONTENT}} and {{TITLE}}",
            "body",
        );
        assert_eq!(page, "<h1>{{CONTENT}} and {{TITLE}}</h1><div>body</div>");
    }

    #[test]
    fn test_marker_order_does_not_matter() {
        let page = substitute("{{CONTENT}}|{{TITLE}}", "t", "{{TITLE}}");
        assert_eq!(page, "{{TITLE}}|t");
    }

    #[test]
    fn test_missing_marker_leaves_template_intact() {
        assert_eq!(substitute("<p>{{TITLE}}</p>", "x", "unused"), "<p>x</p>");
        assert_eq!(substitute("static", "x", "y"), "static");
    }

    #[test]
    fn test_render_reads_template_once() {
        let path = temp_template("once", "<h1>{{TITLE}}</h1>{{CONTENT}}");
        let renderer = PageRenderer::new(&path);

        assert_eq!(renderer.render("A", "b"), "<h1>A</h1>b");

        std::fs::write(&path, "changed {{TITLE}}").unwrap();
        assert_eq!(renderer.render("C", "d"), "<h1>C</h1>d");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_preload_reads_before_first_render() {
        let path = temp_template("preload", "<h1>{{TITLE}}</h1>{{CONTENT}}");
        let renderer = PageRenderer::new(&path);

        renderer.preload();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(renderer.render("A", "b"), "<h1>A</h1>b");
    }

    #[test]
    fn test_unreadable_template_returns_fallback_every_time() {
        let renderer = PageRenderer::new("/nonexistent/access-gate/page.html");

        for _ in 0..3 {
            assert_eq!(renderer.render("Title", "<p>body</p>"), FALLBACK_PAGE);
        }
    }
}
