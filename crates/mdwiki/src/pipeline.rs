//! The full render pipeline.

use std::io::Write;

use mdwiki_config::RenderConfig;
use mdwiki_renderer::{MarkdownRenderer, PageOracle, RenderStats};
use mdwiki_sanitize::sanitize;

use crate::error::RenderError;

/// Renders wiki page source into sanitized HTML.
///
/// A pipeline holds only its link prefix and may be shared freely between
/// threads; every call works on its own buffers.
///
/// # Example
///
/// ```
/// use mdwiki::Pipeline;
///
/// let exists = |title: &str| title == "Home";
/// let html = Pipeline::new()
///     .render(b"Visit [Home] for info.", &exists)
///     .unwrap();
/// assert_eq!(
///     String::from_utf8(html).unwrap(),
///     "<p>Visit <a href=\"/view/Home\">Home</a> for info.</p>\n"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    renderer: MarkdownRenderer,
}

impl Pipeline {
    /// Create a pipeline with the default `/view/` link prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline from the `[render]` configuration section.
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new().with_link_prefix(config.link_prefix.clone())
    }

    /// Set the path prefix prepended to page titles in link targets.
    #[must_use]
    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.renderer = self.renderer.with_link_prefix(prefix);
        self
    }

    /// Path prefix prepended to page titles in link targets.
    #[must_use]
    pub fn link_prefix(&self) -> &str {
        self.renderer.link_prefix()
    }

    /// Render page source into sanitized HTML bytes.
    ///
    /// # Errors
    ///
    /// Never fails in practice: the output buffer is in memory.
    pub fn render(&self, source: &[u8], oracle: &dyn PageOracle) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::new();
        self.render_to(source, oracle, &mut out)?;
        Ok(out)
    }

    /// Render page source into `out`.
    ///
    /// The sanitized page is written in one piece; nothing is written if
    /// rendering fails.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Write`] if writing to `out` fails.
    pub fn render_to<W: Write>(
        &self,
        source: &[u8],
        oracle: &dyn PageOracle,
        out: &mut W,
    ) -> Result<RenderStats, RenderError> {
        let mut html = Vec::with_capacity(source.len() * 2);
        let stats = self.renderer.render(source, oracle, &mut html)?;
        let clean = sanitize(&html);
        out.write_all(&clean)?;

        tracing::debug!(
            input_len = source.len(),
            output_len = clean.len(),
            links = stats.links,
            missing = stats.missing,
            "Rendered page"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::PageDirectory;

    fn render(source: &str, existing: &[&str]) -> String {
        let pages: HashSet<&str> = existing.iter().copied().collect();
        let oracle = |title: &str| pages.contains(title);
        let html = Pipeline::new().render(source.as_bytes(), &oracle).unwrap();
        String::from_utf8(html).unwrap()
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_existing_page_link() {
        assert_eq!(
            render("Visit [Home] for info.", &["Home"]),
            "<p>Visit <a href=\"/view/Home\">Home</a> for info.</p>\n"
        );
    }

    #[test]
    fn test_missing_page_link() {
        assert_eq!(
            render("See [Nope] page", &[]),
            "<p>See <a href=\"/view/Nope\"><span class=\"has-text-danger\">Nope <sup>(No such page)</sup></span></a> page</p>\n"
        );
    }

    #[test]
    fn test_two_links_in_order() {
        let html = render("Both [Home] and [Gone] here.", &["Home"]);
        assert_eq!(
            html,
            "<p>Both <a href=\"/view/Home\">Home</a> and <a href=\"/view/Gone\"><span class=\"has-text-danger\">Gone <sup>(No such page)</sup></span></a> here.</p>\n"
        );
    }

    #[test]
    fn test_script_and_handlers_removed() {
        let html = render(
            "<script>alert(1)</script>\n\n<p onclick=\"x()\">hi</p>\n\ntext <b onmouseover=\"y()\">bold</b>",
            &[],
        );
        assert!(!html.contains("script"));
        assert!(!html.contains("alert"));
        assert!(!html.contains("onclick"));
        assert!(!html.contains("onmouseover"));
        assert!(html.contains("<b>bold</b>"));
    }

    #[test]
    fn test_code_language_survives() {
        let html = render("```go\nfmt.Println(1)\n```", &[]);
        assert_eq!(
            html,
            "<pre><code class=\"language-go\">fmt.Println(1)\n</code></pre>\n"
        );
    }

    #[test]
    fn test_forged_span_class_stripped() {
        let html = render("<span class=\"has-text-danger;evil\">x</span>", &[]);
        assert_eq!(html, "<p><span>x</span></p>\n");
    }

    #[test]
    fn test_no_carriage_returns_in_output() {
        let html = render("# Title\r\n\r\nline one\r\nline two [Home]\r\n", &["Home"]);
        assert!(!html.contains('\r'));
        assert!(html.starts_with("<h1 id=\"title\">Title</h1>\n"));
    }

    #[test]
    fn test_output_is_sanitize_fixed_point() {
        let html = render(
            "# Page\n\n[Home] [Gone] <em onclick=\"x\">hi</em>\n\n| a |\n|:-:|\n| b |\n\n$x$[^1]\n\n[^1]: note",
            &["Home"],
        );
        assert_eq!(mdwiki_sanitize::sanitize_str(&html), html);
    }

    #[test]
    fn test_custom_prefix_from_config() {
        let config = RenderConfig {
            link_prefix: "/wiki/".to_owned(),
        };
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.link_prefix(), "/wiki/");
        let html = pipeline.render(b"[Home]", &|_: &str| true).unwrap();
        assert_eq!(
            String::from_utf8(html).unwrap(),
            "<p><a href=\"/wiki/Home\">Home</a></p>\n"
        );
    }

    #[test]
    fn test_render_to_reports_stats() {
        let mut out = Vec::new();
        let stats = Pipeline::new()
            .render_to(b"[A] [B] [A]", &|title: &str| title == "A", &mut out)
            .unwrap();
        assert_eq!(stats, RenderStats { links: 3, missing: 1 });
    }

    #[test]
    fn test_write_failure_is_returned() {
        let err = Pipeline::new()
            .render_to(b"text", &|_: &str| true, &mut BrokenSink)
            .unwrap_err();
        assert!(matches!(err, RenderError::Write(_)));
    }

    #[test]
    fn test_pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_concurrent_renders_share_pipeline_and_pages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Home.md"), "# Home").unwrap();
        let pages = PageDirectory::new(dir.path(), ".md");
        let pipeline = Pipeline::new();
        let source = "See [Home], [Gone] and https://example.com/x.\n\n<script>x()</script>";
        let expected = pipeline.render(source.as_bytes(), &pages).unwrap();

        let outputs: Vec<Vec<u8>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| pipeline.render(source.as_bytes(), &pages).unwrap()))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let html = String::from_utf8(expected.clone()).unwrap();
        assert!(html.contains(r#"<a href="/view/Home">Home</a>"#));
        assert!(html.contains(r#"<span class="has-text-danger">Gone"#));
        for output in outputs {
            assert_eq!(output, expected);
        }
    }
}
