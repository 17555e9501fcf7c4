//! Server-rendered HTML.
//!
//! Templates are plain HTML files read from the configured directory on every
//! request, with `{{name}}` placeholders filled in a single pass. Values are
//! escaped by the page builders before they reach a template.

mod pages;

use std::path::PathBuf;

use axum::response::Html;

use crate::errors::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::notice::Notice;

#[derive(Clone, Debug)]
pub struct Views {
    dir: PathBuf,
}

/// Per-request data every page needs.
pub struct PageContext<'a> {
    pub current: &'a CurrentUser,
    pub notice: Option<Notice>,
}

impl Views {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn template(&self, name: &str) -> AppResult<String> {
        let path = self.dir.join(name);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::error!("Failed to read template {}: {}", path.display(), e);
            AppError::Template(e)
        })
    }

    /// Renders `body` inside the shared layout.
    async fn page(
        &self,
        title: &str,
        ctx: &PageContext<'_>,
        body: &str,
        vars: &[(&str, String)],
    ) -> AppResult<Html<String>> {
        let content = fill(&self.template(body).await?, vars);
        let layout = self.template("layout.html").await?;

        let html = fill(
            &layout,
            &[
                ("title", escape(title)),
                ("nav", pages::nav(ctx.current)),
                ("notice", ctx.notice.as_ref().map(pages::notice).unwrap_or_default()),
                ("content", content),
            ],
        );
        Ok(Html(html))
    }
}

/// Replaces `{{name}}` placeholders in one left-to-right pass; substituted
/// text is never scanned again. Unknown placeholders are left as they are.
pub fn fill(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match vars.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
