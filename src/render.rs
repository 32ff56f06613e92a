//! Document rendering seam.
//!
//! Turning a document body into HTML is delegated to a [`DocRenderer`]. The
//! built-in [`PlainRenderer`] escapes text, splits paragraphs and resolves
//! `[[target]]` links against the snapshot being served.

use crate::tree::node::{join_url, NodeLookup};
use crate::tree::path::normalize_url;
use std::fmt;

/// API prefix under which node URLs are reachable.
pub const API_TREE_PREFIX: &str = "/api/v1/tree";

/// Context for rewriting links inside one document.
pub struct LinkContext<'a> {
    pub prefix: &'a str,
    pub node_url: &'a str,
    pub lookup: &'a dyn NodeLookup,
}

impl<'a> LinkContext<'a> {
    /// Resolve a link target to a node URL. Targets starting with `/` are
    /// root-relative; others are tried relative to the node first.
    pub fn resolve(&self, target: &str) -> Option<String> {
        let candidates = if target.starts_with('/') {
            vec![normalize_url(target)]
        } else {
            vec![
                normalize_url(&join_url(self.node_url, target)),
                normalize_url(target),
            ]
        };
        candidates
            .into_iter()
            .find(|url| self.lookup.lookup(url).is_some())
    }

    pub fn href(&self, url: &str) -> String {
        join_url(self.prefix, url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError(pub String);

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RenderError {}

pub trait DocRenderer: Send + Sync {
    fn render(&self, raw: &[u8], ctx: &LinkContext<'_>) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl DocRenderer for PlainRenderer {
    fn render(&self, raw: &[u8], ctx: &LinkContext<'_>) -> Result<String, RenderError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| RenderError(format!("document is not valid UTF-8: {}", e)))?;
        let text = text.replace("\r\n", "\n");

        let mut html = String::new();
        for block in text.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }
            html.push_str("<p>");
            html.push_str(&render_inline(block, ctx));
            html.push_str("</p>\n");
        }
        Ok(html)
    }
}

fn render_inline(block: &str, ctx: &LinkContext<'_>) -> String {
    let mut out = String::new();
    let mut rest = block;
    while let Some(start) = rest.find("[[") {
        let Some(len) = rest[start + 2..].find("]]") else {
            break;
        };
        out.push_str(&escape(&rest[..start]));
        let inner = &rest[start + 2..start + 2 + len];
        let (target, label) = match inner.split_once('|') {
            Some((t, l)) => (t.trim(), l.trim()),
            None => (inner.trim(), inner.trim()),
        };
        match ctx.resolve(target) {
            Some(url) => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape(&ctx.href(&url)),
                    escape(label)
                ));
            }
            None => out.push_str(&escape(label)),
        }
        rest = &rest[start + 2 + len + 2..];
    }
    out.push_str(&escape(rest));
    out.replace('\n', "<br>\n")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
