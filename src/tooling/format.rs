//! Human-readable status output.

use crate::tree::NodeTree;
use crate::types::hash_hex;
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Node count below one top-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownRow {
    pub url: String,
    pub title: String,
    pub nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeStatus {
    pub root: String,
    pub root_hash: String,
    pub total_nodes: usize,
    pub authors: usize,
    pub built_at: DateTime<Utc>,
    pub breakdown: Vec<BreakdownRow>,
}

impl TreeStatus {
    pub fn new(tree: &NodeTree) -> Self {
        let breakdown = tree
            .root()
            .children(tree)
            .into_iter()
            .map(|child| {
                let prefix = format!("{}/", child.url());
                BreakdownRow {
                    url: child.url().to_string(),
                    title: child.title().to_string(),
                    nodes: tree
                        .walk()
                        .filter(|n| n.url() == child.url() || n.url().starts_with(&prefix))
                        .count(),
                }
            })
            .collect();
        Self {
            root: tree.path().display().to_string(),
            root_hash: hash_hex(tree.hash()),
            total_nodes: tree.total_nodes(),
            authors: tree.authors().len(),
            built_at: tree.built_at(),
            breakdown,
        }
    }
}

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_tree_status_text(status: &TreeStatus, include_breakdown: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Tree Status")));
    out.push_str(&format!("  Root: {}\n", status.root));
    out.push_str(&format!(
        "  Root hash: {}...\n",
        &status.root_hash[..status.root_hash.len().min(12)]
    ));
    out.push_str(&format!("  Total nodes: {}\n", status.total_nodes));
    out.push_str(&format!("  Authors: {}\n", status.authors));
    out.push_str(&format!("  Built: {}\n", status.built_at.to_rfc3339()));

    if include_breakdown && !status.breakdown.is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Top-level breakdown")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["URL", "Title", "Nodes"]);
        for row in &status.breakdown {
            table.add_row(vec![row.url.clone(), row.title.clone(), row.nodes.to_string()]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out
}
