// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Text serializations of a [`Dendrogram`]. Pure formatting; no clustering logic.

use crate::dendrogram::Dendrogram;
use mcda_core::McdaError;
use std::fmt::Write;

fn check_labels<S: AsRef<str>>(tree: &Dendrogram, labels: &[S]) -> Result<(), McdaError> {
    if labels.len() != tree.leaf_count() {
        return Err(McdaError::invalid_input(format!(
            "expected {} leaf label(s); got {}",
            tree.leaf_count(),
            labels.len()
        )));
    }
    Ok(())
}

/// Box-drawing rendering, one node per line.
///
/// Internal nodes print as `+ [height]` with two decimals; leaves print their
/// label. The left child is listed first.
pub fn render_ascii<S: AsRef<str>>(tree: &Dendrogram, labels: &[S]) -> Result<String, McdaError> {
    check_labels(tree, labels)?;

    let mut lines = Vec::with_capacity(tree.node_count());
    let mut stack = vec![(tree.root(), String::new(), true)];
    while let Some((node, prefix, is_last)) = stack.pop() {
        let branch = if is_last { "└─" } else { "├─" };
        match tree.children(node) {
            None => lines.push(format!("{prefix}{branch}{}", labels[node].as_ref())),
            Some((left, right)) => {
                lines.push(format!("{prefix}{branch}+ [{:.2}]", tree.height(node)));
                let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
                stack.push((right, child_prefix.clone(), true));
                stack.push((left, child_prefix, false));
            }
        }
    }

    Ok(lines.join("\n"))
}

fn newick_label(raw: &str) -> String {
    let needs_quotes = raw.is_empty()
        || raw
            .chars()
            .any(|c| c.is_whitespace() || "()[]':;,".contains(c));
    if needs_quotes {
        format!("'{}'", raw.replace('\'', "''"))
    } else {
        raw.to_string()
    }
}

enum NewickFrame {
    Enter { node: usize, parent_height: f64 },
    Comma,
    Exit { node: usize, parent_height: f64 },
}

/// Newick rendering with branch lengths `parent_height - child_height`.
pub fn render_newick<S: AsRef<str>>(tree: &Dendrogram, labels: &[S]) -> Result<String, McdaError> {
    check_labels(tree, labels)?;

    let root = tree.root();
    let mut out = String::new();
    let mut stack = vec![NewickFrame::Enter {
        node: root,
        parent_height: tree.height(root),
    }];
    while let Some(frame) = stack.pop() {
        match frame {
            NewickFrame::Enter {
                node,
                parent_height,
            } => match tree.children(node) {
                None => {
                    out.push_str(&newick_label(labels[node].as_ref()));
                    if node != root {
                        let _ = write!(out, ":{}", parent_height - tree.height(node));
                    }
                }
                Some((left, right)) => {
                    out.push('(');
                    let height = tree.height(node);
                    stack.push(NewickFrame::Exit {
                        node,
                        parent_height,
                    });
                    stack.push(NewickFrame::Enter {
                        node: right,
                        parent_height: height,
                    });
                    stack.push(NewickFrame::Comma);
                    stack.push(NewickFrame::Enter {
                        node: left,
                        parent_height: height,
                    });
                }
            },
            NewickFrame::Comma => out.push(','),
            NewickFrame::Exit {
                node,
                parent_height,
            } => {
                out.push(')');
                if node != root {
                    let _ = write!(out, ":{}", parent_height - tree.height(node));
                }
            }
        }
    }
    out.push(';');
    Ok(out)
}
