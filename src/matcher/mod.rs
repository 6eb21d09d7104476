//! Structural matching of an element's trailing children against patterns.
//!
//! Whitespace-only text children are dropped first. The remaining children
//! are aligned with the patterns from the end: with three patterns, only the
//! last three significant children are checked and anything before them is
//! ignored. Each `Tag` pattern with children recurses into the matched element.
//!
//! Literals compare after trimming both ends only; inner whitespace must match
//! exactly, so `"a  b"` does not match the text `a b`.
//!
//! ```ignore
//! use domshape::matcher::{assert_match, div, p, Pattern};
//!
//! assert_match(&content, &[div([p([Pattern::literal("hello")])])]);
//! ```

pub mod pattern;
pub mod syntax;

use thiserror::Error;
use tracing::trace;

use crate::html::dom::{ElementNode, Node};

pub use pattern::{div, p, span, Pattern};
pub use syntax::{parse_patterns, PatternError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("{expected} significant children expected in <{tag_name}> but found {found}")]
    StructureMismatch {
        tag_name: String,
        expected: usize,
        found: usize,
    },

    #[error("Tag {expected} expected but found: {found}")]
    TagMismatch { expected: String, found: String },

    #[error("\"{expected}\" expected but found: {found}")]
    TextMismatch { expected: String, found: String },
}

/// Checks the trailing significant children of `node` against `patterns`,
/// stopping at the first mismatch.
pub fn match_children(node: &ElementNode, patterns: &[Pattern]) -> Result<(), MatchError> {
    if patterns.is_empty() {
        return Ok(());
    }

    let significant: Vec<&Node> = node.significant_children().collect();

    if significant.len() < patterns.len() {
        return Err(MatchError::StructureMismatch {
            tag_name: node.tag_name.clone(),
            expected: patterns.len(),
            found: significant.len(),
        });
    }

    let trailing = &significant[significant.len() - patterns.len()..];
    trace!(
        tag = %node.tag_name,
        skipped = significant.len() - patterns.len(),
        patterns = patterns.len(),
        "matching trailing children"
    );

    trailing
        .iter()
        .zip(patterns)
        .try_for_each(|(child, pattern)| match_node(child, pattern))
}

fn match_node(node: &Node, pattern: &Pattern) -> Result<(), MatchError> {
    match (pattern, node) {
        (Pattern::Literal(expected), Node::Text(text))
            if text.content.trim() == expected.trim() =>
        {
            Ok(())
        }
        (Pattern::Literal(expected), _) => Err(MatchError::TextMismatch {
            expected: expected.clone(),
            found: node.to_string(),
        }),
        (Pattern::Tag { name, children }, Node::Element(element)) if element.tag_name == *name => {
            match_children(element, children)
        }
        (Pattern::Tag { name, .. }, _) => Err(MatchError::TagMismatch {
            expected: name.clone(),
            found: node.to_string(),
        }),
    }
}

/// Panicking form of [`match_children`] for use in tests.
#[track_caller]
pub fn assert_match(node: &ElementNode, patterns: &[Pattern]) {
    if let Err(error) = match_children(node, patterns) {
        panic!("{}", error);
    }
}
