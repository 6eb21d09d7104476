//! Helpers for documentation pages rendered to HTML.
//!
//! A rendered page wraps its body in `<div id="content">`; tests usually only
//! care about what sits inside that element.

use thiserror::Error;
use tracing::debug;

use super::dom::ElementNode;
use super::parser::{self, ParserError};

pub const CONTENT_ID: &str = "content";

const CONTENT_TAG: &str = r#"<div id="content">"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error(transparent)]
    Parse(#[from] ParserError),

    #[error("Expected exactly one element with id \"{id}\", found {found}")]
    SelectionNotUnique { id: String, found: usize },
}

pub fn select_single_by_id<'a>(
    root: &'a ElementNode,
    id: &str,
) -> Result<&'a ElementNode, PageError> {
    let matches = root.elements_by_id(id);

    match matches.as_slice() {
        [single] => Ok(*single),
        _ => Err(PageError::SelectionNotUnique {
            id: id.to_owned(),
            found: matches.len(),
        }),
    }
}

/// Parses a rendered page and returns its `#content` element.
pub fn rendered_content(html: &str) -> Result<ElementNode, PageError> {
    let root = parser::parse(html)?;
    let content = select_single_by_id(&root, CONTENT_ID)?;

    debug!(children = content.children.len(), "selected #{}", CONTENT_ID);

    Ok(content.clone())
}

/// Every line from the one opening `<div id="content">` onwards, trimmed and
/// joined without separators.
pub fn lines_after_content_tag(html: &str) -> String {
    html.lines()
        .skip_while(|line| !line.contains(CONTENT_TAG))
        .map(str::trim)
        .collect()
}
