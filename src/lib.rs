//! # domshape
//!
//! Parses rendered HTML into a small node tree and checks its shape against
//! expected patterns of tags and text.
//!
//! - [`html`]: node tree, parser and helpers for rendered pages.
//! - [`matcher`]: patterns and the trailing-children matcher.

pub mod html;
pub mod matcher;
