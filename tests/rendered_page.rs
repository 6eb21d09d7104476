//! Matching against the `#content` element of a full rendered page.

use domshape::html::page::{lines_after_content_tag, rendered_content, PageError};
use domshape::html::parser::ParserError;
use domshape::matcher::{assert_match, div, match_children, p, span, MatchError, Pattern};

const TEST_PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>testPage</title>
    <link href="styles/style.css" rel="Stylesheet">
    <script type="text/javascript">var pathToRoot = "../";</script>
</head>
<body>
<div id="container">
    <div id="leftColumn"><div id="sideMenu"></div></div>
    <div id="main">
        <div id="content">
            <div class="cover">
                <h1 class="cover"><span>Test</span> page</h1>
            </div>
            <div class="table">
                <div class="table-row">
                    <div class="main-subrow">
                        <span><a href="#">first</a></span>
                        <span>&lt;T&gt; item</span>
                    </div>
                </div>
                <div class="table-row">
                    <p>Plain &amp; simple</p>
                </div>
            </div>
            <!-- footer is rendered separately -->
        </div>
    </div>
</div>
</body>
</html>
"##;

#[test]
fn content_is_selected_from_the_page() {
    let content = rendered_content(TEST_PAGE).unwrap();

    assert_eq!(content.id(), Some("content"));
    assert_eq!(content.significant_children().count(), 2);
}

#[test]
fn table_rows_match_nested_patterns() {
    let content = rendered_content(TEST_PAGE).unwrap();

    assert_match(
        &content,
        &[div([
            div([div([
                span([Pattern::tag("a", ["first".into()])]),
                span(["<T> item".into()]),
            ])]),
            div([p(["Plain & simple".into()])]),
        ])],
    );
}

#[test]
fn cover_heading_mixes_elements_and_text() {
    let content = rendered_content(TEST_PAGE).unwrap();

    assert_match(
        &content,
        &[
            div([Pattern::tag("h1", [span(["Test".into()]), "page".into()])]),
            Pattern::tag("div", []),
        ],
    );
}

#[test]
fn mismatch_reports_rendered_node() {
    let content = rendered_content(TEST_PAGE).unwrap();
    let error =
        match_children(&content, &[div([div([p(["Plain and simple".into()])])])]).unwrap_err();

    assert_eq!(
        error,
        MatchError::TextMismatch {
            expected: "Plain and simple".to_owned(),
            found: "Plain &amp; simple".to_owned(),
        }
    );
}

#[test]
fn page_without_content_is_rejected() {
    let error =
        rendered_content(r#"<html><body><div id="main"></div></body></html>"#).unwrap_err();

    assert_eq!(
        error,
        PageError::SelectionNotUnique {
            id: "content".to_owned(),
            found: 0,
        }
    );
}

#[test]
fn malformed_page_is_a_parse_error() {
    assert!(matches!(
        rendered_content("<html><body><div id=\"content\"></body></html>"),
        Err(PageError::Parse(ParserError::MismatchedClosingTag { .. }))
    ));
}

#[test]
fn lines_after_content_tag_are_flattened() {
    let lines = lines_after_content_tag(TEST_PAGE);

    assert!(lines.starts_with(r#"<div id="content"><div class="cover"><h1 class="cover">"#));
    assert!(lines.ends_with("</div></body></html>"));
    assert!(!lines.contains('\n'));
}
