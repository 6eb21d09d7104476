//! Byte-level HTML parser producing an [`ElementNode`] tree.
//!
//! A `<` starts markup only when followed by a letter, `/` or `!`; any other
//! `<` is kept as text. Nesting deeper than [`MAX_DEPTH`] is rejected.

use thiserror::Error;
use tracing::{debug, trace};

use super::dom::{ElementAttributes, ElementChildren, ElementNode, Node, TextNode};

const GREATER_THAN: u8 = 0x003E;
const LESS_THAN: u8 = 0x003C;
const SLASH: u8 = 0x002F;
const QUOTE: u8 = 0x0022;
const APOSTROPHE: u8 = 0x0027;
const EQUALS: u8 = 0x003D;
const BANG: u8 = 0x0021;
const AMPERSAND: char = '&';

const COMMENT_START: &[u8] = b"<!--";
const COMMENT_END: &[u8] = b"-->";

/// Deepest element nesting accepted by [`Parser::parse`].
pub const MAX_DEPTH: usize = 256;

/// Elements whose content is raw text up to the matching closing tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("Expected \"{expected}\", found \"{found}\" at {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("Premature end of file at {position}")]
    PrematureEndOfFile { position: usize },

    #[error("Invalid identifier \"{identifier}\" at {position}")]
    InvalidIdentifier { identifier: String, position: usize },

    #[error("Invalid attribute value \"{value}\" at {position}")]
    InvalidAttributeValue { value: String, position: usize },

    #[error("Elements nested deeper than {limit} at {position}")]
    NestingTooDeep { limit: usize, position: usize },

    #[error("Expected \"</{expected}>\", found \"</{found}>\" at {position}")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        position: usize,
    },
}

pub struct Parser {
    input: Vec<u8>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(input: &str) -> Parser {
        Parser {
            input: input.as_bytes().into(),
            position: 0,
            depth: 0,
        }
    }

    fn eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> Result<u8, ParserError> {
        self.input
            .get(self.position)
            .copied()
            .ok_or(ParserError::PrematureEndOfFile {
                position: self.position,
            })
    }

    fn next_char(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.input[self.position.min(self.input.len())..].starts_with(prefix)
    }

    fn starts_with_ignore_case(&self, prefix: &[u8]) -> bool {
        let rest = &self.input[self.position.min(self.input.len())..];
        rest.len() >= prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        match self.input.get(self.position) {
            Some(&found) => ParserError::UnexpectedToken {
                expected: expected.to_owned(),
                found: (found as char).to_string(),
                position: self.position,
            },
            None => ParserError::PrematureEndOfFile {
                position: self.position,
            },
        }
    }

    fn expect_char(&mut self, expected: u8) -> Result<(), ParserError> {
        if self.current_char()? != expected {
            return Err(self.unexpected(&(expected as char).to_string()));
        }

        self.position += 1;
        Ok(())
    }

    fn skip_whitespaces(&mut self) {
        while !self.eof() && self.input[self.position].is_ascii_whitespace() {
            self.position += 1;
        }
    }

    fn is_identifier_char(char: u8) -> bool {
        char.is_ascii_alphanumeric() || matches!(char, b'-' | b'_' | b':')
    }

    fn get_identifier(&mut self) -> Result<String, ParserError> {
        let start = self.position;

        while !self.eof() && Parser::is_identifier_char(self.input[self.position]) {
            self.position += 1;
        }

        if start == self.position {
            if self.eof() {
                return Err(ParserError::PrematureEndOfFile {
                    position: self.position,
                });
            }

            let end = (self.position + 1).min(self.input.len());
            return Err(ParserError::InvalidIdentifier {
                identifier: self.slice(start, end),
                position: start,
            });
        }

        Ok(self.slice(start, self.position).to_ascii_lowercase())
    }

    /// Skips `<!-- ... -->` or any other `<! ... >` declaration such as a doctype.
    fn skip_markup_declaration(&mut self) -> Result<(), ParserError> {
        let start = self.position;
        let terminator: &[u8] = if self.starts_with(COMMENT_START) {
            self.position += COMMENT_START.len();
            COMMENT_END
        } else {
            self.position += 2;
            b">"
        };

        while !self.eof() {
            if self.starts_with(terminator) {
                self.position += terminator.len();
                trace!(start, end = self.position, "skipped markup declaration");
                return Ok(());
            }
            self.position += 1;
        }

        Err(ParserError::PrematureEndOfFile {
            position: self.position,
        })
    }

    fn at_markup(&self) -> bool {
        !self.eof()
            && self.input[self.position] == LESS_THAN
            && self
                .next_char()
                .is_some_and(|char| char.is_ascii_alphabetic() || char == SLASH || char == BANG)
    }

    fn at_markup_declaration(&self) -> bool {
        !self.eof() && self.input[self.position] == LESS_THAN && self.next_char() == Some(BANG)
    }

    fn skip_insignificant_prolog(&mut self) -> Result<(), ParserError> {
        loop {
            self.skip_whitespaces();

            if !self.at_markup_declaration() {
                return Ok(());
            }

            self.skip_markup_declaration()?;
        }
    }

    fn get_attribute_value(&mut self) -> Result<String, ParserError> {
        let start = self.position;
        let delimiter = self.current_char()?;

        if delimiter == QUOTE || delimiter == APOSTROPHE {
            self.position += 1;
            let value_start = self.position;

            while !self.eof() && self.input[self.position] != delimiter {
                self.position += 1;
            }

            if self.eof() {
                return Err(ParserError::PrematureEndOfFile {
                    position: self.position,
                });
            }

            let value = self.slice(value_start, self.position);
            self.position += 1;

            return Ok(decode_entities(&value));
        }

        while !self.eof() {
            let char = self.input[self.position];
            if char.is_ascii_whitespace() || char == GREATER_THAN {
                break;
            }
            if matches!(char, QUOTE | APOSTROPHE | LESS_THAN | EQUALS) {
                return Err(ParserError::InvalidAttributeValue {
                    value: self.slice(start, self.position + 1),
                    position: start,
                });
            }
            self.position += 1;
        }

        if start == self.position {
            return Err(self.unexpected("attribute value"));
        }

        Ok(decode_entities(&self.slice(start, self.position)))
    }

    fn parse_attributes(&mut self) -> Result<ElementAttributes, ParserError> {
        let mut parsed_attributes = ElementAttributes::new();

        loop {
            self.skip_whitespaces();

            match self.current_char()? {
                GREATER_THAN | SLASH => return Ok(parsed_attributes),
                _ => {}
            }

            let key = self.get_identifier()?;
            self.skip_whitespaces();

            let value = if !self.eof() && self.input[self.position] == EQUALS {
                self.position += 1;
                self.skip_whitespaces();
                self.get_attribute_value()?
            } else {
                String::new()
            };

            parsed_attributes.entry(key).or_insert(value);
        }
    }

    /// Reads `<name attrs...>` or `<name attrs.../>`. Returns whether the tag closed itself.
    fn get_tag_data(&mut self) -> Result<(String, ElementAttributes, bool), ParserError> {
        self.expect_char(LESS_THAN)?;

        let tag_name = self.get_identifier()?;
        let attributes = self.parse_attributes()?;

        let self_closing = self.current_char()? == SLASH;
        if self_closing {
            self.position += 1;
        }

        self.expect_char(GREATER_THAN)?;

        Ok((tag_name, attributes, self_closing))
    }

    fn get_closing_tag(&mut self) -> Result<String, ParserError> {
        self.position += 2;
        let tag_name = self.get_identifier()?;
        self.skip_whitespaces();
        self.expect_char(GREATER_THAN)?;

        Ok(tag_name)
    }

    fn get_text_content(&mut self) -> String {
        let start = self.position;

        while !self.eof() && !self.at_markup() {
            self.position += 1;
        }

        decode_entities(&self.slice(start, self.position))
    }

    fn get_raw_text(&mut self, tag_name: &str) -> Result<Vec<Node>, ParserError> {
        let closing = format!("</{}", tag_name);
        let start = self.position;

        while !self.eof() {
            let terminated = self
                .input
                .get(self.position + closing.len())
                .is_some_and(|&char| {
                    char.is_ascii_whitespace() || char == SLASH || char == GREATER_THAN
                });

            if terminated && self.starts_with_ignore_case(closing.as_bytes()) {
                let content = self.slice(start, self.position);
                self.get_closing_tag()?;

                if content.is_empty() {
                    return Ok(Vec::new());
                }

                return Ok(vec![Node::Text(TextNode { content })]);
            }
            self.position += 1;
        }

        Err(ParserError::PrematureEndOfFile {
            position: self.position,
        })
    }

    fn parse_element(&mut self) -> Result<ElementNode, ParserError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParserError::NestingTooDeep {
                limit: MAX_DEPTH,
                position: self.position,
            });
        }

        let (tag_name, attributes, self_closing) = self.get_tag_data()?;

        let mut node = ElementNode {
            tag_name,
            attributes,
            children: ElementChildren::new(),
        };

        if self_closing || node.is_void() {
            return Ok(node);
        }

        self.depth += 1;
        let children = if RAW_TEXT_ELEMENTS.contains(&node.tag_name.as_str()) {
            self.get_raw_text(&node.tag_name)
        } else {
            self.get_element_content(&node)
        };
        self.depth -= 1;

        node.children = children?;
        Ok(node)
    }

    fn get_element_content(&mut self, root: &ElementNode) -> Result<Vec<Node>, ParserError> {
        let mut nodes = Vec::<Node>::new();

        while !self.eof() {
            if !self.at_markup() {
                nodes.push(Node::Text(TextNode {
                    content: self.get_text_content(),
                }));
                continue;
            }

            match self.next_char() {
                Some(SLASH) => {
                    let position = self.position;
                    let tag_name = self.get_closing_tag()?;

                    if tag_name != root.tag_name {
                        return Err(ParserError::MismatchedClosingTag {
                            expected: root.tag_name.clone(),
                            found: tag_name,
                            position,
                        });
                    }

                    return Ok(nodes);
                }
                Some(BANG) => self.skip_markup_declaration()?,
                _ => nodes.push(Node::Element(self.parse_element()?)),
            }
        }

        Err(ParserError::PrematureEndOfFile {
            position: self.position,
        })
    }

    pub fn parse(&mut self) -> Result<ElementNode, ParserError> {
        self.skip_insignificant_prolog()?;

        if self.current_char()? != LESS_THAN {
            return Err(self.unexpected("<"));
        }

        let root_node = self.parse_element()?;

        self.skip_insignificant_prolog()?;
        if !self.eof() {
            return Err(self.unexpected("end of input"));
        }

        debug!(
            tag = %root_node.tag_name,
            elements = root_node.descendants().len() + 1,
            "parsed html document"
        );

        Ok(root_node)
    }
}

/// Shorthand for `Parser::new(input).parse()`.
pub fn parse(input: &str) -> Result<ElementNode, ParserError> {
    Parser::new(input).parse()
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Decodes character references; anything unrecognised is kept as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains(AMPERSAND) {
        return text.to_owned();
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(AMPERSAND) {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded_char = rest
            .find(';')
            .filter(|&end| end > 1 && end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|char| (char, end)));

        match decoded_char {
            Some((char, end)) => {
                decoded.push(char);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push(AMPERSAND);
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(children: &[Node]) -> Vec<String> {
        children
            .iter()
            .map(|child| match child {
                Node::Element(element) => element.tag_name.clone(),
                Node::Text(text) => format!("#{:?}", text.content),
            })
            .collect()
    }

    #[test]
    fn parses_nested_elements_and_keeps_whitespace() {
        let root = parse("<div>\n  <p>hello</p>\n</div>").unwrap();

        assert_eq!(root.tag_name, "div");
        assert_eq!(tags(&root.children), vec!["#\"\\n  \"", "p", "#\"\\n\""]);
        assert_eq!(root.children[1].as_element().unwrap().text(), "hello");
    }

    #[test]
    fn parses_attribute_forms() {
        let root = parse(r#"<input id="a b" class='x' data-n=3 disabled>"#).unwrap();

        assert_eq!(root.attributes.get("id").unwrap(), "a b");
        assert_eq!(root.attributes.get("class").unwrap(), "x");
        assert_eq!(root.attributes.get("data-n").unwrap(), "3");
        assert_eq!(root.attributes.get("disabled").unwrap(), "");
        assert!(root.children.is_empty());
    }

    #[test]
    fn first_duplicate_attribute_wins() {
        let root = parse(r#"<a id="one" id="two"></a>"#).unwrap();

        assert_eq!(root.id(), Some("one"));
    }

    #[test]
    fn skips_doctype_and_comments() {
        let root = parse("<!DOCTYPE html>\n<!-- top --><html><!-- inner --><body></body></html>\n")
            .unwrap();

        assert_eq!(root.tag_name, "html");
        assert_eq!(tags(&root.children), vec!["body"]);
    }

    #[test]
    fn void_and_self_closing_elements_have_no_children() {
        let root = parse("<p>a<br>b<img src=x.png/><span/>c</p>").unwrap();

        assert_eq!(tags(&root.children), vec!["#\"a\"", "br", "#\"b\"", "img", "span", "#\"c\""]);
    }

    #[test]
    fn script_content_is_raw() {
        let root = parse("<head><script>if (a < b) { x = \"</p>\"; }</script></head>").unwrap();
        let script = root.children[0].as_element().unwrap();

        assert_eq!(script.text(), "if (a < b) { x = \"</p>\"; }");
    }

    #[test]
    fn script_content_ignores_longer_closing_names() {
        let root = parse("<div><script>var s = '</scripts>';</script ></div>").unwrap();
        let script = root.children[0].as_element().unwrap();

        assert_eq!(script.text(), "var s = '</scripts>';");
    }

    #[test]
    fn stray_less_than_is_text() {
        let root = parse("<p>1 < 2 <= 3 <</p>").unwrap();

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.text(), "1 < 2 <= 3 <");
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let depth = MAX_DEPTH + 1;
        let input = "<div>".repeat(depth) + &"</div>".repeat(depth);

        assert!(matches!(
            parse(&input),
            Err(ParserError::NestingTooDeep {
                limit: MAX_DEPTH,
                ..
            })
        ));
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let input = "<div>".repeat(MAX_DEPTH) + &"</div>".repeat(MAX_DEPTH);

        assert_eq!(parse(&input).unwrap().descendants().len(), MAX_DEPTH - 1);
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let root = parse("<DIV><P>x</p></Div>").unwrap();

        assert_eq!(root.tag_name, "div");
        assert_eq!(tags(&root.children), vec!["p"]);
    }

    #[test]
    fn decodes_entities_in_text() {
        let root = parse("<p>a &amp; b &lt;c&gt; &#65;&#x42; &bogus; &</p>").unwrap();

        assert_eq!(root.text(), "a & b <c> AB &bogus; &");
    }

    #[test]
    fn reports_mismatched_closing_tag() {
        let error = parse("<div><p>x</span></div>").unwrap_err();

        assert_eq!(
            error,
            ParserError::MismatchedClosingTag {
                expected: "p".to_owned(),
                found: "span".to_owned(),
                position: 9,
            }
        );
    }

    #[test]
    fn reports_premature_end_of_file() {
        assert!(matches!(
            parse("<div><p>x</p>"),
            Err(ParserError::PrematureEndOfFile { .. })
        ));
        assert!(matches!(
            parse("<div class=\"x"),
            Err(ParserError::PrematureEndOfFile { .. })
        ));
        assert!(matches!(parse(""), Err(ParserError::PrematureEndOfFile { .. })));
    }

    #[test]
    fn reports_invalid_identifier() {
        assert!(matches!(
            parse("<div></ div>"),
            Err(ParserError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn reports_invalid_attribute_value() {
        assert!(matches!(
            parse("<div a=b\"c></div>"),
            Err(ParserError::InvalidAttributeValue { .. })
        ));
    }

    #[test]
    fn rejects_text_before_root_and_trailing_content() {
        assert_eq!(
            parse("hello"),
            Err(ParserError::UnexpectedToken {
                expected: "<".to_owned(),
                found: "h".to_owned(),
                position: 0,
            })
        );
        assert!(matches!(
            parse("<a></a><b></b>"),
            Err(ParserError::UnexpectedToken { .. })
        ));
    }
}
