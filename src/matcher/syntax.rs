//! Text form of patterns, e.g. `div(p("hello"), span)`.
//!
//! ```text
//! patterns := ( pattern ( "," pattern )* )?
//! pattern  := literal | ident ( "(" patterns ")" )?
//! literal  := '"' ( '\' ( '"' | '\' | 'n' | 't' ) | [^"\] )* '"'
//! ```

use thiserror::Error;

use super::pattern::Pattern;

const QUOTE: u8 = 0x0022;
const BACKSLASH: u8 = 0x005C;
const COMMA: u8 = 0x002C;
const OPEN_PAREN: u8 = 0x0028;
const CLOSE_PAREN: u8 = 0x0029;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid pattern at {position}: {message}")]
    InvalidPattern { message: String, position: usize },
}

pub struct PatternParser {
    input: Vec<u8>,
    position: usize,
}

impl PatternParser {
    pub fn new(input: &str) -> PatternParser {
        PatternParser {
            input: input.as_bytes().into(),
            position: 0,
        }
    }

    fn eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn invalid(&self, message: impl Into<String>) -> PatternError {
        PatternError::InvalidPattern {
            message: message.into(),
            position: self.position,
        }
    }

    fn describe_current(&self) -> String {
        match self.current_char() {
            Some(char) => format!("\"{}\"", char as char),
            None => "end of input".to_owned(),
        }
    }

    fn skip_whitespaces(&mut self) {
        while self.current_char().is_some_and(|char| char.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn is_identifier_char(char: u8) -> bool {
        char.is_ascii_alphanumeric() || matches!(char, b'-' | b'_' | b':')
    }

    fn get_identifier(&mut self) -> Result<String, PatternError> {
        let start = self.position;

        while self.current_char().is_some_and(PatternParser::is_identifier_char) {
            self.position += 1;
        }

        if start == self.position {
            return Err(self.invalid(format!(
                "expected a tag name or a quoted literal, found {}",
                self.describe_current()
            )));
        }

        Ok(String::from_utf8_lossy(&self.input[start..self.position]).into_owned())
    }

    fn get_literal(&mut self) -> Result<String, PatternError> {
        let start = self.position;
        self.position += 1;
        let mut content = Vec::<u8>::new();

        loop {
            match self.current_char() {
                None => {
                    return Err(PatternError::InvalidPattern {
                        message: "unterminated literal".to_owned(),
                        position: start,
                    })
                }
                Some(QUOTE) => {
                    self.position += 1;
                    return Ok(String::from_utf8_lossy(&content).into_owned());
                }
                Some(BACKSLASH) => {
                    self.position += 1;
                    let escaped = match self.current_char() {
                        Some(QUOTE) => QUOTE,
                        Some(BACKSLASH) => BACKSLASH,
                        Some(b'n') => b'\n',
                        Some(b't') => b'\t',
                        _ => {
                            return Err(self.invalid(format!(
                                "unknown escape \\{}",
                                self.current_char().map(|char| char as char).unwrap_or(' ')
                            )))
                        }
                    };
                    content.push(escaped);
                    self.position += 1;
                }
                Some(char) => {
                    content.push(char);
                    self.position += 1;
                }
            }
        }
    }

    fn parse_pattern(&mut self) -> Result<Pattern, PatternError> {
        if self.current_char() == Some(QUOTE) {
            return Ok(Pattern::Literal(self.get_literal()?));
        }

        let name = self.get_identifier()?;
        self.skip_whitespaces();

        if self.current_char() != Some(OPEN_PAREN) {
            return Ok(Pattern::tag(&name, []));
        }

        self.position += 1;
        let children = self.parse_sequence()?;

        if self.current_char() != Some(CLOSE_PAREN) {
            return Err(self.invalid(format!(
                "expected \")\" to close {}, found {}",
                name,
                self.describe_current()
            )));
        }
        self.position += 1;

        Ok(Pattern::tag(&name, children))
    }

    /// Comma separated patterns up to a closing paren or the end of input.
    fn parse_sequence(&mut self) -> Result<Vec<Pattern>, PatternError> {
        let mut patterns = Vec::new();
        self.skip_whitespaces();

        if self.eof() || self.current_char() == Some(CLOSE_PAREN) {
            return Ok(patterns);
        }

        loop {
            patterns.push(self.parse_pattern()?);
            self.skip_whitespaces();

            if self.current_char() != Some(COMMA) {
                return Ok(patterns);
            }

            self.position += 1;
            self.skip_whitespaces();
        }
    }

    pub fn parse(&mut self) -> Result<Vec<Pattern>, PatternError> {
        let patterns = self.parse_sequence()?;

        if !self.eof() {
            return Err(self.invalid(format!(
                "expected \",\" or end of input, found {}",
                self.describe_current()
            )));
        }

        Ok(patterns)
    }
}

pub fn parse_patterns(input: &str) -> Result<Vec<Pattern>, PatternError> {
    PatternParser::new(input).parse()
}
