use std::fmt;

/// Expected shape of one significant child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// A text node whose trimmed content equals this, also trimmed.
    Literal(String),
    /// An element with this tag name. Non-empty `children` are matched
    /// against the element's own trailing children.
    Tag { name: String, children: Vec<Pattern> },
}

impl Pattern {
    pub fn literal(text: &str) -> Pattern {
        Pattern::Literal(text.to_owned())
    }

    pub fn tag<I>(name: &str, children: I) -> Pattern
    where
        I: IntoIterator<Item = Pattern>,
    {
        Pattern::Tag {
            name: name.to_ascii_lowercase(),
            children: children.into_iter().collect(),
        }
    }
}

pub fn div<I: IntoIterator<Item = Pattern>>(children: I) -> Pattern {
    Pattern::tag("div", children)
}

pub fn p<I: IntoIterator<Item = Pattern>>(children: I) -> Pattern {
    Pattern::tag("p", children)
}

pub fn span<I: IntoIterator<Item = Pattern>>(children: I) -> Pattern {
    Pattern::tag("span", children)
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Pattern {
        Pattern::literal(text)
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Pattern {
        Pattern::Literal(text)
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;

    for char in text.chars() {
        match char {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            _ => write!(f, "{}", char)?,
        }
    }

    f.write_str("\"")
}

/// Writes `patterns` comma separated, in the same syntax `parse_patterns` reads.
fn write_patterns(f: &mut fmt::Formatter<'_>, patterns: &[Pattern]) -> fmt::Result {
    for (index, pattern) in patterns.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", pattern)?;
    }

    Ok(())
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => write_literal(f, text),
            Pattern::Tag { name, children } if children.is_empty() => f.write_str(name),
            Pattern::Tag { name, children } => {
                write!(f, "{}(", name)?;
                write_patterns(f, children)?;
                f.write_str(")")
            }
        }
    }
}
