//! Literal-syntax rendering for tags.
//!
//! Every tag renders to text that parses back to an equal tag. Name segments
//! that would read as something else are wrapped in `|...|`.

use std::fmt;

use super::parsing::{is_delimiter, looks_numeric};
use super::{Name, Tag};

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write_segment(f, ns)?;
            write!(f, "/")?;
        }
        write_segment(f, &self.name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Nil => write!(f, "nil"),
            Tag::Bool(b) => write!(f, "{}", b),
            Tag::Int(n) => write!(f, "{}", n),
            Tag::Str(s) => write_escaped(f, s),
            Tag::Keyword(name) => write!(f, ":{}", name),
            // A bare symbol spelled like a literal would read back as that literal
            Tag::Symbol(name)
                if name.namespace.is_none() && matches!(name.name(), "nil" | "true" | "false") =>
            {
                write_quoted(f, name.name())
            }
            Tag::Symbol(name) => write!(f, "{}", name),
            Tag::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            _ => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

fn is_plain_segment(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(':')
        && !looks_numeric(s)
        && !s.chars().any(|c| is_delimiter(c) || matches!(c, '|' | '/'))
}

fn write_segment(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if is_plain_segment(s) {
        write!(f, "{}", s)
    } else {
        write_quoted(f, s)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "|")?;
    for c in s.chars() {
        match c {
            '|' => write!(f, "\\|")?,
            '\\' => write!(f, "\\\\")?,
            _ => write!(f, "{}", c)?,
        }
    }
    write!(f, "|")
}
