//! Tag literal parsing.
//!
//! Names that are not plain identifiers are written with `|...|` quoted
//! segments, where `\|` and `\\` are the only escapes. A slash outside the
//! quotes separates namespace from name; `|a/b|` is a single segment.

use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use super::{Name, Tag};
use crate::error::DispatchError;

impl FromStr for Tag {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TagParser::new(s);
        let tag = parser.parse_tag()?;
        parser.skip_separators();
        if let Some(&(pos, _)) = parser.chars.peek() {
            return Err(parser.error(format!("unexpected trailing input at offset {}", pos)));
        }
        Ok(tag)
    }
}

struct TagParser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

/// A keyword or symbol token after quoted segments are decoded.
struct NameToken {
    text: String,
    /// Byte offset in `text` of the first slash outside any quoted segment.
    slash: Option<usize>,
    quoted: bool,
}

impl NameToken {
    /// A quoted token always names something; the unquoted slash, if any,
    /// splits it even when one side is empty.
    fn into_name(self) -> Name {
        match self.slash {
            Some(at) => Name::namespaced(&self.text[..at], &self.text[at + 1..]),
            None => Name::new(self.text),
        }
    }
}

pub(super) fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '[' | ']' | '"')
}

impl<'a> TagParser<'a> {
    fn new(input: &'a str) -> Self {
        TagParser {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> DispatchError {
        DispatchError::TagSyntax {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_separators(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || c == ',' {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn parse_tag(&mut self) -> Result<Tag, DispatchError> {
        self.skip_separators();
        match self.chars.peek().copied() {
            None => Err(self.error("expected a tag")),
            Some((_, '[')) => {
                self.chars.next();
                self.parse_vector()
            }
            Some((_, ']')) => Err(self.error("unmatched ']'")),
            Some((_, '"')) => {
                self.chars.next();
                self.parse_string()
            }
            Some((_, ':')) => {
                self.chars.next();
                let token = self.read_name()?;
                if token.quoted {
                    return Ok(Tag::Keyword(token.into_name()));
                }
                if token.text.is_empty() {
                    return Err(self.error("empty keyword"));
                }
                Ok(Tag::Keyword(split_name(&token.text)))
            }
            Some(_) => {
                let token = self.read_name()?;
                if token.quoted {
                    return Ok(Tag::Symbol(token.into_name()));
                }
                self.atom(&token.text)
            }
        }
    }

    fn parse_vector(&mut self) -> Result<Tag, DispatchError> {
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            match self.chars.peek() {
                None => return Err(self.error("unterminated vector")),
                Some(&(_, ']')) => {
                    self.chars.next();
                    return Ok(Tag::Vector(items));
                }
                Some(_) => items.push(self.parse_tag()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Tag, DispatchError> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(Tag::Str(out)),
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, '"')) => out.push('"'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, other)) => {
                        return Err(self.error(format!("unsupported escape '\\{}'", other)))
                    }
                    None => break,
                },
                _ => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn read_name(&mut self) -> Result<NameToken, DispatchError> {
        let mut token = NameToken {
            text: String::new(),
            slash: None,
            quoted: false,
        };
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '|' {
                self.chars.next();
                self.read_quoted_segment(&mut token.text)?;
                token.quoted = true;
                continue;
            }
            if is_delimiter(c) {
                break;
            }
            if c == '/' && token.slash.is_none() {
                token.slash = Some(token.text.len());
            }
            token.text.push(c);
            self.chars.next();
        }
        Ok(token)
    }

    fn read_quoted_segment(&mut self, out: &mut String) -> Result<(), DispatchError> {
        while let Some((_, c)) = self.chars.next() {
            match c {
                '|' => return Ok(()),
                '\\' => match self.chars.next() {
                    Some((_, escaped @ ('|' | '\\'))) => out.push(escaped),
                    Some((_, other)) => {
                        return Err(self.error(format!("unsupported name escape '\\{}'", other)))
                    }
                    None => break,
                },
                _ => out.push(c),
            }
        }
        Err(self.error("unterminated quoted name"))
    }

    fn atom(&self, token: &str) -> Result<Tag, DispatchError> {
        match token {
            "" => Err(self.error("expected a tag")),
            "nil" => Ok(Tag::Nil),
            "true" => Ok(Tag::Bool(true)),
            "false" => Ok(Tag::Bool(false)),
            _ if looks_numeric(token) => token
                .parse::<i64>()
                .map(Tag::Int)
                .map_err(|e| self.error(format!("invalid integer: {}", e))),
            _ => Ok(Tag::Symbol(split_name(token))),
        }
    }
}

pub(super) fn looks_numeric(token: &str) -> bool {
    let digits = token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

/// `ns/name` splits on the first slash; a bare `/` or a slash at either end
/// stays part of the name.
fn split_name(token: &str) -> Name {
    match token.split_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() => Name::namespaced(ns, name),
        _ => Name::new(token),
    }
}
