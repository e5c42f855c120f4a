//! Structured errors for markup resolution.

use std::fmt;

use crate::position::SourcePosition;

/// Broad class of a resolution failure.
///
/// Both classes terminate the resolve; the split exists so callers can tell
/// broken markup apart from a style table that does not match the markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The markup itself is not well-formed or exceeds a configured limit.
    Structural,
    /// The markup is well-formed but does not fit the style table.
    Semantic,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => f.write_str("structural"),
            Self::Semantic => f.write_str("semantic"),
        }
    }
}

/// Typed failure reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveErrorKind {
    /// A tag has no entry in the style table.
    UnknownTag {
        /// Tag name as written in the markup.
        name: String,
    },
    /// A closing tag does not match the innermost open tag.
    MismatchedTag {
        /// Innermost open tag, if any.
        expected: Option<String>,
        /// Closing tag that was found.
        found: String,
    },
    /// The tokenizer rejected the markup.
    MalformedMarkup {
        /// Tokenizer diagnostic.
        reason: String,
    },
    /// A tag was opened inside a literal entry, which must be a leaf.
    MismatchedContent {
        /// Literal tag that was open.
        literal: String,
        /// Nested tag that was found.
        found: String,
    },
    /// A configured resource limit was exceeded.
    LimitExceeded {
        /// Limit name.
        kind: &'static str,
        /// Observed value.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Extended optional context for resolve errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveErrorContext {
    /// Byte offset of the failing token in the tokenized (possibly wrapped) source.
    pub token_offset: Option<usize>,
    /// Free-form source hint (e.g. "text decode", "attribute decode").
    pub source: Option<Box<str>>,
}

/// Structured error for markup resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveError {
    /// Structural or semantic failure.
    pub class: ErrorClass,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Typed reason.
    pub kind: ResolveErrorKind,
    /// Human-readable message.
    pub message: Box<str>,
    /// Location in the caller's original markup, when known.
    pub position: Option<SourcePosition>,
    /// Optional additional context.
    pub context: Option<Box<ResolveErrorContext>>,
}

impl ResolveError {
    fn new(class: ErrorClass, code: &'static str, kind: ResolveErrorKind, message: String) -> Self {
        Self {
            class,
            code,
            kind,
            message: message.into_boxed_str(),
            position: None,
            context: None,
        }
    }

    pub(crate) fn unknown_tag(name: &str) -> Self {
        Self::new(
            ErrorClass::Semantic,
            "UNKNOWN_TAG",
            ResolveErrorKind::UnknownTag {
                name: name.into(),
            },
            format!("no style registered for tag <{}>", name),
        )
    }

    pub(crate) fn mismatched_tag(expected: Option<&str>, found: &str) -> Self {
        let message = match expected {
            Some(expected) => format!("expected </{}>, found </{}>", expected, found),
            None => format!("unexpected </{}> with no open tag", found),
        };
        Self::new(
            ErrorClass::Structural,
            "MISMATCHED_TAG",
            ResolveErrorKind::MismatchedTag {
                expected: expected.map(String::from),
                found: found.into(),
            },
            message,
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            ErrorClass::Structural,
            "MALFORMED_MARKUP",
            ResolveErrorKind::MalformedMarkup {
                reason: reason.clone(),
            },
            reason,
        )
    }

    pub(crate) fn mismatched_content(literal: &str, found: &str) -> Self {
        Self::new(
            ErrorClass::Semantic,
            "MISMATCHED_CONTENT",
            ResolveErrorKind::MismatchedContent {
                literal: literal.into(),
                found: found.into(),
            },
            format!(
                "literal tag <{}> cannot contain nested tag <{}>",
                literal,
                found
            ),
        )
    }

    pub(crate) fn limit(kind: &'static str, actual: usize, limit: usize) -> Self {
        Self::new(
            ErrorClass::Structural,
            "LIMIT_EXCEEDED",
            ResolveErrorKind::LimitExceeded {
                kind,
                actual,
                limit,
            },
            format!("{} exceeded ({} > {})", kind, actual, limit),
        )
    }

    pub(crate) fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    pub(crate) fn with_token_offset(mut self, token_offset: usize) -> Self {
        let ctx = self
            .context
            .get_or_insert_with(|| Box::new(ResolveErrorContext::default()));
        ctx.token_offset = Some(token_offset);
        self
    }

    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Self {
        let ctx = self
            .context
            .get_or_insert_with(|| Box::new(ResolveErrorContext::default()));
        ctx.source = Some(source.into().into_boxed_str());
        self
    }

    /// Token offset recorded when the error was raised, if any.
    pub fn token_offset(&self) -> Option<usize> {
        self.context.as_ref().and_then(|ctx| ctx.token_offset)
    }

    /// 1-based line in the caller's markup, if known.
    pub fn line(&self) -> Option<usize> {
        self.position.map(|pos| pos.line)
    }

    /// 1-based column in the caller's markup, if known.
    pub fn column(&self) -> Option<usize> {
        self.position.map(|pos| pos.column)
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.class, self.code, self.message)?;
        if let Some(pos) = self.position {
            write!(f, " [line={} column={}]", pos.line, pos.column)?;
        }
        if let Some(ctx) = &self.context {
            if let Some(source) = ctx.source.as_deref() {
                write!(f, " [source={}]", source)?;
            }
            if let Some(token_offset) = ctx.token_offset {
                write!(f, " [token_offset={}]", token_offset)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_semantic() {
        let err = ResolveError::unknown_tag("c");
        assert_eq!(err.class, ErrorClass::Semantic);
        assert_eq!(err.code, "UNKNOWN_TAG");
        assert_eq!(
            err.kind,
            ResolveErrorKind::UnknownTag {
                name: "c".to_string()
            }
        );
    }

    #[test]
    fn mismatched_tag_without_open_tag_reads_naturally() {
        let err = ResolveError::mismatched_tag(None, "b");
        assert_eq!(err.class, ErrorClass::Structural);
        assert!(err.message.contains("</b>"));
        assert!(err.message.contains("no open tag"));
    }

    #[test]
    fn display_includes_position_and_context() {
        let err = ResolveError::malformed("unexpected end of input")
            .with_position(SourcePosition::new(2, 7))
            .with_token_offset(41)
            .with_source("xml tokenizer");
        let msg = err.to_string();
        assert!(msg.starts_with("structural:MALFORMED_MARKUP: unexpected end of input"));
        assert!(msg.contains("[line=2 column=7]"));
        assert!(msg.contains("[source=xml tokenizer]"));
        assert!(msg.contains("[token_offset=41]"));
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(7));
        assert_eq!(err.token_offset(), Some(41));
    }

    #[test]
    fn limit_error_reports_actual_and_limit() {
        let err = ResolveError::limit("max_nesting", 65, 64);
        assert_eq!(
            err.kind,
            ResolveErrorKind::LimitExceeded {
                kind: "max_nesting",
                actual: 65,
                limit: 64
            }
        );
        assert!(err.to_string().contains("65 > 64"));
    }
}
