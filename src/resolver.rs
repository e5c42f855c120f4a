//! Stack machine that turns markup events into styled runs.
//!
//! Each open tag pushes a frame holding the style in effect inside it. Text is
//! buffered and flushed as one run whenever a tag boundary is crossed, using
//! the frame that owned the text. Encoded attributes are computed once per
//! frame and reused for every run the frame flushes.

use std::mem;

use crate::attributes::AttributeMap;
use crate::error::ResolveError;
use crate::font::FontSource;
use crate::markup::MarkupEvent;
use crate::rich_text::{RichText, RichTextMark, TagInstance, TextRun};
use crate::style::{EncodeDefaults, StyleNode};
use crate::table::{StyleEntry, StyleTable};

/// Lifecycle of a [`CascadeResolver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolverState {
    /// No event seen yet.
    Empty,
    /// Between `DocumentStart` and `DocumentEnd`.
    InDocument,
    /// `DocumentEnd` processed; output is complete.
    Done,
    /// Resolution stopped; every later call returns this error.
    Failed(ResolveError),
}

enum FrameStyle<'t> {
    Resolved(StyleNode),
    Literal(&'t StyleEntry),
}

struct StackFrame<'t> {
    tag: String,
    style: FrameStyle<'t>,
    attributes: Vec<(String, String)>,
    output_start: usize,
    encoded: Option<AttributeMap>,
}

/// Single-use resolver for one document.
///
/// Runs are appended to the borrowed output. On failure everything appended
/// since construction is removed again.
pub struct CascadeResolver<'t, 'o> {
    table: &'t StyleTable,
    fonts: &'t dyn FontSource,
    defaults: EncodeDefaults,
    max_nesting: usize,
    state: ResolverState,
    stack: Vec<StackFrame<'t>>,
    has_root_frame: bool,
    text: String,
    out: &'o mut RichText,
    mark: RichTextMark,
}

impl<'t, 'o> CascadeResolver<'t, 'o> {
    pub fn new(
        table: &'t StyleTable,
        fonts: &'t dyn FontSource,
        defaults: EncodeDefaults,
        out: &'o mut RichText,
    ) -> Self {
        let mark = out.mark();
        Self {
            table,
            fonts,
            defaults,
            max_nesting: usize::MAX,
            state: ResolverState::Empty,
            stack: Vec::with_capacity(8),
            has_root_frame: false,
            text: String::new(),
            out,
            mark,
        }
    }

    /// Maximum number of simultaneously open tags below the document element.
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    /// Number of open tag frames, not counting the root frame.
    pub fn depth(&self) -> usize {
        self.stack
            .len()
            .saturating_sub(usize::from(self.has_root_frame))
    }

    /// Dispatch one event.
    pub fn feed(&mut self, event: MarkupEvent) -> Result<(), ResolveError> {
        match event {
            MarkupEvent::DocumentStart => self.document_start(),
            MarkupEvent::Open {
                name,
                attributes,
                offset,
            } => self.tag_open(&name, attributes, offset),
            MarkupEvent::Close { name, offset } => self.tag_close(&name, offset),
            MarkupEvent::Text(chunk) => self.text(&chunk),
            MarkupEvent::DocumentEnd => self.document_end(),
        }
    }

    /// Consume the resolver, requiring that the document was completed.
    pub fn finish(self) -> Result<(), ResolveError> {
        match self.state {
            ResolverState::Done => Ok(()),
            ResolverState::Failed(err) => Err(err),
            _ => {
                let err = ResolveError::malformed("document ended before its closing tag");
                self.out.rollback(self.mark);
                Err(err)
            }
        }
    }

    /// Stop with an error raised outside the resolver, e.g. by the tokenizer.
    ///
    /// Output appended so far is removed. Returns the stored error, which is
    /// the earlier one if the resolver had already failed.
    pub fn abort(&mut self, err: ResolveError) -> ResolveError {
        if let ResolverState::Failed(existing) = &self.state {
            return existing.clone();
        }
        self.record_failure(err)
    }

    pub fn document_start(&mut self) -> Result<(), ResolveError> {
        self.check_failed()?;
        if self.state != ResolverState::Empty {
            return self.fail(ResolveError::malformed("document started twice"));
        }
        if let Some(root) = self.table.root() {
            self.stack.push(StackFrame {
                tag: String::new(),
                style: FrameStyle::Resolved(root.clone()),
                attributes: Vec::new(),
                output_start: self.out.len(),
                encoded: None,
            });
            self.has_root_frame = true;
        }
        log::debug!(
            "resolver: document start (root style: {})",
            self.has_root_frame
        );
        self.state = ResolverState::InDocument;
        Ok(())
    }

    pub fn tag_open(
        &mut self,
        name: &str,
        attributes: Vec<(String, String)>,
        offset: usize,
    ) -> Result<(), ResolveError> {
        self.check_in_document(offset)?;

        if let Some(top) = self.stack.last() {
            if let FrameStyle::Literal(_) = top.style {
                let err = ResolveError::mismatched_content(&top.tag, name);
                return self.fail(err.with_token_offset(offset));
            }
        }
        if self.depth() >= self.max_nesting {
            let err = ResolveError::limit("max_nesting", self.depth() + 1, self.max_nesting);
            return self.fail(err.with_token_offset(offset));
        }
        let table = self.table;
        let entry = match table.get(name) {
            Some(entry) => entry,
            None => return self.fail(ResolveError::unknown_tag(name).with_token_offset(offset)),
        };

        self.flush();

        let style = match entry {
            StyleEntry::Style(node) => {
                let resolved = match self.stack.last() {
                    Some(StackFrame {
                        style: FrameStyle::Resolved(parent),
                        ..
                    }) => StyleNode::combine(parent, node),
                    _ => StyleNode::combine(&StyleNode::new(), node),
                };
                FrameStyle::Resolved(resolved)
            }
            literal => FrameStyle::Literal(literal),
        };
        self.stack.push(StackFrame {
            tag: name.into(),
            style,
            attributes,
            output_start: self.out.len(),
            encoded: None,
        });
        Ok(())
    }

    pub fn text(&mut self, chunk: &str) -> Result<(), ResolveError> {
        self.check_failed()?;
        if self.state != ResolverState::InDocument {
            return self.fail(ResolveError::malformed("text outside the document element"));
        }
        self.text.push_str(chunk);
        Ok(())
    }

    pub fn tag_close(&mut self, name: &str, offset: usize) -> Result<(), ResolveError> {
        self.check_in_document(offset)?;

        let open_tag = if self.depth() == 0 {
            None
        } else {
            self.stack.last().map(|frame| frame.tag.as_str())
        };
        if open_tag != Some(name) {
            let err = ResolveError::mismatched_tag(open_tag, name).with_token_offset(offset);
            return self.fail(err);
        }

        let literal = match self.stack.last() {
            Some(StackFrame {
                style: FrameStyle::Literal(entry),
                ..
            }) => Some(*entry),
            _ => None,
        };
        match literal {
            Some(entry) => {
                if !self.text.trim().is_empty() {
                    log::warn!(
                        "discarding {} bytes of text inside literal tag <{}>",
                        self.text.len(),
                        name
                    );
                }
                self.text.clear();
                self.emit_literal(entry);
            }
            None => self.flush(),
        }

        if let Some(frame) = self.stack.pop() {
            self.out.push_tag(TagInstance {
                name: frame.tag,
                attributes: frame.attributes,
                range: frame.output_start..self.out.len(),
            });
        }
        Ok(())
    }

    pub fn document_end(&mut self) -> Result<(), ResolveError> {
        self.check_failed()?;
        if self.state != ResolverState::InDocument {
            return self.fail(ResolveError::malformed("document end without document start"));
        }
        if self.depth() > 0 {
            let unclosed = self
                .stack
                .last()
                .map(|frame| frame.tag.clone())
                .unwrap_or_default();
            return self.fail(ResolveError::malformed(format!(
                "document ended with <{}> still open",
                unclosed
            )));
        }
        self.flush();
        self.stack.clear();
        self.has_root_frame = false;
        self.state = ResolverState::Done;
        log::debug!("resolver: document end, {} runs", self.out.runs().len());
        Ok(())
    }

    fn check_failed(&self) -> Result<(), ResolveError> {
        match &self.state {
            ResolverState::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn check_in_document(&mut self, offset: usize) -> Result<(), ResolveError> {
        self.check_failed()?;
        if self.state != ResolverState::InDocument {
            let err = ResolveError::malformed("tag outside the document element");
            return self.fail(err.with_token_offset(offset));
        }
        Ok(())
    }

    fn fail(&mut self, err: ResolveError) -> Result<(), ResolveError> {
        Err(self.record_failure(err))
    }

    fn record_failure(&mut self, err: ResolveError) -> ResolveError {
        log::debug!("resolver: failed with {}", err.code);
        self.out.rollback(self.mark);
        self.stack.clear();
        self.has_root_frame = false;
        self.text.clear();
        self.state = ResolverState::Failed(err.clone());
        err
    }

    /// Emit buffered text as one run styled by the top frame.
    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = mem::take(&mut self.text);
        let fonts = self.fonts;
        let defaults = self.defaults;
        let attributes = match self.stack.last_mut() {
            Some(frame) => match &frame.style {
                FrameStyle::Resolved(node) => frame
                    .encoded
                    .get_or_insert_with(|| node.encode(fonts, &defaults))
                    .clone(),
                // Text inside a literal never reaches here; it is dropped at close.
                FrameStyle::Literal(_) => return,
            },
            None => AttributeMap::new(),
        };
        self.out.push_run(TextRun::new(text, attributes));
    }

    fn emit_literal(&mut self, entry: &StyleEntry) {
        match entry {
            StyleEntry::Literal(content) => self.out.append(content),
            StyleEntry::Attachment(attachment) => {
                let run = attachment.to_run(self.fonts, &self.defaults);
                self.out.push_run(run);
            }
            StyleEntry::Style(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeKey, AttributeValue, Color};
    use crate::emphasis::Emphasis;
    use crate::error::ResolveErrorKind;
    use crate::font::SystemFonts;

    fn red() -> Color {
        Color::rgba(1.0, 0.0, 0.0, 1.0)
    }

    fn open(name: &str) -> MarkupEvent {
        MarkupEvent::Open {
            name: name.into(),
            attributes: Vec::new(),
            offset: 0,
        }
    }

    fn close(name: &str) -> MarkupEvent {
        MarkupEvent::Close {
            name: name.into(),
            offset: 0,
        }
    }

    fn text(t: &str) -> MarkupEvent {
        MarkupEvent::Text(t.into())
    }

    fn run(table: &StyleTable, events: Vec<MarkupEvent>) -> Result<RichText, ResolveError> {
        let fonts = SystemFonts::default();
        let mut out = RichText::new();
        let mut resolver = CascadeResolver::new(table, &fonts, EncodeDefaults::default(), &mut out);
        for event in events {
            resolver.feed(event)?;
        }
        resolver.finish()?;
        Ok(out)
    }

    #[test]
    fn nested_tags_produce_three_runs() {
        let table = StyleTable::new()
            .with("a", StyleNode::new().color(red()))
            .with("b", StyleNode::new().emphasis(Emphasis::Bold));
        let out = run(
            &table,
            vec![
                MarkupEvent::DocumentStart,
                open("a"),
                text("X"),
                open("b"),
                text("Y"),
                close("b"),
                text("Z"),
                close("a"),
                MarkupEvent::DocumentEnd,
            ],
        )
        .expect("resolve");
        let runs = out.runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "X");
        assert_eq!(runs[1].text, "Y");
        assert_eq!(runs[2].text, "Z");
        assert_eq!(runs[0].attributes, runs[2].attributes);
        assert_eq!(
            runs[1]
                .attributes
                .get(&AttributeKey::ForegroundColor)
                .and_then(AttributeValue::as_color),
            Some(red())
        );
        assert_eq!(out.tags().len(), 2);
        assert_eq!(out.tags()[0].name, "b");
        assert_eq!(out.tags()[0].range, 1..2);
        assert_eq!(out.tags()[1].range, 0..3);
    }

    #[test]
    fn text_without_root_style_is_unstyled() {
        let out = run(
            &StyleTable::new(),
            vec![MarkupEvent::DocumentStart, text("hi"), MarkupEvent::DocumentEnd],
        )
        .expect("resolve");
        assert_eq!(out.runs().len(), 1);
        assert!(out.runs()[0].attributes.is_empty());
    }

    #[test]
    fn root_style_applies_to_top_level_text() {
        let table = StyleTable::new().with_root(StyleNode::new().color(red()));
        let out = run(
            &table,
            vec![MarkupEvent::DocumentStart, text("hi"), MarkupEvent::DocumentEnd],
        )
        .expect("resolve");
        assert!(out.runs()[0]
            .attributes
            .contains_key(&AttributeKey::ForegroundColor));
    }

    #[test]
    fn literal_replaces_inner_text() {
        let literal = RichText::plain("[logo]");
        let table = StyleTable::new().with("img", literal.clone());
        let out = run(
            &table,
            vec![
                MarkupEvent::DocumentStart,
                open("img"),
                text("ignored"),
                close("img"),
                MarkupEvent::DocumentEnd,
            ],
        )
        .expect("resolve");
        assert_eq!(out.runs(), literal.runs());
    }

    #[test]
    fn nested_tag_inside_literal_fails() {
        let table = StyleTable::new()
            .with("img", RichText::plain("x"))
            .with("b", StyleNode::new());
        let err = run(
            &table,
            vec![MarkupEvent::DocumentStart, open("img"), open("b")],
        )
        .expect_err("literal is a leaf");
        assert_eq!(
            err.kind,
            ResolveErrorKind::MismatchedContent {
                literal: "img".into(),
                found: "b".into()
            }
        );
    }

    #[test]
    fn unknown_tag_fails_without_partial_output() {
        let fonts = SystemFonts::default();
        let table = StyleTable::new().with("a", StyleNode::new());
        let mut out = RichText::plain("existing");
        let mut resolver =
            CascadeResolver::new(&table, &fonts, EncodeDefaults::default(), &mut out);
        resolver.feed(MarkupEvent::DocumentStart).expect("start");
        resolver.feed(open("a")).expect("a");
        resolver.feed(text("t")).expect("text");
        resolver.feed(close("a")).expect("close");
        let err = resolver.feed(open("c")).expect_err("unknown");
        assert_eq!(err.kind, ResolveErrorKind::UnknownTag { name: "c".into() });
        assert!(matches!(resolver.state(), ResolverState::Failed(_)));
        assert_eq!(resolver.feed(text("more")).expect_err("sticky"), err);
        drop(resolver);
        assert_eq!(out.text(), "existing");
        assert!(out.tags().is_empty());
    }

    #[test]
    fn mismatched_close_reports_expected_tag() {
        let table = StyleTable::new()
            .with("a", StyleNode::new())
            .with("b", StyleNode::new());
        let err = run(
            &table,
            vec![MarkupEvent::DocumentStart, open("a"), close("b")],
        )
        .expect_err("mismatch");
        assert_eq!(
            err.kind,
            ResolveErrorKind::MismatchedTag {
                expected: Some("a".into()),
                found: "b".into()
            }
        );
    }

    #[test]
    fn unclosed_frames_at_document_end_fail() {
        let table = StyleTable::new().with("a", StyleNode::new());
        let err = run(
            &table,
            vec![MarkupEvent::DocumentStart, open("a"), MarkupEvent::DocumentEnd],
        )
        .expect_err("unclosed");
        assert!(matches!(err.kind, ResolveErrorKind::MalformedMarkup { .. }));
    }

    #[test]
    fn events_after_done_fail() {
        let err = run(
            &StyleTable::new(),
            vec![
                MarkupEvent::DocumentStart,
                MarkupEvent::DocumentEnd,
                text("late"),
            ],
        )
        .expect_err("after done");
        assert!(matches!(err.kind, ResolveErrorKind::MalformedMarkup { .. }));
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let fonts = SystemFonts::default();
        let table = StyleTable::new().with("a", StyleNode::new());
        let mut out = RichText::new();
        let mut resolver = CascadeResolver::new(&table, &fonts, EncodeDefaults::default(), &mut out)
            .with_max_nesting(2);
        resolver.feed(MarkupEvent::DocumentStart).expect("start");
        resolver.feed(open("a")).expect("depth 1");
        resolver.feed(open("a")).expect("depth 2");
        let err = resolver.feed(open("a")).expect_err("depth 3");
        assert_eq!(
            err.kind,
            ResolveErrorKind::LimitExceeded {
                kind: "max_nesting",
                actual: 3,
                limit: 2
            }
        );
    }

    #[test]
    fn flushed_runs_are_not_changed_by_later_frames() {
        let table = StyleTable::new()
            .with("a", StyleNode::new().color(red()))
            .with("b", StyleNode::new().emphasis(Emphasis::Italic));
        let out = run(
            &table,
            vec![
                MarkupEvent::DocumentStart,
                open("a"),
                text("1"),
                open("b"),
                close("b"),
                text("2"),
                close("a"),
                MarkupEvent::DocumentEnd,
            ],
        )
        .expect("resolve");
        assert_eq!(out.runs().len(), 2);
        assert_eq!(out.runs()[0].attributes, out.runs()[1].attributes);
    }
}
