//! Markup tokenization into typed resolver events.
//!
//! Input is optionally wrapped in a synthetic document element so that
//! fragments such as `Hello <b>world</b>` parse as one document. Offsets are
//! tracked in the wrapped text and mapped back to the caller's coordinates
//! only when an error is reported.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ResolveError;
use crate::position::{unwrap_coordinates, SourcePosition};

/// Default synthetic root tag.
pub const DEFAULT_ROOT_TAG: &str = "source";

/// Tokenizer options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsingOptions {
    /// Parse the input as a complete document with its own single root
    /// element instead of wrapping it.
    ///
    /// Wrapping copies the input once; large inputs that already carry a root
    /// element can skip that copy.
    pub do_not_wrap: bool,
    /// Tag name of the synthetic wrapper element.
    pub root_tag: &'static str,
}

impl Default for ParsingOptions {
    fn default() -> Self {
        Self {
            do_not_wrap: false,
            root_tag: DEFAULT_ROOT_TAG,
        }
    }
}

/// Typed event consumed by [`CascadeResolver`](crate::CascadeResolver).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupEvent {
    /// The document element opened.
    DocumentStart,
    /// A tag inside the document element opened.
    Open {
        name: String,
        attributes: Vec<(String, String)>,
        offset: usize,
    },
    /// A tag inside the document element closed.
    Close { name: String, offset: usize },
    /// Character data, already unescaped.
    Text(String),
    /// The document element closed.
    DocumentEnd,
}

/// Markup text ready for tokenization.
#[derive(Clone, Debug)]
pub struct PreparedMarkup<'a> {
    text: Cow<'a, str>,
    wrap_prefix: Option<usize>,
}

impl<'a> PreparedMarkup<'a> {
    /// Wrap `input` unless `options.do_not_wrap` is set.
    pub fn new(input: &'a str, options: &ParsingOptions) -> Self {
        if options.do_not_wrap {
            return Self {
                text: Cow::Borrowed(input),
                wrap_prefix: None,
            };
        }
        let tag = options.root_tag;
        let mut text = String::with_capacity(input.len() + 2 * tag.len() + 5);
        text.push('<');
        text.push_str(tag);
        text.push('>');
        text.push_str(input);
        text.push_str("</");
        text.push_str(tag);
        text.push('>');
        Self {
            text: Cow::Owned(text),
            wrap_prefix: Some(tag.len() + 2),
        }
    }

    /// Text handed to the tokenizer.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte length of the synthetic opening tag, if the input was wrapped.
    pub fn wrap_prefix(&self) -> Option<usize> {
        self.wrap_prefix
    }

    /// Caller-space position of a tokenizer offset.
    pub fn position(&self, offset: usize) -> SourcePosition {
        let wrapped = SourcePosition::locate(&self.text, offset);
        let (line, column) = unwrap_coordinates(wrapped.line, wrapped.column, self.wrap_prefix);
        SourcePosition::new(line, column)
    }

    /// Tokenize into events.
    pub fn events(&self, max_attribute_bytes: usize) -> MarkupReader<'_> {
        MarkupReader::new(self.as_str(), max_attribute_bytes)
            .with_synthetic_root(self.wrap_prefix.is_some())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    BeforeRoot,
    InRoot,
    AfterRoot,
    Finished,
}

enum Step {
    Start(String, Vec<(String, String)>),
    SelfClosing(String, Vec<(String, String)>),
    End(String),
    Text(String),
    Eof,
    Skip,
}

/// Streaming tokenizer yielding [`MarkupEvent`]s.
///
/// The outermost element becomes `DocumentStart`/`DocumentEnd`; everything
/// inside it becomes `Open`/`Close`/`Text`. The iterator stops after the first
/// error.
pub struct MarkupReader<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
    entity_buf: String,
    phase: Phase,
    depth: usize,
    root: String,
    synthetic_root: bool,
    open: Vec<String>,
    pending_close: Option<String>,
    max_attribute_bytes: usize,
    last_offset: usize,
}

impl<'a> MarkupReader<'a> {
    /// Tokenize a complete document.
    pub fn new(source: &'a str, max_attribute_bytes: usize) -> Self {
        let mut reader = Reader::from_reader(source.as_bytes());
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        Self {
            reader,
            buf: Vec::with_capacity(64),
            entity_buf: String::with_capacity(16),
            phase: Phase::BeforeRoot,
            depth: 0,
            root: String::new(),
            synthetic_root: false,
            open: Vec::with_capacity(8),
            pending_close: None,
            max_attribute_bytes,
            last_offset: 0,
        }
    }

    /// Treat the document element as a wrapper added around the caller's
    /// input, so closing it with tags still open reports the open tag.
    pub fn with_synthetic_root(mut self, synthetic_root: bool) -> Self {
        self.synthetic_root = synthetic_root;
        self
    }

    /// Byte offset where the most recent token started.
    pub fn token_offset(&self) -> usize {
        self.last_offset
    }

    fn fail(&mut self, err: ResolveError) -> Option<Result<MarkupEvent, ResolveError>> {
        self.phase = Phase::Finished;
        Some(Err(err))
    }

    fn read_step(&mut self) -> Result<Step, ResolveError> {
        self.buf.clear();
        let step = match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(e)) => {
                let (name, attrs) = decode_start(&self.reader, &e, self.max_attribute_bytes)?;
                Step::Start(name, attrs)
            }
            Ok(Event::Empty(e)) => {
                let (name, attrs) = decode_start(&self.reader, &e, self.max_attribute_bytes)?;
                Step::SelfClosing(name, attrs)
            }
            Ok(Event::End(e)) => Step::End(decode_name(&self.reader, e.name().as_ref())?),
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(|err| {
                    ResolveError::malformed(format!("decode error: {:?}", err))
                        .with_source("text decode")
                })?;
                Step::Text(text.into_owned())
            }
            Ok(Event::CData(e)) => {
                let text = self.reader.decoder().decode(&e).map_err(|err| {
                    ResolveError::malformed(format!("decode error: {:?}", err))
                        .with_source("cdata decode")
                })?;
                Step::Text(text.into_owned())
            }
            Ok(Event::GeneralRef(e)) => {
                let entity_name = e.decode().map_err(|err| {
                    ResolveError::malformed(format!("decode error: {:?}", err))
                        .with_source("entity decode")
                })?;
                self.entity_buf.clear();
                self.entity_buf.push('&');
                self.entity_buf.push_str(entity_name.as_ref());
                self.entity_buf.push(';');
                let resolved = quick_xml::escape::unescape(&self.entity_buf).map_err(|err| {
                    ResolveError::malformed(format!("unknown entity {}: {:?}", self.entity_buf, err))
                        .with_source("entity unescape")
                })?;
                Step::Text(resolved.into_owned())
            }
            Ok(Event::Eof) => Step::Eof,
            Ok(_) => Step::Skip,
            Err(err) => {
                let offset = usize::try_from(self.reader.error_position()).unwrap_or(usize::MAX);
                return Err(ResolveError::malformed(format!("xml error: {}", err))
                    .with_source("xml tokenizer")
                    .with_token_offset(offset));
            }
        };
        Ok(step)
    }

    fn open(&mut self, name: String, attributes: Vec<(String, String)>) -> Result<MarkupEvent, ResolveError> {
        match self.phase {
            Phase::BeforeRoot => {
                self.root = name;
                self.phase = Phase::InRoot;
                self.depth = 1;
                Ok(MarkupEvent::DocumentStart)
            }
            Phase::AfterRoot => Err(ResolveError::malformed(format!(
                "second document element <{}> after </{}>",
                name, self.root
            ))),
            _ => {
                self.depth += 1;
                self.open.push(name.clone());
                Ok(MarkupEvent::Open {
                    name,
                    attributes,
                    offset: self.last_offset,
                })
            }
        }
    }

    fn close(&mut self, name: String) -> Result<MarkupEvent, ResolveError> {
        match self.depth {
            0 => Err(ResolveError::mismatched_tag(None, &name)),
            1 => {
                if name != self.root {
                    let expected = (!self.synthetic_root).then_some(self.root.as_str());
                    return Err(ResolveError::mismatched_tag(expected, &name));
                }
                self.depth = 0;
                self.phase = Phase::AfterRoot;
                Ok(MarkupEvent::DocumentEnd)
            }
            _ => {
                if self.synthetic_root && name == self.root {
                    if let Some(unclosed) = self.open.last().filter(|open| **open != name) {
                        return Err(ResolveError::malformed(format!("<{}> not closed", unclosed)));
                    }
                }
                self.depth -= 1;
                self.open.pop();
                Ok(MarkupEvent::Close {
                    name,
                    offset: self.last_offset,
                })
            }
        }
    }
}

impl Iterator for MarkupReader<'_> {
    type Item = Result<MarkupEvent, ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(name) = self.pending_close.take() {
            return Some(self.close(name).or_else(|err| {
                self.phase = Phase::Finished;
                Err(err.with_token_offset(self.last_offset))
            }));
        }
        loop {
            if self.phase == Phase::Finished {
                return None;
            }
            self.last_offset = usize::try_from(self.reader.buffer_position()).unwrap_or(usize::MAX);
            let step = match self.read_step() {
                Ok(step) => step,
                Err(err) => {
                    let err = if err.token_offset().is_none() {
                        err.with_token_offset(self.last_offset)
                    } else {
                        err
                    };
                    return self.fail(err);
                }
            };
            let result = match step {
                Step::Start(name, attrs) => self.open(name, attrs),
                Step::SelfClosing(name, attrs) => {
                    self.pending_close = Some(name.clone());
                    self.open(name, attrs)
                }
                Step::End(name) => self.close(name),
                Step::Text(text) => {
                    if self.depth == 0 {
                        if text.trim().is_empty() {
                            continue;
                        }
                        Err(ResolveError::malformed(
                            "text outside the document element",
                        ))
                    } else if text.is_empty() {
                        continue;
                    } else {
                        Ok(MarkupEvent::Text(text))
                    }
                }
                Step::Eof => {
                    let err = match self.phase {
                        Phase::BeforeRoot => {
                            Some(ResolveError::malformed("input has no document element"))
                        }
                        Phase::InRoot => Some(ResolveError::malformed(format!(
                            "unexpected end of input inside <{}>",
                            self.root
                        ))),
                        _ => None,
                    };
                    self.phase = Phase::Finished;
                    return err.map(|err| Err(err.with_token_offset(self.last_offset)));
                }
                Step::Skip => continue,
            };
            return match result {
                Ok(event) => Some(Ok(event)),
                Err(err) => {
                    let offset = self.last_offset;
                    self.fail(err.with_token_offset(offset))
                }
            };
        }
    }
}

fn decode_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String, ResolveError> {
    let decoded = reader.decoder().decode(raw).map_err(|err| {
        ResolveError::malformed(format!("decode error: {:?}", err)).with_source("tag name decode")
    })?;
    // The tokenizer accepts anything up to `>` as a name; a stray `<` ends up here.
    let invalid = decoded.is_empty()
        || decoded
            .chars()
            .any(|c| matches!(c, '<' | '/' | '>') || c.is_whitespace());
    if invalid {
        return Err(
            ResolveError::malformed(format!("invalid tag name {:?}", decoded)).with_source("tag name"),
        );
    }
    Ok(decoded.into_owned())
}

fn decode_start(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    max_attribute_bytes: usize,
) -> Result<(String, Vec<(String, String)>), ResolveError> {
    let name = decode_name(reader, e.name().as_ref())?;
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            ResolveError::malformed(format!("invalid attribute in <{}>: {}", name, err))
                .with_source("attribute")
        })?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|err| {
                ResolveError::malformed(format!("decode error: {:?}", err))
                    .with_source("attribute decode")
            })?
            .into_owned();
        let raw = reader.decoder().decode(&attr.value).map_err(|err| {
            ResolveError::malformed(format!("decode error: {:?}", err))
                .with_source("attribute decode")
        })?;
        if raw.len() > max_attribute_bytes {
            return Err(
                ResolveError::limit("max_attribute_bytes", raw.len(), max_attribute_bytes)
                    .with_source("attribute value"),
            );
        }
        let value = match quick_xml::escape::unescape(&raw) {
            Ok(v) => v.into_owned(),
            Err(_) => raw.into_owned(),
        };
        attributes.push((key, value));
    }
    Ok((name, attributes))
}
