//! Tag name to style lookup.

use std::collections::HashMap;

use crate::attributes::{
    AttachmentBounds, AttributeKey, AttributeMap, AttributeValue, TextAttachment,
};
use crate::font::FontSource;
use crate::rich_text::{RichText, TextRun};
use crate::style::{EncodeDefaults, StyleNode};

/// Object replacement character used as the text of attachment runs.
pub const ATTACHMENT_CHARACTER: char = '\u{FFFC}';

/// Inline image substituted for a tag.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaAttachment {
    /// Opaque image reference passed through to the renderer.
    pub source: String,
    pub width: f32,
    pub height: f32,
    /// Template images take the run's foreground color as tint.
    pub template: bool,
    /// Optional style applied to the attachment run.
    pub style: Option<StyleNode>,
}

impl MediaAttachment {
    pub fn new(source: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            template: false,
            style: None,
        }
    }

    pub fn template(mut self, template: bool) -> Self {
        self.template = template;
        self
    }

    pub fn style(mut self, style: StyleNode) -> Self {
        self.style = Some(style);
        self
    }

    /// Render as a single U+FFFC run.
    ///
    /// A styled attachment carries the style's encoded attributes, except the
    /// baseline offset, which becomes the vertical origin of its bounds.
    pub fn to_run(&self, fonts: &dyn FontSource, defaults: &EncodeDefaults) -> TextRun {
        let mut attributes = match &self.style {
            Some(style) => style.encode(fonts, defaults),
            None => AttributeMap::new(),
        };
        let baseline = attributes
            .remove(&AttributeKey::BaselineOffset)
            .and_then(|value| value.as_f32())
            .unwrap_or(0.0);
        let tint = if self.template {
            attributes
                .get(&AttributeKey::ForegroundColor)
                .and_then(AttributeValue::as_color)
        } else {
            None
        };
        attributes.insert(
            AttributeKey::Attachment,
            AttributeValue::Attachment(TextAttachment {
                source: self.source.clone(),
                bounds: AttachmentBounds {
                    x: 0.0,
                    y: baseline,
                    width: self.width,
                    height: self.height,
                },
                tint,
            }),
        );
        TextRun::new(ATTACHMENT_CHARACTER.to_string(), attributes)
    }
}

/// What a tag resolves to.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleEntry {
    /// Merged into the cascade.
    Style(StyleNode),
    /// Pre-built content substituted verbatim; the tag's own text is discarded.
    Literal(RichText),
    /// Inline image substituted verbatim.
    Attachment(MediaAttachment),
}

impl StyleEntry {
    pub fn is_literal(&self) -> bool {
        !matches!(self, StyleEntry::Style(_))
    }
}

impl From<StyleNode> for StyleEntry {
    fn from(node: StyleNode) -> Self {
        StyleEntry::Style(node)
    }
}

impl From<RichText> for StyleEntry {
    fn from(text: RichText) -> Self {
        StyleEntry::Literal(text)
    }
}

impl From<MediaAttachment> for StyleEntry {
    fn from(attachment: MediaAttachment) -> Self {
        StyleEntry::Attachment(attachment)
    }
}

/// Immutable tag registry used by a resolve.
///
/// Lookups are exact and case-sensitive. The table is plain data, so it can be
/// shared across threads behind `&` or `Arc`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleTable {
    root: Option<StyleNode>,
    entries: HashMap<String, StyleEntry>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Style applied to the whole document.
    pub fn with_root(mut self, root: StyleNode) -> Self {
        self.root = Some(root);
        self
    }

    /// Register or replace the entry for `tag`.
    pub fn with(mut self, tag: impl Into<String>, entry: impl Into<StyleEntry>) -> Self {
        self.insert(tag, entry);
        self
    }

    pub fn insert(&mut self, tag: impl Into<String>, entry: impl Into<StyleEntry>) {
        self.entries.insert(tag.into(), entry.into());
    }

    pub fn root(&self) -> Option<&StyleNode> {
        self.root.as_ref()
    }

    pub fn get(&self, tag: &str) -> Option<&StyleEntry> {
        self.entries.get(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
