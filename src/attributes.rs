//! Flat display-attribute map.
//!
//! Keys are ordered so that encoded runs compare and print deterministically.
//! Merging is plain overwrite: a later write at the same key wins, keys the
//! later map does not mention are kept.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::features::FeatureSettings;
use crate::font::Font;
use crate::typography::ParagraphStyle;

/// RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from float components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }
}

/// Drop shadow behind glyphs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    /// Horizontal and vertical offset in points.
    pub offset: (f32, f32),
    /// Blur radius in points.
    pub blur_radius: f32,
    /// Shadow color, `None` for the renderer default.
    pub color: Option<Color>,
}

/// Placement rectangle of an inline attachment, relative to the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttachmentBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Inline attachment as recorded on a run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextAttachment {
    /// Opaque image reference understood by the renderer.
    pub source: String,
    /// Placement rectangle.
    pub bounds: AttachmentBounds,
    /// Tint applied to template images.
    pub tint: Option<Color>,
}

/// Well-known attribute keys, plus an escape hatch for caller-defined keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKey {
    Font,
    ForegroundColor,
    BackgroundColor,
    UnderlineStyle,
    UnderlineColor,
    StrikethroughStyle,
    StrikethroughColor,
    StrokeColor,
    StrokeWidth,
    BaselineOffset,
    Link,
    Ligature,
    Kern,
    ParagraphStyle,
    FeatureSettings,
    Attachment,
    Shadow,
    /// Caller-defined key, compared by name.
    Custom(String),
}

/// Attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Color(Color),
    Font(Font),
    Float(f32),
    Int(i64),
    Text(String),
    Paragraph(ParagraphStyle),
    FeatureSettings(FeatureSettings),
    Attachment(TextAttachment),
    Shadow(Shadow),
}

impl AttributeValue {
    /// Float payload, widening integers.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Color payload.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttributeValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// Ordered key/value attribute bag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    entries: BTreeMap<AttributeKey, AttributeValue>,
}

impl AttributeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: AttributeKey, value: AttributeValue) -> Option<AttributeValue> {
        self.entries.insert(key, value)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: AttributeKey, value: AttributeValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &AttributeKey) -> Option<AttributeValue> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &AttributeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, AttributeKey, AttributeValue> {
        self.entries.iter()
    }

    /// Font value, if set.
    pub fn font(&self) -> Option<&Font> {
        match self.entries.get(&AttributeKey::Font) {
            Some(AttributeValue::Font(font)) => Some(font),
            _ => None,
        }
    }

    /// Overwrite `self` key-by-key with `other`.
    pub fn overwrite_with(&mut self, other: &AttributeMap) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// `parent` overwritten by `child`.
    pub fn merged(parent: &AttributeMap, child: &AttributeMap) -> AttributeMap {
        let mut out = parent.clone();
        out.overwrite_with(child);
        out
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = (&'a AttributeKey, &'a AttributeValue);
    type IntoIter = btree_map::Iter<'a, AttributeKey, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(AttributeKey, AttributeValue)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (AttributeKey, AttributeValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
