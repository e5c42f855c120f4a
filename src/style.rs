//! Composable style nodes.
//!
//! A [`StyleNode`] mixes two kinds of state: a flat [`AttributeMap`] that
//! merges by key overwrite, and typed fields that inherit one by one when
//! unset. [`StyleNode::combine`] folds a parent and a child into the node used
//! for text inside the child tag, and [`StyleNode::encode`] turns a resolved
//! node into the final attribute map for a run.

use std::ops::RangeBounds;

use crate::attributes::{AttributeKey, AttributeMap, AttributeValue, Color, Shadow};
use crate::emphasis::{Emphasis, EmphasisFlags};
use crate::features::{
    encode_feature_settings, ContextualAlternates, FeatureFlag, Fractions, NumberCase,
    NumberSpacing, SmallCaps, StylisticAlternatives, VerticalPosition,
};
use crate::font::{Font, FontSource};
use crate::rich_text::RichText;
use crate::typography::{
    LineBreakMode, TextAlignment, Tracking, TypographyDescriptor, WritingDirection,
};

/// Dynamic-type scaling request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicText {
    /// Text style identifier understood by the [`FontSource`], e.g. `"body"`.
    pub text_style: Option<String>,
    /// Upper bound on the scaled size. `0.0` means unbounded.
    pub maximum_point_size: f32,
    /// Trait-collection or environment hint passed through to the font source.
    pub compatible_with: Option<String>,
}

impl DynamicText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_style(mut self, text_style: impl Into<String>) -> Self {
        self.text_style = Some(text_style.into());
        self
    }

    pub fn maximum_point_size(mut self, size: f32) -> Self {
        self.maximum_point_size = size;
        self
    }

    pub fn compatible_with(mut self, context: impl Into<String>) -> Self {
        self.compatible_with = Some(context.into());
        self
    }
}

/// Values used only when a resolved node is encoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeDefaults {
    /// Point size of the system font used when no font attribute is set.
    pub system_font_size: f32,
}

impl Default for EncodeDefaults {
    fn default() -> Self {
        Self {
            system_font_size: 17.0,
        }
    }
}

/// Unit of composable style.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleNode {
    /// Flat attributes, merged by key overwrite.
    pub attributes: AttributeMap,
    /// Inheritable paragraph fields.
    pub typography: TypographyDescriptor,
    /// Letter spacing, inherited when unset.
    pub tracking: Option<Tracking>,
    /// Shaping features in setter order.
    pub features: Vec<FeatureFlag>,
    /// Emphasis variants, unioned with the parent.
    pub emphasis: EmphasisFlags,
    /// Dynamic-type scaling, replaced wholesale by a child.
    pub dynamic_text: Option<DynamicText>,
}

impl StyleNode {
    /// Empty node. Combining with it changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `child` over `parent`.
    ///
    /// Typed fields take the child's value when set and the parent's
    /// otherwise. Attributes merge by key, emphasis by union. Feature flags are
    /// the parent's followed by the child's; an earlier flag is dropped when
    /// an identical flag follows it. Every slot keeps the value it would have
    /// had, but slot order in the encoded settings may change: a slot first
    /// set by the dropped flag now appears where the later copy sits. No
    /// default is filled in here.
    pub fn combine(parent: &StyleNode, child: &StyleNode) -> StyleNode {
        let mut features = Vec::with_capacity(parent.features.len() + child.features.len());
        features.extend(parent.features.iter().copied());
        features.extend(child.features.iter().copied());
        dedup_keep_last(&mut features);

        StyleNode {
            attributes: AttributeMap::merged(&parent.attributes, &child.attributes),
            typography: TypographyDescriptor::combine(&parent.typography, &child.typography),
            tracking: child.tracking.or(parent.tracking),
            features,
            emphasis: parent.emphasis.union(child.emphasis),
            dynamic_text: child
                .dynamic_text
                .clone()
                .or_else(|| parent.dynamic_text.clone()),
        }
    }

    /// Produce the final attribute map for a run styled by this node.
    pub fn encode(&self, fonts: &dyn FontSource, defaults: &EncodeDefaults) -> AttributeMap {
        let mut out = self.attributes.clone();

        let paragraph = self.typography.resolve();
        if !paragraph.is_default() {
            out.insert(
                AttributeKey::ParagraphStyle,
                AttributeValue::Paragraph(paragraph),
            );
        }

        let mut font = match out.font() {
            Some(font) => font.clone(),
            None => fonts.system_font(defaults.system_font_size),
        };

        let pairs = self.features.iter().flat_map(|flag| flag.settings());
        if let Some(settings) = encode_feature_settings(pairs) {
            out.insert(
                AttributeKey::FeatureSettings,
                AttributeValue::FeatureSettings(settings),
            );
        }

        if !self.emphasis.is_empty() {
            let traits = font.traits.union(self.emphasis.symbolic_traits());
            match fonts.with_traits(&font, traits) {
                Some(updated) => font = updated,
                None => log::warn!(
                    "font {:?} does not support traits {:#x}; keeping it unchanged",
                    font.family,
                    traits.bits()
                ),
            }
        }

        if let Some(dynamic) = &self.dynamic_text {
            font = fonts.scaled_font(&font, dynamic);
        }

        if let Some(tracking) = self.tracking {
            out.insert(
                AttributeKey::Kern,
                AttributeValue::Float(tracking.kerning(font.point_size)),
            );
        }
        out.insert(AttributeKey::Font, AttributeValue::Font(font));
        out
    }

    /// Style all of `text` with this node as a single run.
    pub fn apply(&self, text: &str, fonts: &dyn FontSource, defaults: &EncodeDefaults) -> RichText {
        self.apply_range(text, .., fonts, defaults)
    }

    /// Style the bytes of `text` in `range`; the rest stays unattributed.
    ///
    /// Range handling follows [`RichText::add_attributes`].
    pub fn apply_range(
        &self,
        text: &str,
        range: impl RangeBounds<usize>,
        fonts: &dyn FontSource,
        defaults: &EncodeDefaults,
    ) -> RichText {
        let mut out = RichText::plain(text);
        out.apply_style(self, range, fonts, defaults);
        out
    }

    /// Keys [`encode`](Self::encode) writes on behalf of this node.
    ///
    /// The fallback system font is not included: a node with no font,
    /// emphasis or dynamic text does not own the font of the runs it styles.
    pub fn encoded_keys(&self) -> Vec<AttributeKey> {
        let mut keys: Vec<AttributeKey> = self.attributes.iter().map(|(key, _)| key.clone()).collect();
        let mut push = |key: AttributeKey| {
            if !keys.contains(&key) {
                keys.push(key);
            }
        };
        if !self.typography.resolve().is_default() {
            push(AttributeKey::ParagraphStyle);
        }
        let pairs = self.features.iter().flat_map(|flag| flag.settings());
        if encode_feature_settings(pairs).is_some() {
            push(AttributeKey::FeatureSettings);
        }
        if !self.emphasis.is_empty() || self.dynamic_text.is_some() {
            push(AttributeKey::Font);
        }
        if self.tracking.is_some() {
            push(AttributeKey::Kern);
        }
        keys
    }

    // Fluent setters.

    /// Set an arbitrary attribute.
    pub fn attribute(mut self, key: AttributeKey, value: AttributeValue) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn font(self, font: Font) -> Self {
        self.attribute(AttributeKey::Font, AttributeValue::Font(font))
    }

    pub fn color(self, color: Color) -> Self {
        self.attribute(AttributeKey::ForegroundColor, AttributeValue::Color(color))
    }

    pub fn background_color(self, color: Color) -> Self {
        self.attribute(AttributeKey::BackgroundColor, AttributeValue::Color(color))
    }

    /// Underline with a renderer-defined style code and optional color.
    pub fn underline(self, style: i64, color: Option<Color>) -> Self {
        let node = self.attribute(AttributeKey::UnderlineStyle, AttributeValue::Int(style));
        match color {
            Some(color) => node.attribute(AttributeKey::UnderlineColor, AttributeValue::Color(color)),
            None => node,
        }
    }

    /// Strikethrough with a renderer-defined style code and optional color.
    pub fn strikethrough(self, style: i64, color: Option<Color>) -> Self {
        let node = self.attribute(AttributeKey::StrikethroughStyle, AttributeValue::Int(style));
        match color {
            Some(color) => {
                node.attribute(AttributeKey::StrikethroughColor, AttributeValue::Color(color))
            }
            None => node,
        }
    }

    pub fn stroke(self, color: Color, width: f32) -> Self {
        self.attribute(AttributeKey::StrokeColor, AttributeValue::Color(color))
            .attribute(AttributeKey::StrokeWidth, AttributeValue::Float(width))
    }

    pub fn baseline_offset(self, offset: f32) -> Self {
        self.attribute(AttributeKey::BaselineOffset, AttributeValue::Float(offset))
    }

    pub fn link(self, url: impl Into<String>) -> Self {
        self.attribute(AttributeKey::Link, AttributeValue::Text(url.into()))
    }

    /// `0` disables ligatures, `1` selects the default set.
    pub fn ligature(self, ligature: i64) -> Self {
        self.attribute(AttributeKey::Ligature, AttributeValue::Int(ligature))
    }

    pub fn shadow(self, shadow: Shadow) -> Self {
        self.attribute(AttributeKey::Shadow, AttributeValue::Shadow(shadow))
    }

    pub fn line_spacing(mut self, value: f32) -> Self {
        self.typography.line_spacing = Some(value);
        self
    }

    pub fn paragraph_spacing_before(mut self, value: f32) -> Self {
        self.typography.paragraph_spacing_before = Some(value);
        self
    }

    pub fn paragraph_spacing_after(mut self, value: f32) -> Self {
        self.typography.paragraph_spacing_after = Some(value);
        self
    }

    pub fn alignment(mut self, value: TextAlignment) -> Self {
        self.typography.alignment = Some(value);
        self
    }

    pub fn first_line_head_indent(mut self, value: f32) -> Self {
        self.typography.first_line_head_indent = Some(value);
        self
    }

    pub fn head_indent(mut self, value: f32) -> Self {
        self.typography.head_indent = Some(value);
        self
    }

    pub fn tail_indent(mut self, value: f32) -> Self {
        self.typography.tail_indent = Some(value);
        self
    }

    pub fn line_break_mode(mut self, value: LineBreakMode) -> Self {
        self.typography.line_break_mode = Some(value);
        self
    }

    pub fn minimum_line_height(mut self, value: f32) -> Self {
        self.typography.minimum_line_height = Some(value);
        self
    }

    pub fn maximum_line_height(mut self, value: f32) -> Self {
        self.typography.maximum_line_height = Some(value);
        self
    }

    pub fn line_height_multiple(mut self, value: f32) -> Self {
        self.typography.line_height_multiple = Some(value);
        self
    }

    pub fn hyphenation_factor(mut self, value: f32) -> Self {
        self.typography.hyphenation_factor = Some(value);
        self
    }

    pub fn base_writing_direction(mut self, value: WritingDirection) -> Self {
        self.typography.base_writing_direction = Some(value);
        self
    }

    pub fn tracking(mut self, tracking: Tracking) -> Self {
        self.tracking = Some(tracking);
        self
    }

    /// Append a shaping feature. Re-adding an identical flag moves it to the end.
    pub fn feature(mut self, flag: FeatureFlag) -> Self {
        self.features.retain(|existing| *existing != flag);
        self.features.push(flag);
        self
    }

    pub fn number_case(self, value: NumberCase) -> Self {
        self.feature(FeatureFlag::NumberCase(value))
    }

    pub fn number_spacing(self, value: NumberSpacing) -> Self {
        self.feature(FeatureFlag::NumberSpacing(value))
    }

    pub fn fractions(self, value: Fractions) -> Self {
        self.feature(FeatureFlag::Fractions(value))
    }

    pub fn vertical_position(self, value: VerticalPosition) -> Self {
        self.feature(FeatureFlag::VerticalPosition(value))
    }

    pub fn small_caps(self, value: SmallCaps) -> Self {
        self.feature(FeatureFlag::SmallCaps(value))
    }

    pub fn contextual_alternates(self, value: ContextualAlternates) -> Self {
        self.feature(FeatureFlag::ContextualAlternates(value))
    }

    pub fn stylistic_alternatives(self, value: StylisticAlternatives) -> Self {
        self.feature(FeatureFlag::StylisticAlternatives(value))
    }

    pub fn emphasis(mut self, emphasis: Emphasis) -> Self {
        self.emphasis.insert(emphasis);
        self
    }

    pub fn dynamic_text(mut self, dynamic: DynamicText) -> Self {
        self.dynamic_text = Some(dynamic);
        self
    }
}

fn dedup_keep_last(features: &mut Vec<FeatureFlag>) {
    let mut idx = 0;
    while idx < features.len() {
        let flag = features[idx];
        if features[idx + 1..].contains(&flag) {
            features.remove(idx);
        } else {
            idx += 1;
        }
    }
}
