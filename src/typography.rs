//! Paragraph layout fields and tracking.
//!
//! [`TypographyDescriptor`] keeps every field optional so that a child style
//! can leave a field unset and inherit it. Absolute defaults only appear in
//! [`ParagraphStyle`], which is produced once per encoded run.

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlignment {
    /// Follow the writing direction.
    #[default]
    Natural,
    /// Flush left.
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Fully justified.
    Justified,
}

/// Line truncation and wrapping mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineBreakMode {
    /// Wrap at word boundaries.
    #[default]
    WordWrapping,
    /// Wrap at character boundaries.
    CharWrapping,
    /// Clip overflowing text.
    Clipping,
    /// Truncate with an ellipsis at the start.
    TruncatingHead,
    /// Truncate with an ellipsis at the end.
    TruncatingTail,
    /// Truncate with an ellipsis in the middle.
    TruncatingMiddle,
}

/// Base writing direction of a paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WritingDirection {
    /// Determined from content.
    #[default]
    Natural,
    /// Left to right.
    LeftToRight,
    /// Right to left.
    RightToLeft,
}

/// Letter spacing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tracking {
    /// Absolute spacing in points.
    Point(f32),
    /// Spacing in thousandths of an em, as typed into design tools.
    Adobe(f32),
}

impl Tracking {
    /// Kern value in points for a font of `point_size`.
    pub fn kerning(self, point_size: f32) -> f32 {
        match self {
            Tracking::Point(points) => points,
            Tracking::Adobe(thousandths) => point_size * (thousandths / 1000.0),
        }
    }
}

/// Inheritable paragraph fields. `None` means "take the parent's value".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TypographyDescriptor {
    /// Extra space between lines.
    pub line_spacing: Option<f32>,
    /// Space above the paragraph.
    pub paragraph_spacing_before: Option<f32>,
    /// Space below the paragraph.
    pub paragraph_spacing_after: Option<f32>,
    /// Horizontal alignment.
    pub alignment: Option<TextAlignment>,
    /// Leading indent of the first line.
    pub first_line_head_indent: Option<f32>,
    /// Leading indent of the other lines.
    pub head_indent: Option<f32>,
    /// Trailing indent; negative values measure from the trailing margin.
    pub tail_indent: Option<f32>,
    /// Wrapping and truncation.
    pub line_break_mode: Option<LineBreakMode>,
    /// Lower bound on line height, 0 for none.
    pub minimum_line_height: Option<f32>,
    /// Upper bound on line height, 0 for none.
    pub maximum_line_height: Option<f32>,
    /// Natural line height multiplier, 0 for none.
    pub line_height_multiple: Option<f32>,
    /// Hyphenation threshold in `0.0..=1.0`.
    pub hyphenation_factor: Option<f32>,
    /// Paragraph writing direction.
    pub base_writing_direction: Option<WritingDirection>,
}

impl TypographyDescriptor {
    /// Field-wise `child ?? parent`.
    pub fn combine(parent: &Self, child: &Self) -> Self {
        Self {
            line_spacing: child.line_spacing.or(parent.line_spacing),
            paragraph_spacing_before: child
                .paragraph_spacing_before
                .or(parent.paragraph_spacing_before),
            paragraph_spacing_after: child
                .paragraph_spacing_after
                .or(parent.paragraph_spacing_after),
            alignment: child.alignment.or(parent.alignment),
            first_line_head_indent: child
                .first_line_head_indent
                .or(parent.first_line_head_indent),
            head_indent: child.head_indent.or(parent.head_indent),
            tail_indent: child.tail_indent.or(parent.tail_indent),
            line_break_mode: child.line_break_mode.or(parent.line_break_mode),
            minimum_line_height: child.minimum_line_height.or(parent.minimum_line_height),
            maximum_line_height: child.maximum_line_height.or(parent.maximum_line_height),
            line_height_multiple: child.line_height_multiple.or(parent.line_height_multiple),
            hyphenation_factor: child.hyphenation_factor.or(parent.hyphenation_factor),
            base_writing_direction: child
                .base_writing_direction
                .or(parent.base_writing_direction),
        }
    }

    /// Fill unset fields with absolute defaults.
    pub fn resolve(&self) -> ParagraphStyle {
        ParagraphStyle {
            line_spacing: self.line_spacing.unwrap_or(0.0),
            paragraph_spacing_before: self.paragraph_spacing_before.unwrap_or(0.0),
            paragraph_spacing_after: self.paragraph_spacing_after.unwrap_or(0.0),
            alignment: self.alignment.unwrap_or_default(),
            first_line_head_indent: self.first_line_head_indent.unwrap_or(0.0),
            head_indent: self.head_indent.unwrap_or(0.0),
            tail_indent: self.tail_indent.unwrap_or(0.0),
            line_break_mode: self.line_break_mode.unwrap_or_default(),
            minimum_line_height: self.minimum_line_height.unwrap_or(0.0),
            maximum_line_height: self.maximum_line_height.unwrap_or(0.0),
            line_height_multiple: self.line_height_multiple.unwrap_or(0.0),
            hyphenation_factor: self.hyphenation_factor.unwrap_or(0.0),
            base_writing_direction: self.base_writing_direction.unwrap_or_default(),
        }
    }
}

/// Fully resolved paragraph attributes.
///
/// Fields mirror [`TypographyDescriptor`] with defaults filled in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParagraphStyle {
    pub line_spacing: f32,
    pub paragraph_spacing_before: f32,
    pub paragraph_spacing_after: f32,
    pub alignment: TextAlignment,
    pub first_line_head_indent: f32,
    pub head_indent: f32,
    pub tail_indent: f32,
    pub line_break_mode: LineBreakMode,
    pub minimum_line_height: f32,
    pub maximum_line_height: f32,
    pub line_height_multiple: f32,
    pub hyphenation_factor: f32,
    pub base_writing_direction: WritingDirection,
}

impl ParagraphStyle {
    /// Whether this equals the default paragraph style, in which case the
    /// attribute is not emitted.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
