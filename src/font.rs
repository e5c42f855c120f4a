//! Minimal font value types and the font collaborator seam.
//!
//! Real font objects live outside this crate. [`Font`] only carries what the
//! resolver needs to record on a run, and [`FontSource`] is the hook callers
//! implement to answer "can this font take these traits" and "how big is this
//! text style right now".

use std::ops::{BitOr, BitOrAssign};

use crate::style::DynamicText;

/// Symbolic font trait bits as understood by the shaping engine.
///
/// Bit positions follow the CoreText symbolic trait layout so values can be
/// handed to a platform font descriptor unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolicTraits(u32);

impl SymbolicTraits {
    /// No traits.
    pub const EMPTY: Self = Self(0);
    /// Italic typestyle.
    pub const ITALIC: Self = Self(1 << 0);
    /// Bold typestyle.
    pub const BOLD: Self = Self(1 << 1);
    /// Expanded typestyle.
    pub const EXPANDED: Self = Self(1 << 5);
    /// Condensed typestyle.
    pub const CONDENSED: Self = Self(1 << 6);
    /// Monospace variant.
    pub const MONO_SPACE: Self = Self(1 << 10);
    /// Vertical glyph variants and metrics.
    pub const VERTICAL: Self = Self(1 << 11);
    /// UI-optimized rendering.
    pub const UI_OPTIMIZED: Self = Self(1 << 12);
    /// Tighter leading.
    pub const TIGHT_LEADING: Self = Self(1 << 15);
    /// Looser leading.
    pub const LOOSE_LEADING: Self = Self(1 << 16);

    /// Raw bit value for the shaping engine.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits. Unknown bits are kept.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bitwise union.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for SymbolicTraits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for SymbolicTraits {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Font value recorded on a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Family or PostScript name.
    pub family: String,
    /// Point size.
    pub point_size: f32,
    /// Symbolic traits applied to the face.
    pub traits: SymbolicTraits,
}

impl Font {
    /// Create an upright, regular font.
    pub fn new(family: impl Into<String>, point_size: f32) -> Self {
        Self {
            family: family.into(),
            point_size,
            traits: SymbolicTraits::EMPTY,
        }
    }

    /// Return a copy with `traits` replacing the current traits.
    pub fn with_traits(mut self, traits: SymbolicTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Return a copy at a different point size.
    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }
}

/// Font collaborator used when a resolved style is encoded.
///
/// Implementations must be cheap to call; the resolver calls them once per
/// stack frame that ends up owning text.
pub trait FontSource {
    /// Default font used when a style sets none.
    fn system_font(&self, point_size: f32) -> Font;

    /// Apply `traits` to `font`, or return `None` when the face cannot
    /// represent the combination.
    fn with_traits(&self, font: &Font, traits: SymbolicTraits) -> Option<Font>;

    /// Scale factor for a dynamic text style at the current content size.
    fn text_style_scale(&self, _text_style: Option<&str>) -> f32 {
        1.0
    }

    /// Resize `font` for a dynamic-type style.
    ///
    /// The default multiplies by [`text_style_scale`](Self::text_style_scale)
    /// and clamps to the style's maximum point size when one is set.
    fn scaled_font(&self, font: &Font, dynamic: &DynamicText) -> Font {
        let mut size = font.point_size * self.text_style_scale(dynamic.text_style.as_deref());
        if dynamic.maximum_point_size > 0.0 {
            size = size.min(dynamic.maximum_point_size);
        }
        font.clone().with_point_size(size)
    }
}

/// Platform-neutral [`FontSource`].
///
/// Every trait combination is accepted except expanded together with
/// condensed, which no face can be at once.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemFonts {
    family: String,
}

impl SystemFonts {
    /// Family name used for [`FontSource::system_font`].
    pub const DEFAULT_FAMILY: &'static str = "system-ui";

    /// Create a source that hands out `family` as the system font.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
        }
    }
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FAMILY)
    }
}

impl FontSource for SystemFonts {
    fn system_font(&self, point_size: f32) -> Font {
        Font::new(self.family.clone(), point_size)
    }

    fn with_traits(&self, font: &Font, traits: SymbolicTraits) -> Option<Font> {
        let width = SymbolicTraits::EXPANDED | SymbolicTraits::CONDENSED;
        if traits.contains(width) {
            return None;
        }
        Some(font.clone().with_traits(traits))
    }
}
