//! Typed font shaping features and their integer selector encoding.
//!
//! Every [`FeatureFlag`] expands to one or more `(type, selector)` pairs using
//! the AAT feature registry numbering. A list of pairs is packed into a single
//! [`FeatureSettings`] attribute by [`encode_feature_settings`].

use smallvec::SmallVec;

/// AAT `kVerticalPositionType`.
pub const VERTICAL_POSITION_TYPE: u16 = 10;
/// AAT `kNumberSpacingType`.
pub const NUMBER_SPACING_TYPE: u16 = 6;
/// AAT `kFractionsType`.
pub const FRACTIONS_TYPE: u16 = 11;
/// AAT `kNumberCaseType`.
pub const NUMBER_CASE_TYPE: u16 = 21;
/// AAT `kStylisticAlternativesType`.
pub const STYLISTIC_ALTERNATIVES_TYPE: u16 = 35;
/// AAT `kContextualAlternatesType`.
pub const CONTEXTUAL_ALTERNATES_TYPE: u16 = 36;
/// AAT `kLowerCaseType`.
pub const LOWER_CASE_TYPE: u16 = 37;
/// AAT `kUpperCaseType`.
pub const UPPER_CASE_TYPE: u16 = 38;

/// Highest stylistic alternative index.
pub const MAX_STYLISTIC_ALTERNATIVE: u8 = 20;

/// One `(type, selector)` pair handed to the shaping engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeatureSetting {
    /// Feature type identifier.
    pub feature_type: u16,
    /// Selector within the feature type.
    pub selector: u16,
}

impl FeatureSetting {
    /// Create a pair.
    pub const fn new(feature_type: u16, selector: u16) -> Self {
        Self {
            feature_type,
            selector,
        }
    }
}

/// Inline storage for the pairs of a single flag.
pub type FeatureSettingList = SmallVec<[FeatureSetting; 4]>;

/// Figure height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberCase {
    /// Oldstyle figures.
    Lower,
    /// Lining figures.
    Upper,
}

/// Figure width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberSpacing {
    /// Tabular figures.
    Monospaced,
    /// Proportional figures.
    Proportional,
}

/// Fraction rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fractions {
    /// No automatic fractions.
    Disabled,
    /// Vertical (stacked) fractions.
    Vertical,
    /// Diagonal fractions.
    Diagonal,
}

/// Glyph vertical position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerticalPosition {
    /// Baseline glyphs.
    Normal,
    /// Superscript glyphs.
    Superscript,
    /// Subscript glyphs.
    Subscript,
    /// Ordinal forms.
    Ordinals,
    /// Scientific inferiors.
    ScientificInferiors,
}

/// Small-caps substitution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SmallCaps {
    /// Reset both upper- and lowercase substitution.
    Disabled,
    /// Replace uppercase letters with small caps.
    FromUppercase,
    /// Replace lowercase letters with small caps.
    FromLowercase,
}

/// Contextual alternate switches. Always encodes all three on/off pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContextualAlternates {
    /// Contextual alternates.
    pub contextual: bool,
    /// Swash alternates.
    pub swash: bool,
    /// Contextual swash alternates.
    pub contextual_swash: bool,
}

/// Set of enabled stylistic alternatives, indexed 1 through 20.
///
/// Encodes one on/off pair per alternative, so disabled alternatives are
/// switched off explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StylisticAlternatives(u32);

impl StylisticAlternatives {
    /// No alternative enabled.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Enable alternative `index`. Indices outside `1..=20` are ignored.
    pub const fn with(self, index: u8) -> Self {
        if index == 0 || index > MAX_STYLISTIC_ALTERNATIVE {
            return self;
        }
        Self(self.0 | (1 << (index - 1)))
    }

    /// Whether alternative `index` is enabled.
    pub const fn contains(self, index: u8) -> bool {
        if index == 0 || index > MAX_STYLISTIC_ALTERNATIVE {
            return false;
        }
        self.0 & (1 << (index - 1)) != 0
    }
}

/// A typed shaping feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureFlag {
    /// Figure height.
    NumberCase(NumberCase),
    /// Figure width.
    NumberSpacing(NumberSpacing),
    /// Fraction rendering.
    Fractions(Fractions),
    /// Vertical glyph position.
    VerticalPosition(VerticalPosition),
    /// Small caps.
    SmallCaps(SmallCaps),
    /// Contextual alternates.
    ContextualAlternates(ContextualAlternates),
    /// Stylistic alternatives.
    StylisticAlternatives(StylisticAlternatives),
}

fn on_off(on: bool, on_selector: u16) -> u16 {
    if on {
        on_selector
    } else {
        on_selector + 1
    }
}

impl FeatureFlag {
    /// Ordered `(type, selector)` pairs for this flag.
    pub fn settings(&self) -> FeatureSettingList {
        let mut out = FeatureSettingList::new();
        match *self {
            FeatureFlag::NumberCase(case) => {
                let selector = match case {
                    NumberCase::Lower => 0,
                    NumberCase::Upper => 1,
                };
                out.push(FeatureSetting::new(NUMBER_CASE_TYPE, selector));
            }
            FeatureFlag::NumberSpacing(spacing) => {
                let selector = match spacing {
                    NumberSpacing::Monospaced => 0,
                    NumberSpacing::Proportional => 1,
                };
                out.push(FeatureSetting::new(NUMBER_SPACING_TYPE, selector));
            }
            FeatureFlag::Fractions(fractions) => {
                let selector = match fractions {
                    Fractions::Disabled => 0,
                    Fractions::Vertical => 1,
                    Fractions::Diagonal => 2,
                };
                out.push(FeatureSetting::new(FRACTIONS_TYPE, selector));
            }
            FeatureFlag::VerticalPosition(position) => {
                let selector = match position {
                    VerticalPosition::Normal => 0,
                    VerticalPosition::Superscript => 1,
                    VerticalPosition::Subscript => 2,
                    VerticalPosition::Ordinals => 3,
                    VerticalPosition::ScientificInferiors => 4,
                };
                out.push(FeatureSetting::new(VERTICAL_POSITION_TYPE, selector));
            }
            FeatureFlag::SmallCaps(SmallCaps::Disabled) => {
                out.push(FeatureSetting::new(LOWER_CASE_TYPE, 0));
                out.push(FeatureSetting::new(UPPER_CASE_TYPE, 0));
            }
            FeatureFlag::SmallCaps(SmallCaps::FromUppercase) => {
                out.push(FeatureSetting::new(UPPER_CASE_TYPE, 1));
            }
            FeatureFlag::SmallCaps(SmallCaps::FromLowercase) => {
                out.push(FeatureSetting::new(LOWER_CASE_TYPE, 1));
            }
            FeatureFlag::ContextualAlternates(alts) => {
                for (on, on_selector) in [
                    (alts.contextual, 0),
                    (alts.swash, 2),
                    (alts.contextual_swash, 4),
                ] {
                    out.push(FeatureSetting::new(
                        CONTEXTUAL_ALTERNATES_TYPE,
                        on_off(on, on_selector),
                    ));
                }
            }
            FeatureFlag::StylisticAlternatives(alts) => {
                for index in 1..=MAX_STYLISTIC_ALTERNATIVE {
                    let on_selector = u16::from(index) * 2;
                    out.push(FeatureSetting::new(
                        STYLISTIC_ALTERNATIVES_TYPE,
                        on_off(alts.contains(index), on_selector),
                    ));
                }
            }
        }
        out
    }
}

/// Encoded feature-settings attribute value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureSettings {
    pairs: SmallVec<[FeatureSetting; 8]>,
}

impl FeatureSettings {
    /// Grouped pairs in slot order.
    pub fn decode(&self) -> &[FeatureSetting] {
        &self.pairs
    }

    /// Number of encoded pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair is encoded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Exclusive types take one slot per type. On/off types take one slot per
/// selector pair so independent switches do not overwrite each other.
fn slot(setting: FeatureSetting) -> (u16, Option<u16>) {
    match setting.feature_type {
        STYLISTIC_ALTERNATIVES_TYPE | CONTEXTUAL_ALTERNATES_TYPE => {
            (setting.feature_type, Some(setting.selector / 2))
        }
        other => (other, None),
    }
}

/// Pack pairs into one feature-settings attribute.
///
/// A later pair replaces an earlier one in the same slot; slots keep the order
/// in which they first appeared. Returns `None` for empty input so the
/// attribute is left out entirely.
pub fn encode_feature_settings<I>(pairs: I) -> Option<FeatureSettings>
where
    I: IntoIterator<Item = FeatureSetting>,
{
    let mut out = FeatureSettings::default();
    for pair in pairs {
        let key = slot(pair);
        match out.pairs.iter_mut().find(|existing| slot(**existing) == key) {
            Some(existing) => *existing = pair,
            None => out.pairs.push(pair),
        }
    }
    if out.pairs.is_empty() {
        None
    } else {
        Some(out)
    }
}
