//! Emphasis variants and their symbolic trait mapping.

use crate::font::SymbolicTraits;

/// A single emphasis variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emphasis {
    /// Italic.
    Italic,
    /// Bold.
    Bold,
    /// Expanded width.
    Expanded,
    /// Condensed width.
    Condensed,
    /// Monospaced glyphs.
    Monospace,
    /// Vertical glyph forms.
    Vertical,
    /// UI-optimized rendering.
    UiOptimized,
    /// Tighter leading.
    TightLeading,
    /// Looser leading.
    LooseLeading,
}

impl Emphasis {
    /// All variants in bit order.
    pub const ALL: [Emphasis; 9] = [
        Emphasis::Italic,
        Emphasis::Bold,
        Emphasis::Expanded,
        Emphasis::Condensed,
        Emphasis::Monospace,
        Emphasis::Vertical,
        Emphasis::UiOptimized,
        Emphasis::TightLeading,
        Emphasis::LooseLeading,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Symbolic trait bit for this variant.
    pub const fn symbolic_trait(self) -> SymbolicTraits {
        match self {
            Emphasis::Italic => SymbolicTraits::ITALIC,
            Emphasis::Bold => SymbolicTraits::BOLD,
            Emphasis::Expanded => SymbolicTraits::EXPANDED,
            Emphasis::Condensed => SymbolicTraits::CONDENSED,
            Emphasis::Monospace => SymbolicTraits::MONO_SPACE,
            Emphasis::Vertical => SymbolicTraits::VERTICAL,
            Emphasis::UiOptimized => SymbolicTraits::UI_OPTIMIZED,
            Emphasis::TightLeading => SymbolicTraits::TIGHT_LEADING,
            Emphasis::LooseLeading => SymbolicTraits::LOOSE_LEADING,
        }
    }
}

/// Set of [`Emphasis`] variants.
///
/// Sets only ever grow: combining two styles takes the union, there is no way
/// for a child style to switch off an emphasis its parent turned on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EmphasisFlags(u16);

impl EmphasisFlags {
    /// Empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Set with one variant.
    pub const fn only(emphasis: Emphasis) -> Self {
        Self(emphasis.bit())
    }

    /// Add a variant.
    pub fn insert(&mut self, emphasis: Emphasis) {
        self.0 |= emphasis.bit();
    }

    /// Builder form of [`insert`](Self::insert).
    pub const fn with(self, emphasis: Emphasis) -> Self {
        Self(self.0 | emphasis.bit())
    }

    /// Whether `emphasis` is present.
    pub const fn contains(self, emphasis: Emphasis) -> bool {
        self.0 & emphasis.bit() != 0
    }

    /// Whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set union.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Iterate variants in bit order.
    pub fn iter(self) -> impl Iterator<Item = Emphasis> {
        Emphasis::ALL
            .into_iter()
            .filter(move |emphasis| self.contains(*emphasis))
    }

    /// Symbolic trait bits for every variant in the set.
    pub fn symbolic_traits(self) -> SymbolicTraits {
        self.iter()
            .fold(SymbolicTraits::EMPTY, |acc, e| acc | e.symbolic_trait())
    }
}

impl FromIterator<Emphasis> for EmphasisFlags {
    fn from_iter<T: IntoIterator<Item = Emphasis>>(iter: T) -> Self {
        let mut flags = Self::empty();
        for emphasis in iter {
            flags.insert(emphasis);
        }
        flags
    }
}

impl From<Emphasis> for EmphasisFlags {
    fn from(emphasis: Emphasis) -> Self {
        Self::only(emphasis)
    }
}
