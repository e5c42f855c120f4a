//! Tag-driven style cascade resolver.
//!
//! `styled-markup` turns lightweight markup such as
//! `Hello <b>bold <i>and italic</i></b>` plus a [`StyleTable`] of named styles
//! into [`RichText`]: ordered runs of text, each carrying the fully inherited
//! set of display attributes.
//!
//! ```
//! use styled_markup::{Color, Emphasis, MarkupStyler, StyleNode, StyleTable};
//!
//! let table = StyleTable::new()
//!     .with("b", StyleNode::new().emphasis(Emphasis::Bold))
//!     .with("red", StyleNode::new().color(Color::rgba(1.0, 0.0, 0.0, 1.0)));
//! let styler = MarkupStyler::new(table);
//! let text = styler.resolve("plain <red>red <b>red bold</b></red>").unwrap();
//! assert_eq!(text.runs().len(), 3);
//! assert_eq!(text.text(), "plain red red bold");
//! ```
//!
//! The pieces can also be driven directly: [`PreparedMarkup`] and
//! [`MarkupReader`] tokenize into [`MarkupEvent`]s, and [`CascadeResolver`]
//! consumes them.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod attributes;
pub mod emphasis;
pub mod error;
pub mod features;
pub mod font;
pub mod markup;
pub mod position;
pub mod resolver;
pub mod rich_text;
pub mod style;
pub mod styler;
pub mod table;
pub mod typography;

pub use attributes::{
    AttachmentBounds, AttributeKey, AttributeMap, AttributeValue, Color, Shadow, TextAttachment,
};
pub use emphasis::{Emphasis, EmphasisFlags};
pub use error::{ErrorClass, ResolveError, ResolveErrorContext, ResolveErrorKind};
pub use features::{
    encode_feature_settings, ContextualAlternates, FeatureFlag, FeatureSetting, FeatureSettings,
    Fractions, NumberCase, NumberSpacing, SmallCaps, StylisticAlternatives, VerticalPosition,
};
pub use font::{Font, FontSource, SymbolicTraits, SystemFonts};
pub use markup::{MarkupEvent, MarkupReader, ParsingOptions, PreparedMarkup, DEFAULT_ROOT_TAG};
pub use position::{unwrap_coordinates, SourcePosition};
pub use resolver::{CascadeResolver, ResolverState};
pub use rich_text::{RichText, TagInstance, TextRun};
pub use style::{DynamicText, EncodeDefaults, StyleNode};
pub use styler::{MarkupStyler, ResolveLimits, ResolveOptions};
pub use table::{MediaAttachment, StyleEntry, StyleTable, ATTACHMENT_CHARACTER};
pub use typography::{
    LineBreakMode, ParagraphStyle, TextAlignment, Tracking, TypographyDescriptor,
    WritingDirection,
};
