//! Resolve orchestration: options, table and font source in, rich text out.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::font::{FontSource, SystemFonts};
use crate::markup::{ParsingOptions, PreparedMarkup};
use crate::resolver::CascadeResolver;
use crate::rich_text::RichText;
use crate::style::EncodeDefaults;
use crate::table::StyleTable;

/// Hard resource limits for one resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveLimits {
    /// Maximum markup size in bytes, before wrapping.
    pub max_input_bytes: usize,
    /// Maximum number of simultaneously open tags.
    pub max_nesting: usize,
    /// Maximum bytes of a single raw tag attribute value.
    pub max_attribute_bytes: usize,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 4 * 1024 * 1024,
            max_nesting: 64,
            max_attribute_bytes: 16 * 1024,
        }
    }
}

/// Styler options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResolveOptions {
    /// Wrapping and root-tag options.
    pub parsing: ParsingOptions,
    /// Hard limits.
    pub limits: ResolveLimits,
    /// Values filled in when runs are encoded.
    pub defaults: EncodeDefaults,
}

/// Resolves markup against a shared [`StyleTable`].
///
/// The styler holds no per-document state, so one instance can serve any
/// number of resolves, including concurrent ones when `F` is `Sync`.
#[derive(Clone, Debug)]
pub struct MarkupStyler<F = SystemFonts> {
    table: Arc<StyleTable>,
    fonts: F,
    options: ResolveOptions,
}

impl MarkupStyler<SystemFonts> {
    /// Create a styler using [`SystemFonts`] and default options.
    pub fn new(table: impl Into<Arc<StyleTable>>) -> Self {
        Self {
            table: table.into(),
            fonts: SystemFonts::default(),
            options: ResolveOptions::default(),
        }
    }
}

impl<F: FontSource> MarkupStyler<F> {
    /// Swap the font source.
    pub fn with_fonts<G: FontSource>(self, fonts: G) -> MarkupStyler<G> {
        MarkupStyler {
            table: self.table,
            fonts,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_parsing(mut self, parsing: ParsingOptions) -> Self {
        self.options.parsing = parsing;
        self
    }

    pub fn table(&self) -> &StyleTable {
        &self.table
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve `input` into a new [`RichText`].
    pub fn resolve(&self, input: &str) -> Result<RichText, ResolveError> {
        let mut out = RichText::new();
        self.resolve_into(input, &mut out)?;
        Ok(out)
    }

    /// Resolve `input`, appending to `out`.
    ///
    /// On error `out` is left exactly as it was passed in.
    pub fn resolve_into(&self, input: &str, out: &mut RichText) -> Result<(), ResolveError> {
        let limits = self.options.limits;
        if input.len() > limits.max_input_bytes {
            return Err(ResolveError::limit(
                "max_input_bytes",
                input.len(),
                limits.max_input_bytes,
            ));
        }

        let prepared = PreparedMarkup::new(input, &self.options.parsing);
        let mut events = prepared.events(limits.max_attribute_bytes);
        let mut resolver =
            CascadeResolver::new(&self.table, &self.fonts, self.options.defaults, out)
                .with_max_nesting(limits.max_nesting);

        while let Some(event) = events.next() {
            let result = match event {
                Ok(event) => resolver.feed(event),
                Err(err) => Err(resolver.abort(err)),
            };
            if let Err(err) = result {
                return Err(attach_position(err, &prepared, events.token_offset()));
            }
        }
        resolver
            .finish()
            .map_err(|err| attach_position(err, &prepared, events.token_offset()))
    }

    /// Resolve `input`, falling back to the raw input as one unstyled run.
    pub fn resolve_or_plain(&self, input: &str) -> RichText {
        match self.resolve(input) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("markup resolve failed, using unstyled text: {}", err);
                RichText::plain(input)
            }
        }
    }
}

fn attach_position(err: ResolveError, prepared: &PreparedMarkup<'_>, fallback: usize) -> ResolveError {
    let offset = err.token_offset().unwrap_or(fallback);
    let position = prepared.position(offset);
    let err = if err.token_offset().is_none() {
        err.with_token_offset(offset)
    } else {
        err
    };
    err.with_position(position)
}
