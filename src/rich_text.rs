//! Resolved output: styled runs plus a record of the tags that produced them.

use std::ops::{Bound, Range, RangeBounds};

use crate::attributes::{AttributeKey, AttributeMap};
use crate::font::FontSource;
use crate::style::{EncodeDefaults, StyleNode};

/// Text with one fully resolved attribute map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub attributes: AttributeMap,
}

impl TextRun {
    pub fn new(text: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }

    /// Run without any attribute.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, AttributeMap::new())
    }
}

/// A closed markup tag and the output it covers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagInstance {
    /// Tag name as written.
    pub name: String,
    /// Raw tag attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Byte range of the concatenated output text produced inside the tag.
    pub range: Range<usize>,
}

/// Ordered runs of styled text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichText {
    runs: Vec<TextRun>,
    tags: Vec<TagInstance>,
    len: usize,
}

/// Sizes captured by [`RichText::mark`] for rollback.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RichTextMark {
    runs: usize,
    tags: usize,
    len: usize,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single unstyled run, or nothing for empty text.
    pub fn plain(text: impl Into<String>) -> Self {
        let mut out = Self::new();
        out.push_run(TextRun::plain(text));
        out
    }

    /// Build from runs.
    pub fn from_runs<I: IntoIterator<Item = TextRun>>(runs: I) -> Self {
        let mut out = Self::new();
        for run in runs {
            out.push_run(run);
        }
        out
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn tags(&self) -> &[TagInstance] {
        &self.tags
    }

    /// Total byte length of the text.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Concatenated text of every run.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.len);
        for run in &self.runs {
            out.push_str(&run.text);
        }
        out
    }

    /// Append a run. Empty runs are skipped.
    pub fn push_run(&mut self, run: TextRun) {
        if run.text.is_empty() {
            return;
        }
        self.len += run.text.len();
        self.runs.push(run);
    }

    /// Append every run and tag of `other`, shifting its tag ranges.
    pub fn append(&mut self, other: &RichText) {
        let base = self.len;
        for run in &other.runs {
            self.push_run(run.clone());
        }
        self.tags.extend(other.tags.iter().map(|tag| TagInstance {
            name: tag.name.clone(),
            attributes: tag.attributes.clone(),
            range: tag.range.start + base..tag.range.end + base,
        }));
    }

    pub(crate) fn push_tag(&mut self, tag: TagInstance) {
        self.tags.push(tag);
    }

    pub(crate) fn mark(&self) -> RichTextMark {
        RichTextMark {
            runs: self.runs.len(),
            tags: self.tags.len(),
            len: self.len,
        }
    }

    pub(crate) fn rollback(&mut self, mark: RichTextMark) {
        self.runs.truncate(mark.runs);
        self.tags.truncate(mark.tags);
        self.len = mark.len;
    }

    /// Call `f(tag, key, value)` for every raw attribute of every closed tag.
    ///
    /// Tags are visited in closing order, attributes in document order.
    pub fn enumerate_tag_attributes<F>(&self, mut f: F)
    where
        F: FnMut(&TagInstance, &str, &str),
    {
        for tag in &self.tags {
            for (key, value) in &tag.attributes {
                f(tag, key, value);
            }
        }
    }

    /// Split into runs and tag records.
    pub fn into_parts(self) -> (Vec<TextRun>, Vec<TagInstance>) {
        (self.runs, self.tags)
    }

    /// Overwrite `attributes` key by key on the text in `range`.
    ///
    /// Ranges are byte offsets into [`text`](Self::text), clamped to the
    /// length and moved down to the nearest character boundary. Runs that
    /// straddle a range edge are split there.
    pub fn add_attributes(&mut self, attributes: &AttributeMap, range: impl RangeBounds<usize>) {
        let range = self.byte_range(range);
        self.edit_range(range, |map| map.overwrite_with(attributes));
    }

    /// Apply the encoded attributes of `style` to the text in `range`.
    pub fn apply_style(
        &mut self,
        style: &StyleNode,
        range: impl RangeBounds<usize>,
        fonts: &dyn FontSource,
        defaults: &EncodeDefaults,
    ) {
        let encoded = style.encode(fonts, defaults);
        self.add_attributes(&encoded, range);
    }

    /// Drop `keys` from the text in `range`.
    pub fn remove_attributes(&mut self, keys: &[AttributeKey], range: impl RangeBounds<usize>) {
        let range = self.byte_range(range);
        self.edit_range(range, |map| {
            for key in keys {
                map.remove(key);
            }
        });
    }

    /// Drop every key `style` writes when encoded from the text in `range`.
    ///
    /// Values are not compared: a key set by another style is removed too.
    pub fn remove_style(&mut self, style: &StyleNode, range: impl RangeBounds<usize>) {
        let keys = style.encoded_keys();
        self.remove_attributes(&keys, range);
    }

    fn byte_range(&self, range: impl RangeBounds<usize>) -> Range<usize> {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => self.len,
        };
        start.min(self.len)..end.min(self.len)
    }

    fn edit_range<F>(&mut self, range: Range<usize>, mut edit: F)
    where
        F: FnMut(&mut AttributeMap),
    {
        if range.start >= range.end {
            return;
        }
        let runs = std::mem::take(&mut self.runs);
        let mut out = Vec::with_capacity(runs.len() + 2);
        let mut offset = 0;
        for run in runs {
            let start = offset;
            let end = start + run.text.len();
            offset = end;
            if end <= range.start || start >= range.end {
                out.push(run);
                continue;
            }
            let from = floor_char_boundary(&run.text, range.start.saturating_sub(start));
            let to = floor_char_boundary(&run.text, range.end.min(end) - start);
            let TextRun { text, attributes } = run;
            let mut edited = attributes.clone();
            edit(&mut edited);
            if from > 0 {
                out.push(TextRun::new(&text[..from], attributes.clone()));
            }
            if to > from {
                out.push(TextRun::new(&text[from..to], edited));
            }
            if to < text.len() {
                out.push(TextRun::new(&text[to..], attributes));
            }
        }
        self.runs = out;
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
