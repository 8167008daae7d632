//! The styled buffer and the content aggregator that builds it.
//!
//! The buffer is the character-level representation the text surface lays
//! out: the concatenated fragment text, one resolved-attribute run per input
//! run, and one `U+FFFC` placeholder per widget fragment carrying its
//! attachment as a run attribute. Ranges are char-indexed throughout; mapping
//! to byte offsets is a backend concern.

use std::ops::Range;

use crate::attachment::AttachmentRef;
use crate::fragment::{Content, Fragment};
use crate::style::{ResolvedStyle, StyleDefaults, TextStyle};

/// The reserved placeholder character: one per embedded widget.
pub const PLACEHOLDER: char = '\u{FFFC}';

/// A contiguous run of characters sharing one resolved style.
#[derive(Debug, Clone)]
pub struct BufferRun {
    /// Char range into the buffer text.
    pub range: Range<usize>,
    pub style: ResolvedStyle,
    /// Set when this run is a single placeholder character.
    pub attachment: Option<AttachmentRef>,
}

/// The laid-out-able representation of aggregated content.
///
/// Invariant: placeholder count equals widget fragment count, one-to-one and
/// order-preserving.
#[derive(Debug, Clone)]
pub struct StyledBuffer {
    text: String,
    runs: Vec<BufferRun>,
    /// Char index of each placeholder, in document order.
    placeholder_offsets: Vec<usize>,
    char_len: usize,
    /// Block-wide options the surface applies to the whole paragraph.
    pub defaults: StyleDefaults,
}

impl StyledBuffer {
    /// The full buffer text, placeholders included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn full_range(&self) -> Range<usize> {
        0..self.char_len
    }

    pub fn runs(&self) -> &[BufferRun] {
        &self.runs
    }

    /// Placeholders in document order as `(char_index, attachment)`.
    pub fn placeholders(&self) -> impl Iterator<Item = (usize, &AttachmentRef)> {
        self.placeholder_offsets.iter().map(move |&offset| {
            let run = self
                .run_at(offset)
                .expect("placeholder offset always falls inside a run");
            let attachment = run
                .attachment
                .as_ref()
                .expect("placeholder run always carries its attachment");
            (offset, attachment)
        })
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholder_offsets.len()
    }

    /// The run covering a char index.
    pub fn run_at(&self, char_index: usize) -> Option<&BufferRun> {
        self.runs
            .iter()
            .find(|run| run.range.contains(&char_index))
    }

    /// The attachment whose placeholder sits at a char index, if any.
    pub fn attachment_at(&self, char_index: usize) -> Option<&AttachmentRef> {
        self.run_at(char_index)?.attachment.as_ref()
    }

    /// The character at a char index.
    pub fn char_at(&self, char_index: usize) -> Option<char> {
        self.text.chars().nth(char_index)
    }
}

/// Builds a [`StyledBuffer`] from content. Pure transform, no side effects.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    pub defaults: StyleDefaults,
}

impl Aggregator {
    pub fn new(defaults: StyleDefaults) -> Self {
        Self { defaults }
    }

    /// Concatenate fragments into one styled buffer.
    ///
    /// Every text run goes through the two ordered style passes: defaults
    /// merge (explicit values win), then resolution into the surface-native
    /// attribute namespace. Each widget fragment contributes exactly one
    /// placeholder character whose run carries the attachment.
    pub fn build(&self, content: &Content) -> StyledBuffer {
        let mut text = String::new();
        let mut runs = Vec::new();
        let mut placeholder_offsets = Vec::new();
        let mut cursor = 0usize; // in chars

        for fragment in content.fragments() {
            match fragment {
                Fragment::Plain(plain) => {
                    cursor = self.push_text_run(
                        &mut text,
                        &mut runs,
                        cursor,
                        plain,
                        &TextStyle::default(),
                    );
                }
                Fragment::Styled(styled) => {
                    for run in &styled.runs {
                        cursor = self.push_text_run(
                            &mut text,
                            &mut runs,
                            cursor,
                            &run.text,
                            &run.style,
                        );
                    }
                }
                Fragment::Widget(attachment) => {
                    text.push(PLACEHOLDER);
                    placeholder_offsets.push(cursor);
                    runs.push(BufferRun {
                        range: cursor..cursor + 1,
                        style: TextStyle::default().resolve(&self.defaults),
                        attachment: Some(attachment.clone()),
                    });
                    cursor += 1;
                }
            }
        }

        StyledBuffer {
            text,
            runs,
            placeholder_offsets,
            char_len: cursor,
            defaults: self.defaults.clone(),
        }
    }

    fn push_text_run(
        &self,
        text: &mut String,
        runs: &mut Vec<BufferRun>,
        cursor: usize,
        run_text: &str,
        style: &TextStyle,
    ) -> usize {
        if run_text.is_empty() {
            return cursor;
        }

        let merged = style.merge_defaults(&self.defaults);
        let resolved = merged.resolve(&self.defaults);
        let len = run_text.chars().count();

        text.push_str(run_text);
        runs.push(BufferRun {
            range: cursor..cursor + len,
            style: resolved,
            attachment: None,
        });
        cursor + len
    }
}
