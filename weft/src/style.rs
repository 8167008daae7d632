//! Text style attributes and the two-pass merge into surface-native form.
//!
//! Styles arrive in two layers. Fragment producers set only what they mean
//! explicitly (a `TextStyle` with mostly-unset fields); everything else comes
//! from an explicit `StyleDefaults` configuration passed to the aggregator.
//! The aggregator runs two ordered passes over every run: first
//! [`TextStyle::merge_defaults`] fills unset fields from the defaults without
//! ever overwriting an explicit value, then [`TextStyle::resolve`] converts
//! the merged style into a [`ResolvedStyle`] where every field is concrete,
//! the attribute namespace the text surface consumes.

use crate::primitives::Color;

/// Font family specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Monospace,
    SansSerif,
    Serif,
    Named(String),
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
    Justified,
}

/// Base writing direction for the whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// What happens to text that does not fit the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truncation {
    /// Wrap onto further lines; never drop content.
    #[default]
    Wrap,
    /// Clip at the container edge.
    Clip,
    /// Elide the tail of the last line.
    Tail,
}

/// Per-run style attributes as set by a fragment producer.
///
/// Valued attributes are `Option`: `None` means "inherit the default", and
/// the defaults merge never replaces a `Some`. Flag attributes (bold, italic,
/// underline, strikethrough) are plain booleans; defaults do not carry them,
/// so there is nothing to merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub family: Option<FontFamily>,
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    /// Per-pair kerning adjustment in points.
    pub kerning: Option<f32>,
    /// Uniform letter spacing in points.
    pub tracking: Option<f32>,
    /// Vertical shift off the baseline in points (positive = up).
    pub baseline_offset: Option<f32>,
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(mut self, family: FontFamily) -> Self {
        self.family = Some(family);
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn line_height(mut self, height: f32) -> Self {
        self.line_height = Some(height);
        self
    }

    pub fn foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn kerning(mut self, kerning: f32) -> Self {
        self.kerning = Some(kerning);
        self
    }

    pub fn tracking(mut self, tracking: f32) -> Self {
        self.tracking = Some(tracking);
        self
    }

    pub fn baseline_offset(mut self, offset: f32) -> Self {
        self.baseline_offset = Some(offset);
        self
    }

    /// Pass 1: fill unset fields from the defaults.
    ///
    /// Explicitly-set attributes always win; the defaults only land where the
    /// producer left a field unset.
    pub fn merge_defaults(&self, defaults: &StyleDefaults) -> TextStyle {
        TextStyle {
            family: self
                .family
                .clone()
                .or_else(|| Some(defaults.family.clone())),
            font_size: self.font_size.or(Some(defaults.font_size)),
            line_height: self.line_height.or(Some(defaults.line_height)),
            foreground: self.foreground.or(Some(defaults.foreground)),
            background: self.background,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strikethrough: self.strikethrough,
            kerning: self.kerning,
            tracking: self.tracking,
            baseline_offset: self.baseline_offset,
        }
    }

    /// Pass 2: convert the merged style into the surface-native namespace.
    ///
    /// Any field still unset after the merge falls back to the defaults, so
    /// the result is concrete regardless of input.
    pub fn resolve(&self, defaults: &StyleDefaults) -> ResolvedStyle {
        ResolvedStyle {
            family: self
                .family
                .clone()
                .unwrap_or_else(|| defaults.family.clone()),
            font_size: self.font_size.unwrap_or(defaults.font_size),
            line_height: self.line_height.unwrap_or(defaults.line_height),
            foreground: self.foreground.unwrap_or(defaults.foreground),
            background: self.background,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strikethrough: self.strikethrough,
            kerning: self.kerning.unwrap_or(0.0),
            tracking: self.tracking.unwrap_or(0.0),
            baseline_offset: self.baseline_offset.unwrap_or(0.0),
        }
    }
}

/// Fully-resolved run attributes as consumed by the text surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub family: FontFamily,
    pub font_size: f32,
    pub line_height: f32,
    pub foreground: Color,
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub kerning: f32,
    pub tracking: f32,
    pub baseline_offset: f32,
}

impl ResolvedStyle {
    /// Re-express this resolved style as an explicit [`TextStyle`].
    ///
    /// Used when extracted text leaves the crate: every attribute is carried
    /// explicitly so the destination surface needs no context to render it.
    pub fn to_text_style(&self) -> TextStyle {
        TextStyle {
            family: Some(self.family.clone()),
            font_size: Some(self.font_size),
            line_height: Some(self.line_height),
            foreground: Some(self.foreground),
            background: self.background,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strikethrough: self.strikethrough,
            kerning: Some(self.kerning),
            tracking: Some(self.tracking),
            baseline_offset: Some(self.baseline_offset),
        }
    }
}

/// Block-wide style configuration.
///
/// Every recognized option is enumerated here and passed into the aggregator
/// explicitly; nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub family: FontFamily,
    pub font_size: f32,
    /// Line height in pixels.
    pub line_height: f32,
    /// Extra spacing between lines, on top of line height.
    pub line_spacing: f32,
    pub foreground: Color,
    pub align: TextAlign,
    pub direction: WritingDirection,
    pub truncation: Truncation,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            family: FontFamily::SansSerif,
            font_size: 14.0,
            line_height: 20.0,
            line_spacing: 0.0,
            foreground: Color::BLACK,
            align: TextAlign::Start,
            direction: WritingDirection::LeftToRight,
            truncation: Truncation::Wrap,
        }
    }
}
