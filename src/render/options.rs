//! Rendering options and configuration.

use crate::model::Frame;

/// Default name of the generated Typst function.
pub const DEFAULT_FUNCTION_NAME: &str = "diagram";

/// Options for producing the companion script.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Name of the `#let` function in the script
    pub function_name: String,

    /// Rectangle the figure occupies
    pub frame: Frame,

    /// How label text is written into the script
    pub text_mode: TextMode,

    /// Whether font families are forwarded
    pub font_family_mode: FontFamilyMode,

    /// Decimal places for lengths and angles
    pub precision: usize,

    /// Path of the cleaned SVG as referenced by the script. Defaults to
    /// the cleaned file name next to the script.
    pub image_path: Option<String>,

    /// Name of the source file, mentioned in the script header
    pub source_name: Option<String>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Typst function name.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Set the figure frame.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Set the text mode.
    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    /// Escape all markup in labels.
    pub fn literal(mut self) -> Self {
        self.text_mode = TextMode::Literal;
        self
    }

    /// Set the font family mode.
    pub fn with_font_family_mode(mut self, mode: FontFamilyMode) -> Self {
        self.font_family_mode = mode;
        self
    }

    /// Set the number of decimal places (clamped to 1..=10).
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision.clamp(1, 10);
        self
    }

    /// Set the image path written into the script.
    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    /// Set the source file name for the script header.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            frame: Frame::Graphics,
            text_mode: TextMode::Markup,
            font_family_mode: FontFamilyMode::Inherit,
            precision: 4,
            image_path: None,
            source_name: None,
        }
    }
}

/// How label text is written into the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Verbatim; labels may use Typst markup and `$math$`
    #[default]
    Markup,
    /// Every markup character escaped
    Literal,
}

/// Whether font families from the drawing are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamilyMode {
    /// Use the host document's font
    #[default]
    Inherit,
    /// Emit family names verbatim
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_function_name("fig")
            .with_frame(Frame::Viewport)
            .literal()
            .with_font_family_mode(FontFamilyMode::PassThrough)
            .with_precision(20)
            .with_image_path("out/fig_clean.svg");

        assert_eq!(options.function_name, "fig");
        assert_eq!(options.frame, Frame::Viewport);
        assert_eq!(options.text_mode, TextMode::Literal);
        assert_eq!(options.font_family_mode, FontFamilyMode::PassThrough);
        assert_eq!(options.precision, 10);
        assert_eq!(options.image_path.as_deref(), Some("out/fig_clean.svg"));
    }

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.function_name, "diagram");
        assert_eq!(options.frame, Frame::Graphics);
        assert_eq!(options.text_mode, TextMode::Markup);
        assert_eq!(options.font_family_mode, FontFamilyMode::Inherit);
    }
}
