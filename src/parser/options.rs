//! Parsing options and configuration.

use crate::model::DEFAULT_FONT_SIZE;

/// Options for reading and classifying SVG documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to NFC-normalize extracted text
    pub normalize_unicode: bool,

    /// Font size (user units) when no ancestor sets one
    pub default_font_size: f64,

    /// Maximum `use` indirections followed for bounding boxes
    pub max_use_depth: usize,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (bad transforms degrade to identity).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable Unicode normalization.
    pub fn with_normalize_unicode(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Set the fallback font size in user units.
    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }

    /// Set the `use` recursion limit.
    pub fn with_max_use_depth(mut self, depth: usize) -> Self {
        self.max_use_depth = depth;
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.error_mode == ErrorMode::Lenient
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            normalize_unicode: true,
            default_font_size: DEFAULT_FONT_SIZE,
            max_use_depth: 8,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Replace unusable transforms with identity and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .with_normalize_unicode(false)
            .with_default_font_size(12.0)
            .with_max_use_depth(2);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.is_lenient());
        assert!(!options.normalize_unicode);
        assert_eq!(options.default_font_size, 12.0);
        assert_eq!(options.max_use_depth, 2);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.normalize_unicode);
        assert_eq!(options.default_font_size, 16.0);
    }
}
