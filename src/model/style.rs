//! Resolved text style and CSS property parsing.
//!
//! Style is resolved once per element during the top-down walk: a child's
//! style is its parent's resolved style with the child's own presentation
//! attributes and `style` declarations applied on top.

use super::Element;
use crate::geometry::{parse_length, LengthUnit};
use serde::{Deserialize, Serialize};
use svgtypes::{Paint, PaintFallback};

/// Font size used when nothing in the ancestor chain sets one (`medium`).
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "start" => Some(TextAnchor::Start),
            "middle" => Some(TextAnchor::Middle),
            "end" => Some(TextAnchor::End),
            _ => None,
        }
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" => Some(FontStyle::Oblique),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    /// Parse a CSS color: hex, `rgb()`, `rgba()`, `hsl()`, `hsla()` or a
    /// keyword.
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<svgtypes::Color>().ok().map(Color::from)
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// `#rrggbb`, or `#rrggbbaa` when translucent
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<svgtypes::Color> for Color {
    fn from(c: svgtypes::Color) -> Self {
        Color {
            r: c.red,
            g: c.green,
            b: c.blue,
            a: c.alpha,
        }
    }
}

/// Inherited text properties of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    /// Font family list, unquoted, in priority order
    pub font_family: Vec<String>,

    /// Font size in user units
    pub font_size: f64,

    /// CSS weight, 100..=900
    pub font_weight: u16,

    pub font_style: FontStyle,

    /// Fill color; `None` for `fill="none"`
    pub fill: Option<Color>,

    /// CSS `color`, the value of `currentColor`
    #[serde(default)]
    pub color: Color,

    /// `fill` is `currentColor` and follows `color`
    #[serde(default)]
    pub fill_current_color: bool,

    pub text_anchor: TextAnchor,

    /// `visibility` is not `visible`
    pub hidden: bool,

    /// `xml:space="preserve"` is in effect
    pub preserve_space: bool,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            font_family: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: 400,
            font_style: FontStyle::Normal,
            fill: Some(Color::BLACK),
            color: Color::BLACK,
            fill_current_color: false,
            text_anchor: TextAnchor::Start,
            hidden: false,
            preserve_space: false,
        }
    }
}

impl ResolvedStyle {
    /// A style with a different default font size.
    pub fn with_font_size(font_size: f64) -> Self {
        Self {
            font_size,
            ..Self::default()
        }
    }

    /// Compute the style of `element`, a child of an element with style
    /// `self`. Unparsable values keep the inherited value.
    pub fn derive(&self, element: &Element) -> ResolvedStyle {
        let mut style = self.clone();
        if let Some(space) = element.attr("xml:space") {
            style.preserve_space = space == "preserve";
        }
        for (name, value) in declarations(element) {
            style.apply(&name, &value, self);
        }
        if style.fill_current_color {
            style.fill = Some(style.color);
        }
        style
    }

    fn apply(&mut self, name: &str, value: &str, parent: &ResolvedStyle) {
        let value = value.trim();
        if value == "inherit" {
            return;
        }
        match name {
            "font-family" => {
                let families = parse_font_family(value);
                if !families.is_empty() {
                    self.font_family = families;
                }
            }
            "font-size" => {
                if let Some(size) = parse_font_size(value, parent.font_size) {
                    self.font_size = size;
                }
            }
            "font-weight" => {
                if let Some(weight) = parse_font_weight(value, parent.font_weight) {
                    self.font_weight = weight;
                }
            }
            "font-style" => {
                if let Some(style) = FontStyle::parse(value) {
                    self.font_style = style;
                }
            }
            "fill" => match Paint::from_str(value) {
                Ok(Paint::None) => self.set_fill(None),
                Ok(Paint::Color(color)) => self.set_fill(Some(color.into())),
                Ok(Paint::CurrentColor) => self.fill_current_color = true,
                Ok(Paint::FuncIRI(_, Some(fallback))) => match fallback {
                    PaintFallback::None => self.set_fill(None),
                    PaintFallback::CurrentColor => self.fill_current_color = true,
                    PaintFallback::Color(color) => self.set_fill(Some(color.into())),
                },
                Ok(Paint::FuncIRI(link, None)) => {
                    log::debug!("Paint server #{} on text; keeping the inherited fill", link)
                }
                Ok(Paint::Inherit) | Err(_) => {}
            },
            "color" => {
                if let Some(color) = Color::parse(value) {
                    self.color = color;
                }
            }
            "text-anchor" => {
                if let Some(anchor) = TextAnchor::parse(value) {
                    self.text_anchor = anchor;
                }
            }
            "visibility" => self.hidden = value != "visible",
            _ => {}
        }
    }

    fn set_fill(&mut self, fill: Option<Color>) {
        self.fill = fill;
        self.fill_current_color = false;
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }
}

/// Presentation attributes followed by `style` declarations, so that the
/// latter win when applied in order.
pub fn declarations(element: &Element) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = element
        .attributes
        .iter()
        .filter(|(k, _)| k.as_str() != "style")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(style) = element.attr("style") {
        out.extend(parse_style_attribute(style));
    }
    out
}

/// Split a `style` attribute into `(property, value)` pairs.
pub fn parse_style_attribute(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim().trim_end_matches("!important").trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

/// Look up a single property, `style` winning over the attribute.
pub fn property(element: &Element, name: &str) -> Option<String> {
    let from_style = element.attr("style").and_then(|style| {
        parse_style_attribute(style)
            .into_iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    });
    from_style.or_else(|| element.attr(name).map(|v| v.trim().to_string()))
}

/// `display: none` on this element.
pub fn is_display_none(element: &Element) -> bool {
    property(element, "display").as_deref() == Some("none")
}

fn parse_font_family(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_font_size(value: &str, parent: f64) -> Option<f64> {
    let keyword = match value {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(DEFAULT_FONT_SIZE),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "larger" => Some(parent * 1.2),
        "smaller" => Some(parent / 1.2),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    let length = parse_length(value)?;
    let size = match length.unit {
        LengthUnit::Percent => length.value / 100.0 * parent,
        _ => length.to_px_relative(parent, parent),
    };
    (size >= 0.0).then_some(size)
}

fn parse_font_weight(value: &str, parent: u16) -> Option<u16> {
    match value {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some((parent + 300).min(900)),
        "lighter" => Some(parent.saturating_sub(300).max(100)),
        _ => value
            .parse::<u16>()
            .ok()
            .filter(|w| (1..=1000).contains(w)),
    }
}

/// Per-run `baseline-shift` in user units; positive values raise the
/// text. Not inherited.
pub fn baseline_shift(element: &Element, font_size: f64) -> f64 {
    match property(element, "baseline-shift").as_deref() {
        Some("super") => font_size * 0.4,
        Some("sub") => -font_size * 0.2,
        Some("baseline") | None => 0.0,
        Some(other) => parse_length(other)
            .map(|l| l.to_px_relative(font_size, font_size))
            .unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = ResolvedStyle::default();
        assert_eq!(style.font_size, 16.0);
        assert_eq!(style.text_anchor, TextAnchor::Start);
        assert_eq!(style.fill, Some(Color::BLACK));
        assert!(style.font_family.is_empty());
    }

    #[test]
    fn test_style_overrides_attribute() {
        let el = Element::new("text")
            .with_attr("font-size", "10")
            .with_attr("style", "font-size:12px;text-anchor:middle");
        let style = ResolvedStyle::default().derive(&el);
        assert_eq!(style.font_size, 12.0);
        assert_eq!(style.text_anchor, TextAnchor::Middle);
    }

    #[test]
    fn test_inheritance_and_relative_size() {
        let g = Element::new("g").with_attr("style", "font-size:20px;font-weight:bold");
        let tspan = Element::new("tspan").with_attr("font-size", "50%");
        let parent = ResolvedStyle::default().derive(&g);
        let child = parent.derive(&tspan);
        assert_eq!(child.font_size, 10.0);
        assert!(child.is_bold());

        let em = Element::new("tspan").with_attr("style", "font-size:1.5em");
        assert_eq!(parent.derive(&em).font_size, 30.0);
    }

    #[test]
    fn test_invalid_values_keep_inherited() {
        let el = Element::new("text")
            .with_attr("font-size", "huge")
            .with_attr("text-anchor", "sideways");
        let style = ResolvedStyle::default().derive(&el);
        assert_eq!(style.font_size, 16.0);
        assert_eq!(style.text_anchor, TextAnchor::Start);
    }

    #[test]
    fn test_font_family_list() {
        let el = Element::new("text").with_attr("style", "font-family:'DejaVu Sans', sans-serif");
        let style = ResolvedStyle::default().derive(&el);
        assert_eq!(style.font_family, vec!["DejaVu Sans", "sans-serif"]);
    }

    #[test]
    fn test_unit_font_size() {
        let el = Element::new("text").with_attr("font-size", "12pt");
        assert!((ResolvedStyle::default().derive(&el).font_size - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_colors() {
        assert_eq!(Color::parse("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#00ff7f").unwrap().to_hex(), "#00ff7f");
        assert_eq!(Color::parse("rgb(0, 128, 255)"), Some(Color::rgb(0, 128, 255)));
        assert_eq!(Color::parse("rgb(100%,0%,0%)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("Navy"), Some(Color::rgb(0, 0, 128)));
        assert_eq!(Color::parse("darkblue"), Some(Color::rgb(0, 0, 139)));
        assert_eq!(Color::parse("rgba(255, 0, 0, 1)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("hsl(120, 100%, 50%)"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::parse("url(#grad)"), None);
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn test_translucent_hex() {
        let color = Color::parse("rgba(0, 0, 255, 0)").unwrap();
        assert!(!color.is_opaque());
        assert_eq!(color.to_hex(), "#0000ff00");
    }

    #[test]
    fn test_fill_keywords_and_functions() {
        let fill = |value: &str| {
            let el = Element::new("text").with_attr("fill", value);
            ResolvedStyle::default().derive(&el).fill
        };
        assert_eq!(fill("darkblue"), Some(Color::rgb(0, 0, 139)));
        assert_eq!(fill("hsl(120,100%,50%)"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(fill("url(#grad) #ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(fill("url(#grad)"), Some(Color::BLACK));
        assert_eq!(fill("url(#grad) none"), None);
    }

    #[test]
    fn test_fill_current_color_follows_color() {
        let g = Element::new("g").with_attr("style", "fill:currentColor;color:#00ff00");
        let parent = ResolvedStyle::default().derive(&g);
        assert_eq!(parent.fill, Some(Color::rgb(0, 255, 0)));

        let tspan = Element::new("tspan").with_attr("color", "blue");
        assert_eq!(parent.derive(&tspan).fill, Some(Color::rgb(0, 0, 255)));

        let red = Element::new("tspan").with_attr("fill", "red");
        let child = parent.derive(&red);
        assert_eq!(child.fill, Some(Color::rgb(255, 0, 0)));
        assert!(!child.fill_current_color);
    }

    #[test]
    fn test_fill_none_and_visibility() {
        let el = Element::new("text").with_attr("style", "fill:none;visibility:hidden");
        let style = ResolvedStyle::default().derive(&el);
        assert_eq!(style.fill, None);
        assert!(style.hidden);
    }

    #[test]
    fn test_display_none() {
        assert!(is_display_none(&Element::new("g").with_attr("style", "display:none")));
        assert!(is_display_none(&Element::new("g").with_attr("display", "none")));
        assert!(!is_display_none(
            &Element::new("g")
                .with_attr("display", "none")
                .with_attr("style", "display:inline")
        ));
    }

    #[test]
    fn test_baseline_shift() {
        let sup = Element::new("tspan").with_attr("style", "baseline-shift:super");
        assert_eq!(baseline_shift(&sup, 10.0), 4.0);
        let len = Element::new("tspan").with_attr("baseline-shift", "-3");
        assert_eq!(baseline_shift(&len, 10.0), -3.0);
        assert_eq!(baseline_shift(&Element::new("tspan"), 10.0), 0.0);
    }

    #[test]
    fn test_xml_space() {
        let el = Element::new("text").with_attr("xml:space", "preserve");
        assert!(ResolvedStyle::default().derive(&el).preserve_space);
    }
}
