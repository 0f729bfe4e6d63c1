//! Typst script serialization.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::geometry::PX_TO_PT;
use crate::model::{Color, Figure, FontStyle, PlacementRecord};

use super::{FontFamilyMode, RenderOptions, TextMode};

/// Characters with a meaning in Typst markup.
const MARKUP_CHARS: &[char] = &[
    '\\', '#', '$', '*', '_', '`', '<', '>', '@', '[', ']', '~', '/', '=', '-', '+', '"', '\'',
];

/// Convert a figure to a Typst script.
///
/// `image_path` is how the script refers to the cleaned SVG.
pub fn to_typst(figure: &Figure, image_path: &str, options: &RenderOptions) -> Result<String> {
    TypstWriter::new(options).render(figure, image_path)
}

/// Typst script writer.
pub struct TypstWriter<'a> {
    options: &'a RenderOptions,
}

impl<'a> TypstWriter<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    /// Render the whole script.
    pub fn render(&self, figure: &Figure, image_path: &str) -> Result<String> {
        let name = &self.options.function_name;
        if !is_identifier(name) {
            return Err(Error::Render(format!(
                "'{}' is not a valid Typst identifier",
                name
            )));
        }

        let mut out = String::new();
        self.render_header(&mut out, figure);

        let (w, h) = (figure.size.width_pt, figure.size.height_pt);
        let _ = writeln!(out, "#let {}(width: auto, height: auto) = {{", name);
        let _ = writeln!(out, "  let W = {}pt", self.num(w));
        let _ = writeln!(out, "  let H = {}pt", self.num(h));
        out.push_str(concat!(
            "  let s = if width == auto and height == auto { 1.0 }\n",
            "    else if height == auto { width / W }\n",
            "    else if width == auto { height / H }\n",
            "    else { calc.min(width / W, height / H) }\n",
            "  let anchored(x, y, angle, anchor, body) = context {\n",
            "    let w = measure(body).width\n",
            "    let f = if anchor == center { 0.5 } else if anchor == right { 1.0 } else { 0.0 }\n",
            "    place(top + left, dx: s * x, dy: s * y,\n",
            "      rotate(angle, origin: top + left, reflow: false,\n",
            "        move(dx: -f * w, body)))\n",
            "  }\n",
            "  set text(top-edge: \"baseline\", bottom-edge: \"baseline\")\n",
            "  box(\n",
            "    width: if width == auto { s * W } else { width },\n",
            "    height: if height == auto { s * H } else { height },\n",
            "    {\n",
        ));

        self.render_image(&mut out, figure, image_path);
        for line in lines(&figure.placements) {
            self.render_line(&mut out, line);
        }

        out.push_str("    },\n  )\n}\n");
        Ok(out)
    }

    fn render_header(&self, out: &mut String, figure: &Figure) {
        match &self.options.source_name {
            Some(source) => {
                let _ = writeln!(out, "// Generated by typsvg from {}", source);
            }
            None => out.push_str("// Generated by typsvg\n"),
        }
        let _ = writeln!(
            out,
            "// Natural size: {}pt x {}pt",
            self.num(figure.size.width_pt),
            self.num(figure.size.height_pt)
        );
        out.push('\n');
    }

    /// The cleaned drawing covers the whole canvas; shift it so the frame
    /// origin lands on the box origin.
    fn render_image(&self, out: &mut String, figure: &Figure, image_path: &str) {
        let dx = -figure.frame.min_x * PX_TO_PT;
        let dy = -figure.frame.min_y * PX_TO_PT;
        let (cw, ch) = figure.viewport.size_pt();
        let _ = writeln!(
            out,
            "      place(top + left, dx: s * {}pt, dy: s * {}pt, image(\"{}\", width: s * {}pt, height: s * {}pt))",
            self.num(dx),
            self.num(dy),
            escape_string(image_path),
            self.num(cw),
            self.num(ch)
        );
    }

    fn render_line(&self, out: &mut String, line: &[PlacementRecord]) {
        let first = &line[0];
        let mut body = String::new();
        for record in line {
            body.push_str(&self.render_run(record));
        }
        let _ = writeln!(
            out,
            "      anchored({}pt, {}pt, {}deg, {}, [{}])",
            self.num(first.position.x),
            self.num(first.position.y),
            self.num(first.rotation_deg),
            first.alignment.token(),
            body
        );
    }

    fn render_run(&self, record: &PlacementRecord) -> String {
        let font = &record.font;
        let mut args = vec![format!("size: s * {}pt", self.num(font.size_pt))];

        if self.options.font_family_mode == FontFamilyMode::PassThrough && !font.family.is_empty()
        {
            let names: Vec<String> = font
                .family
                .iter()
                .map(|f| format!("\"{}\"", escape_string(f)))
                .collect();
            if names.len() == 1 {
                args.push(format!("font: {}", names[0]));
            } else {
                args.push(format!("font: ({})", names.join(", ")));
            }
        }
        if font.weight != 400 {
            args.push(format!("weight: {}", font.weight));
        }
        if font.style != FontStyle::Normal {
            args.push(format!("style: \"{}\"", font.style.as_str()));
        }
        match font.fill {
            Some(color) if color != Color::BLACK => {
                args.push(format!("fill: rgb(\"{}\")", color.to_hex()));
            }
            None => log::debug!("Text {:?} has no fill; drawn in the default color", record.text),
            _ => {}
        }
        // Typst baselines move down for positive values
        let baseline = record.offset.y - record.baseline_shift;
        if baseline.abs() > self.epsilon() {
            args.push(format!("baseline: s * {}pt", self.num(baseline)));
        }

        let mut run = String::new();
        if record.offset.x.abs() > self.epsilon() {
            let _ = write!(run, "#h(s * {}pt)", self.num(record.offset.x));
        }
        let text = format!("#text({})[{}]", args.join(", "), self.escape_text(&record.text));
        if (record.stretch_x - 1.0).abs() > 1e-3 {
            let _ = write!(
                run,
                "#scale(x: {}%, reflow: true)[{}]",
                self.num(record.stretch_x * 100.0),
                text
            );
        } else {
            run.push_str(&text);
        }
        run
    }

    fn escape_text(&self, text: &str) -> String {
        match self.options.text_mode {
            TextMode::Markup => text.to_string(),
            TextMode::Literal => escape_markup(text),
        }
    }

    fn epsilon(&self) -> f64 {
        0.5 * 10f64.powi(-(self.options.precision as i32))
    }

    /// Fixed-point number without a negative zero.
    fn num(&self, value: f64) -> String {
        let value = if value.abs() < self.epsilon() { 0.0 } else { value };
        format!("{:.*}", self.options.precision, value)
    }
}

/// Split records into lines: each line starts at a record that does not
/// continue the previous one.
fn lines(records: &[PlacementRecord]) -> Vec<&[PlacementRecord]> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, record) in records.iter().enumerate() {
        if i > start && !record.continues_line {
            out.push(&records[start..i]);
            start = i;
        }
    }
    if start < records.len() {
        out.push(&records[start..]);
    }
    out
}

/// Backslash-escape every Typst markup character.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKUP_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape for a Typst string literal.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Typst identifier: a letter or `_`, then letters, digits, `_` or `-`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
