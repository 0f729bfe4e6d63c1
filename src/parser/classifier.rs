//! Immutable classification pass over the document tree.
//!
//! The walk resolves every element's effective transform and inherited
//! style top-down in a single traversal, collects text runs and graphics
//! bounds, and records which nodes the stripper should remove. Nothing is
//! mutated here, so transforms of later siblings never depend on what
//! gets stripped.

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::geometry::path::{self, Segment};
use crate::geometry::{parse_length, parse_transform, BoundingBox, Point, Transform, Viewport};
use crate::model::{
    baseline_shift, is_display_none, normalize_whitespace, Element, Node, NodePath,
    ResolvedStyle, SvgDocument, TextRun, DEFAULT_FONT_SIZE,
};

use super::options::ParseOptions;

/// Category of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementClass {
    /// Rendered geometry, kept and measured
    Graphics,
    /// Text-bearing element, stripped and placed
    Text,
    /// Container whose children are classified in turn
    Group,
    /// Not rendered directly; left untouched
    Other,
}

const TEXT_ELEMENTS: &[&str] = &["text", "flowRoot"];

const GROUP_ELEMENTS: &[&str] = &["g", "a", "switch", "svg"];

const GRAPHICS_ELEMENTS: &[&str] = &[
    "path",
    "rect",
    "circle",
    "ellipse",
    "line",
    "polyline",
    "polygon",
    "image",
    "use",
    "foreignObject",
];

const OTHER_ELEMENTS: &[&str] = &[
    "defs",
    "symbol",
    "clipPath",
    "mask",
    "marker",
    "pattern",
    "linearGradient",
    "radialGradient",
    "meshgradient",
    "hatch",
    "solidcolor",
    "stop",
    "filter",
    "style",
    "script",
    "metadata",
    "title",
    "desc",
    "view",
    "cursor",
    "font",
    "font-face",
    "color-profile",
    "animate",
    "animateMotion",
    "animateTransform",
    "set",
    "mpath",
    "tspan",
    "textPath",
    "flowPara",
    "flowSpan",
    "flowDiv",
    "flowRegion",
];

/// Classify an element by its tag.
///
/// Elements in a foreign namespace (`sodipodi:`, `inkscape:`, ...) are
/// [`ElementClass::Other`]. SVG elements outside the known set yield
/// [`Error::UnsupportedElement`].
pub fn classify_element(element: &Element) -> Result<ElementClass> {
    let Some(name) = element.svg_name() else {
        return Ok(ElementClass::Other);
    };
    if TEXT_ELEMENTS.contains(&name) {
        Ok(ElementClass::Text)
    } else if GROUP_ELEMENTS.contains(&name) {
        Ok(ElementClass::Group)
    } else if GRAPHICS_ELEMENTS.contains(&name) {
        Ok(ElementClass::Graphics)
    } else if OTHER_ELEMENTS.contains(&name) || name.starts_with("fe") {
        Ok(ElementClass::Other)
    } else {
        Err(Error::UnsupportedElement(element.name.clone()))
    }
}

/// What the stripper removes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StripPlan {
    /// Child-index paths of text elements, in document order
    pub text_nodes: Vec<NodePath>,

    /// Ids referenced through `href` or `url(#...)` anywhere in the document
    pub referenced_ids: IndexSet<String>,
}

impl StripPlan {
    pub fn is_empty(&self) -> bool {
        self.text_nodes.is_empty()
    }

    pub fn is_referenced(&self, id: &str) -> bool {
        self.referenced_ids.contains(id)
    }
}

/// Counters collected during classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassifyStats {
    /// Elements in the document, root included
    pub elements: usize,
    /// Graphics elements outside non-rendered containers
    pub graphics: usize,
    pub groups: usize,
    /// Text elements scheduled for removal
    pub text_nodes: usize,
    /// Text elements without placement (hidden)
    pub hidden_text: usize,
    pub runs: usize,
    pub unsupported: usize,
}

/// Result of the classification pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Root coordinate system
    pub viewport: Viewport,

    pub plan: StripPlan,

    /// Visible, non-empty text runs in document order
    pub runs: Vec<TextRun>,

    /// Graphics bounds in canvas pixels
    pub bbox: BoundingBox,

    /// Non-fatal problems, already logged
    pub diagnostics: Vec<String>,

    pub stats: ClassifyStats,
}

impl Classification {
    /// Text of all runs in document order.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Single-use walker producing a [`Classification`].
pub struct Classifier<'a> {
    doc: &'a SvgDocument,
    options: &'a ParseOptions,
    ids: HashMap<&'a str, &'a Element>,
    /// Size of the root user space, percentage base
    user_size: (f64, f64),
    plan: StripPlan,
    runs: Vec<TextRun>,
    bbox: BoundingBox,
    diagnostics: Vec<String>,
    stats: ClassifyStats,
}

impl<'a> Classifier<'a> {
    pub fn new(doc: &'a SvgDocument, options: &'a ParseOptions) -> Self {
        Self {
            doc,
            options,
            ids: HashMap::new(),
            user_size: (0.0, 0.0),
            plan: StripPlan::default(),
            runs: Vec::new(),
            bbox: BoundingBox::empty(),
            diagnostics: Vec::new(),
            stats: ClassifyStats::default(),
        }
    }

    /// Walk the whole document.
    pub fn classify(mut self) -> Result<Classification> {
        let doc = self.doc;
        let root = &doc.root;
        let viewport = Viewport::from_attributes(
            root.attr("width"),
            root.attr("height"),
            root.attr("viewBox"),
            root.attr("preserveAspectRatio"),
        )?;
        self.user_size = match viewport.view_box {
            Some(vb) => (vb[2], vb[3]),
            None => (viewport.width, viewport.height),
        };

        index_ids(root, &mut self.ids);
        collect_references(root, &mut self.plan.referenced_ids);
        self.stats.elements = self.doc.element_count();

        let ctm = viewport.transform.pre_concat(&self.local_transform(root)?);
        let style = ResolvedStyle::with_font_size(self.options.default_font_size).derive(root);
        let visible = !is_display_none(root);

        let mut path = NodePath::new();
        self.walk_children(root, &mut path, &ctm, &style, visible)?;

        log::info!(
            "Classified {} elements: {} text nodes, {} runs, {} graphics",
            self.stats.elements,
            self.stats.text_nodes,
            self.stats.runs,
            self.stats.graphics
        );

        Ok(Classification {
            viewport,
            plan: self.plan,
            runs: self.runs,
            bbox: self.bbox,
            diagnostics: self.diagnostics,
            stats: self.stats,
        })
    }

    fn walk_children(
        &mut self,
        parent: &'a Element,
        path: &mut NodePath,
        ctm: &Transform,
        style: &ResolvedStyle,
        visible: bool,
    ) -> Result<()> {
        for (index, child) in parent.children.iter().enumerate() {
            let Node::Element(element) = child else {
                continue;
            };
            path.push(index);
            let result = self.visit(element, path, ctm, style, visible);
            path.pop();
            result?;
        }
        Ok(())
    }

    fn visit(
        &mut self,
        element: &'a Element,
        path: &mut NodePath,
        ctm: &Transform,
        style: &ResolvedStyle,
        visible: bool,
    ) -> Result<()> {
        let class = match classify_element(element) {
            Ok(class) => class,
            Err(err) if err.is_diagnostic() => {
                self.diagnostic(format!("{}; treated as graphics", err));
                self.stats.unsupported += 1;
                self.stats.graphics += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let visible = visible && !is_display_none(element);

        match class {
            ElementClass::Other => Ok(()),
            ElementClass::Graphics => {
                self.stats.graphics += 1;
                if visible {
                    let ctm = ctm.pre_concat(&self.local_transform(element)?);
                    let bounds = self.shape_bounds(element, &ctm, 0)?;
                    self.bbox.union(&bounds);
                }
                Ok(())
            }
            ElementClass::Group => {
                self.stats.groups += 1;
                let ctm = ctm.pre_concat(&self.group_transform(element)?);
                let style = style.derive(element);
                self.walk_children(element, path, &ctm, &style, visible)
            }
            ElementClass::Text => {
                let ctm = ctm.pre_concat(&self.local_transform(element)?);
                let style = style.derive(element);
                self.visit_text(element, path, ctm, &style, visible);
                Ok(())
            }
        }
    }

    fn visit_text(
        &mut self,
        element: &'a Element,
        path: &NodePath,
        ctm: Transform,
        style: &ResolvedStyle,
        visible: bool,
    ) {
        let node = self.plan.text_nodes.len();
        self.plan.text_nodes.push(path.clone());
        self.stats.text_nodes += 1;

        if !visible || style.hidden {
            log::debug!("Hidden <{}> at {:?} stripped without placement", element.name, path);
            self.stats.hidden_text += 1;
            return;
        }

        let mut cursor = TextCursor::new(node, ctm);
        if element.local_name() == "flowRoot" {
            self.collect_flow(element, style, &mut cursor);
        } else {
            let (x, y, delta) = self.position(element, style.font_size);
            cursor.start_line(
                Point::new(x.unwrap_or(0.0), y.unwrap_or(0.0)),
                delta,
            );
            let shift = baseline_shift(element, style.font_size);
            self.collect_runs(element, style, shift, &mut cursor);
        }

        let runs = cursor.finish();
        log::debug!("<{}> at {:?}: {} runs", element.name, path, runs.len());
        self.stats.runs += runs.len();
        self.runs.extend(runs);
    }

    fn collect_runs(
        &mut self,
        element: &'a Element,
        style: &ResolvedStyle,
        shift: f64,
        cursor: &mut TextCursor,
    ) {
        for child in &element.children {
            match child {
                Node::Text(text) | Node::CData(text) => {
                    let text = self.normalize(text, style.preserve_space);
                    cursor.push(text, style, shift);
                }
                Node::Element(child) => self.collect_inline(child, style, shift, cursor),
                _ => {}
            }
        }
    }

    fn collect_inline(
        &mut self,
        element: &'a Element,
        parent: &ResolvedStyle,
        shift: f64,
        cursor: &mut TextCursor,
    ) {
        let Some(name) = element.svg_name() else {
            return;
        };
        match name {
            "tspan" | "a" | "textPath" | "altGlyph" | "flowSpan" | "flowPara" | "flowDiv" => {}
            "title" | "desc" | "metadata" | "flowRegion" => return,
            other => {
                log::debug!("Skipping <{}> inside text", other);
                return;
            }
        }
        if is_display_none(element) {
            return;
        }
        let style = parent.derive(element);
        if style.hidden {
            return;
        }
        if name == "textPath" {
            self.diagnostic(format!(
                "<textPath> in text element {} is placed at the text anchor",
                cursor.node
            ));
        }

        let (x, y, delta) = self.position(element, style.font_size);
        if x.is_some() || y.is_some() {
            let origin = Point::new(
                x.unwrap_or(cursor.line_origin.x),
                y.unwrap_or(cursor.line_origin.y),
            );
            cursor.start_line(origin, delta);
        } else {
            cursor.pending_offset = cursor.pending_offset + delta;
        }

        let shift = shift + baseline_shift(element, style.font_size);
        self.collect_runs(element, &style, shift, cursor);
    }

    fn collect_flow(&mut self, root: &'a Element, style: &ResolvedStyle, cursor: &mut TextCursor) {
        let origin = match flow_region_origin(root) {
            Some(origin) => origin,
            None => {
                self.diagnostic(format!(
                    "<{}> without a rectangular flowRegion is anchored at the origin",
                    root.name
                ));
                Point::default()
            }
        };

        let mut line = 0usize;
        for child in root.child_elements() {
            if !matches!(child.svg_name(), Some("flowPara" | "flowDiv")) {
                continue;
            }
            let baseline = origin.y + style.font_size * (0.8 + 1.25 * line as f64);
            line += 1;

            let para = style.derive(child);
            if is_display_none(child) || para.hidden {
                continue;
            }
            cursor.start_line(Point::new(origin.x, baseline), Point::default());
            let shift = baseline_shift(child, para.font_size);
            self.collect_runs(child, &para, shift, cursor);
        }
    }

    /// First values of `x`, `y` and `dx`/`dy` on a text positioning element.
    fn position(&self, element: &Element, font_size: f64) -> (Option<f64>, Option<f64>, Point) {
        let (w, h) = self.user_size;
        let x = first_coordinate(element, "x", font_size, w);
        let y = first_coordinate(element, "y", font_size, h);
        let dx = first_coordinate(element, "dx", font_size, w).unwrap_or(0.0);
        let dy = first_coordinate(element, "dy", font_size, h).unwrap_or(0.0);
        (x, y, Point::new(dx, dy))
    }

    fn normalize(&self, text: &str, preserve: bool) -> String {
        let text = normalize_whitespace(text, preserve);
        if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text
        }
    }

    /// The element's `transform`, identity when absent.
    fn local_transform(&mut self, element: &Element) -> Result<Transform> {
        let Some(value) = element.attr("transform") else {
            return Ok(Transform::IDENTITY);
        };
        match parse_transform(value) {
            Ok(transform) => Ok(transform),
            Err(err) if self.options.is_lenient() => {
                self.diagnostic(format!("{} on {}; using identity", err, describe(element)));
                Ok(Transform::IDENTITY)
            }
            Err(Error::UnsupportedTransform(name)) => Err(Error::UnsupportedTransform(format!(
                "{} on {}",
                name,
                describe(element)
            ))),
            Err(Error::MalformedTransform(msg)) => Err(Error::MalformedTransform(format!(
                "{} on {}",
                msg,
                describe(element)
            ))),
            Err(err) => Err(err),
        }
    }

    /// Transform a container establishes for its children. Nested `svg`
    /// elements add their position and viewBox mapping.
    fn group_transform(&mut self, element: &Element) -> Result<Transform> {
        let local = self.local_transform(element)?;
        if element.svg_name() != Some("svg") {
            return Ok(local);
        }
        let (w, h) = self.user_size;
        let x = coordinate(element, "x", w);
        let y = coordinate(element, "y", h);
        let mut transform = local.pre_concat(&Transform::translate(x, y));
        if let Ok(viewport) = Viewport::from_attributes(
            element.attr("width"),
            element.attr("height"),
            element.attr("viewBox"),
            element.attr("preserveAspectRatio"),
        ) {
            transform = transform.pre_concat(&viewport.transform);
        }
        Ok(transform)
    }

    /// Canvas bounds of a graphics element whose full transform is `ctm`.
    fn shape_bounds(
        &mut self,
        element: &'a Element,
        ctm: &Transform,
        depth: usize,
    ) -> Result<BoundingBox> {
        let (w, h) = self.user_size;
        let len = |name: &str, base: f64| coordinate(element, name, base);

        let segments = match element.local_name() {
            "path" => path::parse_path_data(element.attr("d").unwrap_or("")),
            "rect" | "image" | "foreignObject" => {
                let (width, height) = (len("width", w), len("height", h));
                if width <= 0.0 || height <= 0.0 {
                    return Ok(BoundingBox::empty());
                }
                path::rect(len("x", w), len("y", h), width, height)
            }
            "circle" => {
                let r = len("r", (w * w + h * h).sqrt() / std::f64::consts::SQRT_2);
                if r <= 0.0 {
                    return Ok(BoundingBox::empty());
                }
                path::ellipse(len("cx", w), len("cy", h), r, r)
            }
            "ellipse" => {
                let (rx, ry) = (len("rx", w), len("ry", h));
                if rx <= 0.0 || ry <= 0.0 {
                    return Ok(BoundingBox::empty());
                }
                path::ellipse(len("cx", w), len("cy", h), rx, ry)
            }
            "line" => vec![Segment::Line(
                Point::new(len("x1", w), len("y1", h)),
                Point::new(len("x2", w), len("y2", h)),
            )],
            "polyline" => path::polyline(element.attr("points").unwrap_or(""), false),
            "polygon" => path::polyline(element.attr("points").unwrap_or(""), true),
            "use" => return self.use_bounds(element, ctm, depth),
            _ => Vec::new(),
        };
        Ok(path::transformed_bounds(&segments, ctm))
    }

    fn use_bounds(
        &mut self,
        element: &'a Element,
        ctm: &Transform,
        depth: usize,
    ) -> Result<BoundingBox> {
        if depth >= self.options.max_use_depth {
            self.diagnostic(format!(
                "{} nested deeper than {} levels ignored",
                describe(element),
                self.options.max_use_depth
            ));
            return Ok(BoundingBox::empty());
        }
        let target = element
            .href()
            .and_then(|href| href.trim().strip_prefix('#'))
            .and_then(|id| self.ids.get(id).copied());
        let Some(target) = target else {
            log::debug!("Unresolved reference on {}", describe(element));
            return Ok(BoundingBox::empty());
        };

        let (w, h) = self.user_size;
        let offset = Transform::translate(coordinate(element, "x", w), coordinate(element, "y", h));
        self.subtree_bounds(target, &ctm.pre_concat(&offset), depth + 1)
    }

    /// Bounds of a referenced subtree, text excluded.
    fn subtree_bounds(
        &mut self,
        element: &'a Element,
        ctm: &Transform,
        depth: usize,
    ) -> Result<BoundingBox> {
        if is_display_none(element) {
            return Ok(BoundingBox::empty());
        }
        let class = match element.svg_name() {
            Some("symbol") => ElementClass::Group,
            _ => classify_element(element).unwrap_or(ElementClass::Other),
        };
        match class {
            ElementClass::Graphics => {
                let ctm = ctm.pre_concat(&self.local_transform(element)?);
                self.shape_bounds(element, &ctm, depth)
            }
            ElementClass::Group => {
                let ctm = ctm.pre_concat(&self.group_transform(element)?);
                let mut bbox = BoundingBox::empty();
                for child in element.child_elements() {
                    bbox.union(&self.subtree_bounds(child, &ctm, depth)?);
                }
                Ok(bbox)
            }
            ElementClass::Text | ElementClass::Other => Ok(BoundingBox::empty()),
        }
    }

    fn diagnostic(&mut self, message: String) {
        log::warn!("{}", message);
        self.diagnostics.push(message);
    }
}

/// Run accumulator for one text element.
struct TextCursor {
    node: usize,
    transform: Transform,
    line: usize,
    /// `x`/`y` of the current line, fallback for a missing coordinate
    line_origin: Point,
    /// Current line anchor, dx/dy included
    line_anchor: Point,
    line_has_runs: bool,
    /// dx/dy waiting for the next run
    pending_offset: Point,
    /// dy accumulated since the line anchor; the current text position
    /// stays moved for the rest of the line
    line_dy: f64,
    runs: Vec<TextRun>,
}

impl TextCursor {
    fn new(node: usize, transform: Transform) -> Self {
        Self {
            node,
            transform,
            line: 0,
            line_origin: Point::default(),
            line_anchor: Point::default(),
            line_has_runs: false,
            pending_offset: Point::default(),
            line_dy: 0.0,
            runs: Vec::new(),
        }
    }

    fn start_line(&mut self, origin: Point, delta: Point) {
        if self.line_has_runs {
            self.line += 1;
            self.line_has_runs = false;
        }
        self.line_origin = origin;
        self.line_anchor = origin + delta;
        self.pending_offset = Point::default();
        self.line_dy = 0.0;
    }

    fn push(&mut self, mut text: String, style: &ResolvedStyle, shift: f64) {
        // Spaces collapse across run boundaries too
        if !style.preserve_space
            && text.starts_with(' ')
            && self.line_has_runs
            && self.runs.last().map_or(false, |r| r.text.ends_with(' '))
        {
            text.remove(0);
        }
        if text.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_offset);
        self.line_dy += pending.y;
        let offset = Point::new(pending.x, self.line_dy);
        self.runs.push(TextRun {
            node: self.node,
            line: self.line,
            starts_line: false,
            transform: self.transform,
            anchor: self.line_anchor,
            offset,
            baseline_shift: shift,
            style: style.clone(),
            text,
        });
        self.line_has_runs = true;
    }

    /// Trim line ends, drop empty runs and flag the first run of each line.
    fn finish(self) -> Vec<TextRun> {
        let mut runs = self.runs;

        let mut start = 0;
        while start < runs.len() {
            let line = runs[start].line;
            let end = runs[start..]
                .iter()
                .position(|r| r.line != line)
                .map_or(runs.len(), |p| start + p);
            trim_line(&mut runs[start..end]);
            start = end;
        }

        runs.retain(|r| !r.text.is_empty());

        let mut previous = None;
        for run in &mut runs {
            run.starts_line = previous != Some(run.line);
            previous = Some(run.line);
        }
        runs
    }
}

fn trim_line(runs: &mut [TextRun]) {
    for run in runs.iter_mut() {
        if run.style.preserve_space {
            break;
        }
        run.text = run.text.trim_start_matches(' ').to_string();
        if !run.text.is_empty() {
            break;
        }
    }
    for run in runs.iter_mut().rev() {
        if run.style.preserve_space {
            break;
        }
        run.text = run.text.trim_end_matches(' ').to_string();
        if !run.text.is_empty() {
            break;
        }
    }
}

/// Top-left corner of the first rectangle in a `flowRegion`.
fn flow_region_origin(root: &Element) -> Option<Point> {
    let region = root
        .child_elements()
        .find(|c| c.svg_name() == Some("flowRegion"))?;
    let rect = region
        .child_elements()
        .find(|c| c.svg_name() == Some("rect"))?;
    let transform = rect
        .attr("transform")
        .and_then(|t| parse_transform(t).ok())
        .unwrap_or_default();
    let x = coordinate(rect, "x", 0.0);
    let y = coordinate(rect, "y", 0.0);
    Some(transform.apply(Point::new(x, y)))
}

/// Length attribute in user units, 0 when absent or unparsable.
fn coordinate(element: &Element, name: &str, percent_base: f64) -> f64 {
    element
        .attr(name)
        .and_then(parse_length)
        .map_or(0.0, |l| l.to_px_relative(DEFAULT_FONT_SIZE, percent_base))
}

/// First entry of a text coordinate list such as `x="10 20 30"`.
fn first_coordinate(element: &Element, name: &str, font_size: f64, base: f64) -> Option<f64> {
    let value = element.attr(name)?;
    let first = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|s| !s.is_empty())?;
    parse_length(first).map(|l| l.to_px_relative(font_size, base))
}

fn describe(element: &Element) -> String {
    match element.attr("id") {
        Some(id) => format!("<{} id=\"{}\">", element.name, id),
        None => format!("<{}>", element.name),
    }
}

fn index_ids<'a>(element: &'a Element, ids: &mut HashMap<&'a str, &'a Element>) {
    if let Some(id) = element.attr("id") {
        ids.entry(id).or_insert(element);
    }
    for child in element.child_elements() {
        index_ids(child, ids);
    }
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"url\(\s*['"]?#([^'")\s]+)"#).unwrap())
}

fn collect_references(element: &Element, out: &mut IndexSet<String>) {
    for (name, value) in &element.attributes {
        if name == "href" || name.ends_with(":href") {
            if let Some(id) = value.trim().strip_prefix('#') {
                out.insert(id.to_string());
            }
        }
        for caps in url_regex().captures_iter(value) {
            out.insert(caps[1].to_string());
        }
    }
    if element.svg_name() == Some("style") {
        for caps in url_regex().captures_iter(&element.text_content()) {
            out.insert(caps[1].to_string());
        }
    }
    for child in element.child_elements() {
        collect_references(child, out);
    }
}
