//! Split driver: runs the pipeline for files and writes both artifacts.
//!
//! # Example
//!
//! ```no_run
//! use typsvg::convert::{convert_file, ConvertOptions};
//!
//! fn main() -> typsvg::Result<()> {
//!     let result = convert_file("figure.svg", &ConvertOptions::default())?;
//!     println!("{}", result.script_path.display());
//!     Ok(())
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::SvgDocument;
use crate::parser::{Classifier, ParseOptions, SvgParser};
use crate::render::{build_figure, strip_text, to_typst, RenderOptions, SplitResult, SplitStats};

/// Image path used by scripts split from in-memory data.
pub const DEFAULT_IMAGE_PATH: &str = "figure_clean.svg";

/// Suffix appended to the base name of the cleaned SVG.
pub const CLEAN_SUFFIX: &str = "_clean";

/// Options for splitting files.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Parsing and classification options
    pub parse: ParseOptions,

    /// Script options
    pub render: RenderOptions,

    /// Directory for both outputs. Defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Write outputs into `dir` instead of next to the input.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// Where the two artifacts of one input go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    /// `<base>_clean.<ext>`
    pub clean_svg: PathBuf,
    /// `<base>.typ`
    pub script: PathBuf,
}

impl OutputPaths {
    /// Derive output paths from an input path.
    ///
    /// The cleaned SVG keeps the input's extension (`svg` when it has
    /// none), so `.svgz` inputs produce `.svgz` outputs.
    pub fn for_input(input: &Path, output_dir: Option<&Path>) -> Result<Self> {
        let base = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Other(format!("Cannot derive a name from {}", input.display())))?;
        let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("svg");

        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        Ok(Self {
            clean_svg: dir.join(format!("{}{}.{}", base, CLEAN_SUFFIX, ext)),
            script: dir.join(format!("{}.typ", base)),
        })
    }

    /// Directory both files are written to.
    pub fn dir(&self) -> &Path {
        self.script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// File name of the cleaned SVG, as the script refers to it.
    pub fn clean_file_name(&self) -> String {
        self.clean_svg
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of converting one file.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    /// The input file
    pub input: PathBuf,

    /// Path of the written cleaned SVG
    pub clean_path: PathBuf,

    /// Path of the written Typst script
    pub script_path: PathBuf,

    /// Non-fatal problems
    pub diagnostics: Vec<String>,

    /// Split statistics
    pub stats: SplitStats,
}

/// Run the whole pipeline on a parsed document.
///
/// Classification reads the tree, then the stripper mutates it; the
/// script refers to the cleaned SVG as `image_path`.
pub fn split_document(
    mut doc: SvgDocument,
    parse: &ParseOptions,
    render: &RenderOptions,
    image_path: &str,
) -> Result<SplitResult> {
    let classification = Classifier::new(&doc, parse).classify()?;
    let figure = build_figure(&classification, render.frame)?;
    let strip = strip_text(&mut doc, &classification.plan);
    let script = to_typst(&figure, image_path, render)?;
    let stats = SplitStats::from_parts(&classification.stats, &strip, &figure);

    log::info!(
        "Split figure: {} labels on {} lines, {} text elements removed",
        stats.placements,
        stats.lines,
        stats.text_removed
    );

    Ok(SplitResult {
        figure,
        document: doc,
        script,
        diagnostics: classification.diagnostics,
        stats,
    })
}

/// Split SVG bytes in memory.
pub fn split_bytes(data: &[u8], options: &ConvertOptions) -> Result<SplitResult> {
    let doc = SvgParser::from_bytes_with_options(data, options.parse.clone())?.into_document();
    let image_path = options
        .render
        .image_path
        .as_deref()
        .unwrap_or(DEFAULT_IMAGE_PATH);
    split_document(doc, &options.parse, &options.render, image_path)
}

/// Split a file in memory without writing anything.
pub fn split_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<SplitResult> {
    split_path(path.as_ref(), options).map(|(_, result)| result)
}

fn split_path(input: &Path, options: &ConvertOptions) -> Result<(OutputPaths, SplitResult)> {
    let paths = OutputPaths::for_input(input, options.output_dir.as_deref())?;
    let doc = SvgParser::open_with_options(input, options.parse.clone())?.into_document();

    let mut render = options.render.clone();
    if render.source_name.is_none() {
        render.source_name = input.file_name().map(|n| n.to_string_lossy().into_owned());
    }
    let image_path = match &render.image_path {
        Some(path) => path.clone(),
        None => paths.clean_file_name(),
    };

    let result = split_document(doc, &options.parse, &render, &image_path)?;
    Ok((paths, result))
}

/// Split a file and write `<base>_clean.<ext>` and `<base>.typ`.
///
/// Nothing is written unless the whole pipeline succeeds.
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<ConvertResult> {
    let input = path.as_ref();
    let (paths, result) = split_path(input, options)?;
    let clean = result.clean_svg()?;
    write_outputs(&paths, &clean, result.script.as_bytes())?;

    log::info!(
        "Wrote {} and {}",
        paths.clean_svg.display(),
        paths.script.display()
    );

    Ok(ConvertResult {
        input: input.to_path_buf(),
        clean_path: paths.clean_svg,
        script_path: paths.script,
        diagnostics: result.diagnostics,
        stats: result.stats,
    })
}

/// Convert several files in parallel, each in its own pipeline.
///
/// Results come back in input order; one failing input does not stop
/// the others.
pub fn convert_files<P>(paths: &[P], options: &ConvertOptions) -> Vec<Result<ConvertResult>>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| convert_file(path, options))
        .collect()
}

/// Write both artifacts through temporary files in the target directory,
/// then move them into place.
///
/// If the second move fails the first output is removed again.
pub fn write_outputs(paths: &OutputPaths, clean: &[u8], script: &[u8]) -> Result<()> {
    let dir = paths.dir();
    fs::create_dir_all(dir)?;

    let mut clean_tmp = NamedTempFile::new_in(dir)?;
    clean_tmp.write_all(clean)?;
    clean_tmp.flush()?;

    let mut script_tmp = NamedTempFile::new_in(dir)?;
    script_tmp.write_all(script)?;
    script_tmp.flush()?;

    clean_tmp
        .persist(&paths.clean_svg)
        .map_err(|e| Error::Io(e.error))?;
    if let Err(e) = script_tmp.persist(&paths.script) {
        if let Err(cleanup) = fs::remove_file(&paths.clean_svg) {
            log::warn!(
                "Could not remove {}: {}",
                paths.clean_svg.display(),
                cleanup
            );
        }
        return Err(Error::Io(e.error));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FIGURE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 200 100">
  <g id="layer1">
    <rect x="0" y="0" width="200" height="100" style="fill:none;stroke:#000000"/>
    <text x="50" y="50" transform="rotate(90 50 50)">Label</text>
  </g>
</svg>
"#;

    fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::for_input(Path::new("figs/plot.svg"), None).unwrap();
        assert_eq!(paths.clean_svg, PathBuf::from("figs/plot_clean.svg"));
        assert_eq!(paths.script, PathBuf::from("figs/plot.typ"));
        assert_eq!(paths.clean_file_name(), "plot_clean.svg");

        let paths = OutputPaths::for_input(Path::new("plot.svgz"), Some(Path::new("out"))).unwrap();
        assert_eq!(paths.clean_svg, PathBuf::from("out/plot_clean.svgz"));
        assert_eq!(paths.dir(), Path::new("out"));

        let paths = OutputPaths::for_input(Path::new("plot"), None).unwrap();
        assert_eq!(paths.clean_svg, PathBuf::from("plot_clean.svg"));
        assert_eq!(paths.dir(), Path::new("."));
    }

    #[test]
    fn test_convert_file_writes_both_outputs() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "figure.svg", FIGURE);

        let result = convert_file(&input, &ConvertOptions::default()).unwrap();
        assert_eq!(result.clean_path, dir.path().join("figure_clean.svg"));
        assert_eq!(result.script_path, dir.path().join("figure.typ"));
        assert_eq!(result.stats.text_removed, 1);
        assert_eq!(result.stats.placements, 1);

        let clean = fs::read_to_string(&result.clean_path).unwrap();
        assert!(!clean.contains("<text"));
        assert!(clean.contains("<rect"));

        let script = fs::read_to_string(&result.script_path).unwrap();
        assert!(script.contains("image(\"figure_clean.svg\""));
        assert!(script.contains("// Generated by typsvg from figure.svg"));
        assert!(script.contains("[Label]"));
    }

    #[test]
    fn test_output_dir_is_created() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "figure.svg", FIGURE);
        let out = dir.path().join("build/figs");

        let options = ConvertOptions::new().with_output_dir(&out);
        let result = convert_file(&input, &options).unwrap();
        assert!(out.join("figure_clean.svg").is_file());
        assert!(out.join("figure.typ").is_file());
        assert_eq!(result.script_path, out.join("figure.typ"));
    }

    #[test]
    fn test_failure_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "broken.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text>no viewport</text></svg>"#,
        );

        let err = convert_file(&input, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingViewport));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("broken.svg")]);
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = convert_file(dir.path().join("nope.svg"), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InputNotFound(_)));
    }

    #[test]
    fn test_convert_files_keeps_order() {
        let dir = TempDir::new().unwrap();
        let a = write_input(&dir, "a.svg", FIGURE);
        let b = dir.path().join("missing.svg");
        let c = write_input(&dir, "c.svg", FIGURE);

        let results = convert_files(&[a, b, c], &ConvertOptions::default());
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::InputNotFound(_))));
        assert_eq!(
            results[2].as_ref().unwrap().script_path,
            dir.path().join("c.typ")
        );
    }

    #[test]
    fn test_split_bytes_uses_default_image_path() {
        let result = split_bytes(FIGURE.as_bytes(), &ConvertOptions::default()).unwrap();
        assert!(result.script.contains(DEFAULT_IMAGE_PATH));
        assert_eq!(result.figure.placements.len(), 1);
    }

    #[test]
    fn test_image_path_override() {
        let options = ConvertOptions::new()
            .with_render_options(RenderOptions::new().with_image_path("assets/fig.svg"));
        let result = split_bytes(FIGURE.as_bytes(), &options).unwrap();
        assert!(result.script.contains("image(\"assets/fig.svg\""));
    }

    #[test]
    fn test_write_outputs_overwrites() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::for_input(&dir.path().join("x.svg"), None).unwrap();
        write_outputs(&paths, b"old", b"old").unwrap();
        write_outputs(&paths, b"<svg/>", b"#let x = 1").unwrap();
        assert_eq!(fs::read(&paths.clean_svg).unwrap(), b"<svg/>");
        assert_eq!(fs::read_to_string(&paths.script).unwrap(), "#let x = 1");
    }
}
