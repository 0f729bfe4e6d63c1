//! typsvg CLI - split Inkscape SVG figures into graphics and a Typst overlay

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use typsvg::render::to_json;
use typsvg::{
    convert_files, ConvertOptions, ConvertResult, FontFamilyMode, Frame, JsonFormat, ParseOptions,
    RenderOptions, SplitStats,
};

#[derive(Parser)]
#[command(name = "typsvg")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Split Inkscape SVG figures into clean graphics and a Typst text overlay",
    long_about = None
)]
struct Cli {
    /// Input SVG or SVGZ files
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Write outputs here instead of next to each input
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Name of the generated Typst function
    #[arg(short, long, default_value = typsvg::render::DEFAULT_FUNCTION_NAME)]
    name: String,

    /// Rectangle the figure occupies
    #[arg(long, value_enum, default_value = "graphics")]
    frame: FrameArg,

    /// Escape Typst markup in labels instead of passing it through
    #[arg(long)]
    literal: bool,

    /// Forward the drawing's font families to the script
    #[arg(long)]
    keep_font_family: bool,

    /// Decimal places for lengths and angles
    #[arg(long, default_value = "4")]
    precision: usize,

    /// Print placement records as JSON instead of writing files
    #[arg(long)]
    json: bool,

    /// Replace unsupported transforms with identity and warn
    #[arg(long)]
    lenient: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FrameArg {
    /// Bounding box of the graphics
    Graphics,
    /// The document page
    Viewport,
}

impl From<FrameArg> for Frame {
    fn from(arg: FrameArg) -> Self {
        match arg {
            FrameArg::Graphics => Frame::Graphics,
            FrameArg::Viewport => Frame::Viewport,
        }
    }
}

impl Cli {
    fn convert_options(&self) -> ConvertOptions {
        let mut parse = ParseOptions::new();
        if self.lenient {
            parse = parse.lenient();
        }

        let mut render = RenderOptions::new()
            .with_function_name(&self.name)
            .with_frame(self.frame.into())
            .with_precision(self.precision);
        if self.literal {
            render = render.literal();
        }
        if self.keep_font_family {
            render = render.with_font_family_mode(FontFamilyMode::PassThrough);
        }

        let mut options = ConvertOptions::new()
            .with_parse_options(parse)
            .with_render_options(render);
        if let Some(dir) = &self.output_dir {
            options = options.with_output_dir(dir);
        }
        options
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let options = cli.convert_options();

    let result = if cli.json {
        cmd_json(&cli.inputs, &options)
    } else {
        cmd_convert(&cli.inputs, &options)
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    inputs: &[PathBuf],
    options: &ConvertOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Splitting {} figure(s)...", inputs.len()));

    let results = convert_files(inputs, options);
    pb.finish_and_clear();

    if let [result] = results.as_slice() {
        return match result {
            Ok(converted) => {
                print_converted(converted);
                Ok(())
            }
            Err(e) => Err(e.to_string().into()),
        };
    }

    let mut failed = 0;
    let mut total = SplitStats::default();
    for (input, result) in inputs.iter().zip(&results) {
        match result {
            Ok(converted) => {
                print_converted(converted);
                total.merge(&converted.stats);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", "✗".red(), input.display(), e);
            }
        }
    }

    println!(
        "{} {} labels from {} figure(s), {} text elements removed",
        "Total:".bold(),
        total.placements,
        inputs.len() - failed,
        total.text_removed
    );

    if failed > 0 {
        return Err(format!("{} of {} figures failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn print_converted(result: &ConvertResult) {
    println!("{} {}", "✓".green(), result.input.display().to_string().bold());
    println!("  {} {}", "├─".dimmed(), result.clean_path.display());
    println!("  {} {}", "└─".dimmed(), result.script_path.display());

    let stats = &result.stats;
    println!(
        "  {} labels on {} lines, {} text elements removed, {} empty groups pruned",
        stats.placements, stats.lines, stats.text_removed, stats.groups_pruned
    );
    for diagnostic in &result.diagnostics {
        println!("  {} {}", "warning:".yellow(), diagnostic);
    }
}

/// One pretty array for a single input, one compact array per line for
/// several.
fn cmd_json(
    inputs: &[PathBuf],
    options: &ConvertOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if inputs.len() == 1 {
        JsonFormat::Pretty
    } else {
        JsonFormat::Compact
    };

    for input in inputs {
        println!("{}", placements_json(input, options, format)?);
    }
    Ok(())
}

fn placements_json(
    input: &Path,
    options: &ConvertOptions,
    format: JsonFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let result = typsvg::split_file_with_options(input, options)?;
    for diagnostic in &result.diagnostics {
        eprintln!("{} {}: {}", "warning:".yellow(), input.display(), diagnostic);
    }
    Ok(to_json(result.figure.placements.as_slice(), format)?)
}
