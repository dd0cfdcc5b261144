use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use katanuki_core::puzzle::{
    DEFAULT_COLS, DEFAULT_CORNER_RADIUS_MM, DEFAULT_HEIGHT_MM, DEFAULT_JITTER_PERCENT, DEFAULT_ROWS,
    DEFAULT_TAB_SIZE_PERCENT, DEFAULT_WIDTH_MM,
};
use katanuki_core::{PathDocument, PuzzleParams, PuzzleSpec, SvgOptions};
use katanuki_image_pipeline::reduce::BORDER_MARGIN_PX;
use katanuki_image_pipeline::{
    BorderStrategy, ExtractConfig, Extractor, ResvgRasterizer, ScanOrder,
};
use rand::Rng;

const RANDOM_SEED_MAX: i64 = 10_000;

#[derive(Parser)]
#[command(name = "katanuki", version, about = "Jigsaw cut generator and piece extractor")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an SVG with the cut lines of a new puzzle.
    Generate {
        #[arg(long, num_args = 2, value_names = ["COLS", "ROWS"], default_values_t = [DEFAULT_COLS, DEFAULT_ROWS])]
        grid: Vec<u32>,
        #[arg(short, long, default_value = "jigsaw.svg")]
        output: PathBuf,
        /// Tab jitter, percent of the cell size.
        #[arg(long, default_value_t = DEFAULT_JITTER_PERCENT)]
        jitter: f64,
        /// Tab size, percent of the cell size.
        #[arg(long, default_value_t = DEFAULT_TAB_SIZE_PERCENT)]
        tabsize: f64,
        /// Decimal or 0x-prefixed hex; random when omitted.
        #[arg(long, allow_hyphen_values = true)]
        seed: Option<String>,
        #[arg(long, default_value_t = DEFAULT_WIDTH_MM)]
        width: f64,
        #[arg(long, default_value_t = DEFAULT_HEIGHT_MM)]
        height: f64,
        #[arg(long, default_value_t = DEFAULT_CORNER_RADIUS_MM)]
        radius: f64,
        /// Omit data-cols/data-rows from the SVG root.
        #[arg(long)]
        no_grid_metadata: bool,
    },
    /// Cut a photo into piece images along a generated SVG.
    Extract {
        image: PathBuf,
        svg: PathBuf,
        #[arg(short, long, env = "KATANUKI_OUTPUT_DIR", default_value = "pieces")]
        output: PathBuf,
        #[arg(long, env = "KATANUKI_PREFIX", default_value = "piece")]
        prefix: String,
        #[arg(long, default_value = "png")]
        format: String,
        #[arg(long, default_value_t = 30)]
        padding: u32,
        /// Centre every piece on a canvas of one shared size.
        #[arg(long)]
        fixed_size: bool,
        #[arg(long)]
        output_width: Option<u32>,
        #[arg(long)]
        output_height: Option<u32>,
        /// Keep per-piece masks and the allocation map under <output>/debug.
        #[arg(long)]
        debug: bool,
        #[arg(long, value_enum, default_value_t = BorderMode::Margin)]
        border: BorderMode,
        /// Band discarded on the bottom, left and right edges in margin mode.
        #[arg(long, default_value_t = BORDER_MARGIN_PX)]
        margin: u32,
        /// Cut stroke width in SVG units.
        #[arg(long, default_value_t = 1.0)]
        stroke_width: f32,
        /// Resolve contested pixels in reverse row-major order.
        #[arg(long)]
        reverse_scan: bool,
        #[arg(long)]
        no_manifest: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BorderMode {
    Margin,
    Crossing,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            grid,
            output,
            jitter,
            tabsize,
            seed,
            width,
            height,
            radius,
            no_grid_metadata,
        } => {
            let seed = match seed.as_deref() {
                Some(raw) => parse_seed_arg(raw)?,
                None => rand::rng().random_range(0..RANDOM_SEED_MAX),
            };
            let (cols, rows) = match grid.as_slice() {
                [cols, rows] => (*cols, *rows),
                _ => return Err("--grid takes COLS ROWS".into()),
            };
            let spec = PuzzleSpec::new(&PuzzleParams {
                width,
                height,
                cols,
                rows,
                tab_size_percent: tabsize,
                jitter_percent: jitter,
                seed,
                corner_radius: radius,
            })?;
            let options = SvgOptions {
                grid_metadata: !no_grid_metadata,
            };
            let svg = PathDocument::generate(&spec, options).to_svg();
            fs::write(&output, svg)?;

            println!("generated {cols}x{rows} puzzle");
            println!("seed: {seed}");
            println!("saved: {}", output.display());
        }
        Commands::Extract {
            image,
            svg,
            output,
            prefix,
            format,
            padding,
            fixed_size,
            output_width,
            output_height,
            debug,
            border,
            margin,
            stroke_width,
            reverse_scan,
            no_manifest,
        } => {
            let config = ExtractConfig {
                output_dir: output,
                prefix,
                format,
                padding,
                fixed_size,
                output_width,
                output_height,
                debug,
                border: match border {
                    BorderMode::Margin => BorderStrategy::Margin { band: margin },
                    BorderMode::Crossing => BorderStrategy::Crossing,
                },
                scan_order: if reverse_scan {
                    ScanOrder::Reversed
                } else {
                    ScanOrder::RowMajor
                },
                write_manifest: !no_manifest,
            };
            let extractor = Extractor::new(config, ResvgRasterizer { stroke_width });
            let report = match extractor.run(&image, &svg) {
                Ok(report) => report,
                Err(err) => {
                    if extractor.config().debug {
                        eprintln!(
                            "partial output kept in {}",
                            extractor.config().output_dir.display()
                        );
                    }
                    return Err(err.into());
                }
            };

            println!(
                "extracted {} pieces to {}",
                report.written.len(),
                extractor.config().output_dir.display()
            );
            if !report.skipped.is_empty() {
                println!("skipped {} pieces with missing cuts", report.skipped.len());
            }
            if !report.empty.is_empty() {
                println!("{} pieces had no pixels", report.empty.len());
            }
            println!("unowned pixels: {}", report.manifest.unowned_pixels);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }
    builder.init();
}

fn parse_seed_arg(raw: &str) -> Result<i64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<i64>()?
    };
    Ok(value)
}
