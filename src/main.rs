//! # proxysheet CLI
//!
//! Usage:
//!   proxysheet --json deck.json
//!   proxysheet --json deck.json --duplex --cut-line-colour red -o deck.pdf

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use proxysheet::image_loader::HttpSource;
use proxysheet::layout::PrintMode;
use proxysheet::style::GuideColor;
use proxysheet::RenderOptions;

/// Generate a print-and-play PDF from a Tabletop Simulator deck export
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Arrange pages for duplex printing (each face page followed by its backs)
    #[arg(long)]
    duplex: bool,

    /// Path to the exported JSON file
    #[arg(long, default_value = "tt_json.json")]
    json: PathBuf,

    /// Colour of the cut lines (black, white, blue, red, green, yellow, orange)
    #[arg(long, alias = "cut_line_colour", default_value = "black")]
    cut_line_colour: String,

    /// Output PDF path [default: playing_cards.pdf, or playing_cards_duplex.pdf with --duplex]
    #[arg(short, long = "output-pdf", alias = "output_pdf")]
    output_pdf: Option<PathBuf>,

    /// Number of parallel image downloads
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// HTTP timeout per image, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn default_output(duplex: bool) -> PathBuf {
    if duplex {
        PathBuf::from("playing_cards_duplex.pdf")
    } else {
        PathBuf::from("playing_cards.pdf")
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let output = args.output_pdf.clone().unwrap_or_else(|| default_output(args.duplex));
    let title = args
        .json
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());

    let options = RenderOptions {
        mode: if args.duplex { PrintMode::Duplex } else { PrintMode::Simplex },
        guide_color: GuideColor::resolve(&args.cut_line_colour),
        jobs: args.jobs.max(1),
        title,
        ..RenderOptions::default()
    };
    let source = HttpSource::new(Duration::from_secs(args.timeout_secs));

    match proxysheet::run(&args.json, &output, &options, &source) {
        Ok(rendered) => {
            eprintln!(
                "✓ Written {} cards on {} pages to {}",
                rendered.card_count,
                rendered.page_count,
                output.display()
            );
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
