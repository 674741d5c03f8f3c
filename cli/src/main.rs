//! djvu2hocr CLI - convert the DjVu hidden text layer to hOCR

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use djvu2hocr::convert::{self, djvused, ConvertOptions, InputKind};
use djvu2hocr::render::{DEFAULT_LANGUAGE, DEFAULT_TITLE};
use djvu2hocr::{
    ConvertStats, JsonFormat, OutputFormat, PageSelection, ParseOptions, RenderOptions,
    WordSegmentation,
};

#[derive(Parser)]
#[command(name = "djvu2hocr")]
#[command(version)]
#[command(about = "Convert the hidden text layer of DjVu documents to hOCR", long_about = None)]
struct Cli {
    /// Input DjVu documents (or page dumps with --dump; "-" reads stdin)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Pages to convert (e.g., "17", "37-42", "1,3,5-7")
    #[arg(short, long, value_name = "PAGES")]
    pages: Option<String>,

    /// Word segmentation algorithm
    #[arg(long, value_enum, default_value = "simple")]
    word_segmentation: Segmentation,

    /// Language for word segmentation
    #[arg(short, long, value_name = "LANG", default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Document title
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Inline CSS for the document
    #[arg(long, default_value = "")]
    css: String,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Treat inputs as djvused page dumps instead of DjVu documents
    #[arg(long)]
    dump: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "hocr")]
    format: Format,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,

    /// Fail when the page stream ends before every requested page
    #[arg(long)]
    strict: bool,

    /// Replace invalid UTF-8 and control characters in the text layer
    #[arg(long)]
    sanitize_text: bool,

    /// djvused executable
    #[arg(long, value_name = "PATH", env = "DJVUSED", default_value = djvused::DEFAULT_PROGRAM)]
    djvused: PathBuf,

    /// Number of documents converted in parallel (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Output directory, one file per input (required for several inputs)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Report progress and statistics
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Segmentation {
    /// Keep the words of the text layer
    Simple,
    /// Recompute word boundaries with Unicode rules (UAX #29)
    Uax29,
}

impl From<Segmentation> for WordSegmentation {
    fn from(mode: Segmentation) -> Self {
        match mode {
            Segmentation::Simple => WordSegmentation::Simple,
            Segmentation::Uax29 => WordSegmentation::Uax29,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// XHTML document with hOCR markup
    Hocr,
    /// One JSON element tree per page
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Hocr => OutputFormat::Hocr,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = build_options(&cli).and_then(|options| {
        if cli.files.len() > 1 || cli.output_dir.is_some() {
            cmd_batch(&cli, &options)
        } else {
            cmd_convert(&cli.files[0], cli.output.as_deref(), &options, cli.verbose)
        }
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(cli: &Cli) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut render = RenderOptions::new()
        .with_segmentation(cli.word_segmentation.into())
        .with_language(cli.language.as_str())
        .with_title(cli.title.as_str())
        .with_css(cli.css.as_str());
    if let Some(ref pages) = cli.pages {
        render = render.with_pages(PageSelection::parse(pages)?);
    }
    let render = render.validated()?;

    let parse = ParseOptions::new().with_sanitize_text(cli.sanitize_text);
    let parse = if cli.strict { parse.strict() } else { parse.lenient() };

    let json_format = if cli.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let input = if cli.dump {
        InputKind::Dump
    } else {
        InputKind::Document
    };

    Ok(ConvertOptions::new()
        .with_render_options(render)
        .with_parse_options(parse)
        .with_format(cli.format.into())
        .with_json_format(json_format)
        .with_input(input)
        .with_djvused(&cli.djvused))
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    options: &ConvertOptions,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            let stats = convert::convert_file(input, &mut writer, options)?;
            writer.flush()?;
            if verbose {
                eprintln!("{} {}", "Written".green().bold(), path.display());
            }
            stats
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            convert::convert_file(input, &mut writer, options)?
        }
    };

    if verbose {
        print_stats(&stats);
    }
    Ok(())
}

fn cmd_batch(cli: &Cli, options: &ConvertOptions) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = cli
        .output_dir
        .as_deref()
        .ok_or("--output-dir is required when converting several files")?;
    if cli.files.iter().any(|f| f == Path::new("-")) {
        return Err("stdin cannot be part of a batch".into());
    }

    log::info!(
        "converting {} files into {} ({} jobs)",
        cli.files.len(),
        out_dir.display(),
        cli.jobs
    );

    let pb = ProgressBar::new(cli.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let items = convert::convert_files(&cli.files, out_dir, options, cli.jobs, |item| {
        if let Err(ref e) = item.result {
            pb.println(format!(
                "{} {}: {}",
                "Failed".red().bold(),
                item.input.display(),
                e
            ));
        }
        pb.set_message(item.input.display().to_string());
        pb.inc(1);
    })?;

    let failed = items.iter().filter(|item| !item.is_ok()).count();
    pb.finish_with_message("Done!");

    let mut total = ConvertStats::new();
    for item in &items {
        if let Ok(ref stats) = item.result {
            total.merge(stats);
        }
    }

    println!(
        "{} {} of {} files into {}",
        "Converted".green().bold(),
        items.len() - failed,
        items.len(),
        out_dir.display()
    );
    if cli.verbose {
        print_stats(&total);
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, items.len()).into());
    }
    Ok(())
}

fn print_stats(stats: &ConvertStats) {
    eprintln!("{}", "Statistics".cyan().bold());
    eprintln!("{}", "─".repeat(40).dimmed());
    eprintln!("{}: {}", "Pages".bold(), stats.pages_converted);
    eprintln!("{}: {}", "Words".bold(), stats.word_count);
    if !stats.is_complete() {
        eprintln!(
            "{}: stream ended early, {} page(s) missing",
            "Warning".yellow().bold(),
            stats.pages_missing()
        );
    }
}
