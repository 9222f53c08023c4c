//! pagesift CLI - PDF classification and per-page text extraction

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagesift::output::{self, JsonFormat};
use pagesift::{
    classify, Config, DocumentKind, ExtractOptions, Extractor, PageKind, PageSelection,
};

#[derive(Parser)]
#[command(name = "pagesift")]
#[command(version)]
#[command(about = "Classify PDFs and extract per-page text with a vision model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one text record per page
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Configuration file
        #[arg(
            short,
            long,
            value_name = "CONFIG",
            env = "PAGESIFT_CONFIG",
            default_value = "config.json"
        )]
        config: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Treat unreadable text layers and images as empty instead of failing
        #[arg(long)]
        lenient: bool,

        /// Don't send embedded images on text pages to the vision model
        #[arg(long)]
        no_images: bool,
    },

    /// Classify a PDF as pure, scanned, or combined
    Classify {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// JSON document with one record per page
    Json,
    /// Plain text with a header per page
    Text,
}

fn main() {
    env_logger::init();

    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            config,
            output,
            format,
            compact,
            pages,
            lenient,
            no_images,
        } => cmd_extract(
            &input,
            &config,
            output.as_deref(),
            format,
            compact,
            pages.as_deref(),
            lenient,
            no_images,
        ),
        Commands::Classify { input, pages } => cmd_classify(&input, pages.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p)?),
        None => Ok(PageSelection::All),
    }
}

fn kind_label(kind: DocumentKind) -> colored::ColoredString {
    match kind {
        DocumentKind::Pure => kind.to_string().green(),
        DocumentKind::Scanned => kind.to_string().yellow(),
        DocumentKind::Combined => kind.to_string().cyan(),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_extract(
    input: &Path,
    config_path: &Path,
    output: Option<&Path>,
    format: Format,
    compact: bool,
    pages: Option<&str>,
    lenient: bool,
    no_images: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    log::debug!("Using model {} from {}", config.ai_model, config_path.display());

    let mut options = ExtractOptions::new()
        .with_pages(page_selection(pages)?)
        .with_image_descriptions(!no_images);
    if lenient {
        options = options.lenient();
    }

    let extractor = Extractor::from_config(&config)?.with_options(options);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}...", input.display()));

    let result = extractor.extract(input);
    pb.finish_and_clear();
    let result = result?;

    let rendered = match format {
        Format::Json => {
            let json_format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            output::to_json(&result, json_format)?
        }
        Format::Text => output::to_text(&result),
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", rendered);
    }

    let empty = result.pages.iter().filter(|r| r.is_empty()).count();
    eprintln!(
        "{} {} document, {} page(s), {} empty",
        "Done!".green().bold(),
        kind_label(result.kind),
        result.page_count(),
        empty
    );

    Ok(())
}

fn cmd_classify(input: &Path, pages: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let options = ExtractOptions::new().with_pages(page_selection(pages)?);
    let classification = classify::classify_file(input, &options)?;

    println!("{}", "Document Classification".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Kind".bold(), kind_label(classification.kind));
    println!("{}: {}", "Pages".bold(), classification.pages.len());
    println!(
        "{}: {}",
        "Scanned pages".bold(),
        classification.scanned_pages()
    );
    println!(
        "{}: {}",
        "Embedded images".bold(),
        classification.embedded_images()
    );

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for profile in &classification.pages {
        let kind = profile.kind();
        let label = match kind {
            PageKind::Text => kind.to_string().green(),
            PageKind::TextWithImages => kind.to_string().cyan(),
            PageKind::Scanned => kind.to_string().yellow(),
        };
        println!(
            "  {:>4}  {:<12} {}",
            profile.page,
            label,
            format!("{} image(s)", profile.image_count).dimmed()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagesift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF classification and per-page text extraction");
    println!();
    println!("License: MIT");
}
