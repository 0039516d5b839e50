use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use redline_diff::{
    CompareError, CompareSettings, Locale, SettingsFile, compare, format_markdown_report,
};
use redline_model::{Document, ModelError, load_json, parse_plain, render_redline, save_json};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "redline")]
#[command(about = "Compare two documents and write a merged document with tracked revisions")]
struct Cli {
    /// Author recorded on every revision.
    author: String,
    original: PathBuf,
    modified: PathBuf,
    /// `.json` writes the merged document as JSON, anything else as annotated text.
    output: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    detail_threshold: Option<i64>,

    #[arg(long, value_enum)]
    locale: Option<CliLocale>,

    /// TOML settings file; command-line flags take precedence.
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    report: ReportFormat,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLocale {
    Default,
    Simple,
    Cjk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
    None,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{} is not valid UTF-8 text", .0.display())]
    NotText(PathBuf),

    #[error("{}: {source}", .path.display())]
    Malformed { path: PathBuf, source: ModelError },

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error(transparent)]
    Compare(#[from] CompareError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Read { .. } | CliError::Write { .. } | CliError::Encode(_) => 1,
            CliError::MissingInput(_) => 3,
            CliError::NotText(_) | CliError::Malformed { .. } => 4,
            CliError::Compare(CompareError::MalformedDocument(_)) => 4,
            CliError::Compare(CompareError::InvalidConfiguration(_)) => 5,
            CliError::Compare(CompareError::InvariantViolation(_)) => 6,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let settings = resolve_settings(cli)?;
    let original = load_document(&cli.original)?;
    let modified = load_document(&cli.modified)?;

    let comparison = compare(&original, &modified, &settings)?;
    write_document(&cli.output, &comparison.merged)?;

    println!("Revisions found: {}", comparison.revisions.len());
    match cli.report {
        ReportFormat::Markdown => println!(
            "{}",
            format_markdown_report(
                &comparison,
                &cli.original.display().to_string(),
                &cli.modified.display().to_string(),
            )
        ),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&comparison)
                .map_err(|err| CliError::Encode(err.to_string()))?
        ),
        ReportFormat::None => {}
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<CompareSettings, CliError> {
    let mut settings = CompareSettings::default();
    if let Some(path) = &cli.settings {
        let text = read_text(path)?;
        settings = SettingsFile::from_toml_str(&text)?.apply(settings)?;
        debug!(path = %path.display(), "loaded settings file");
    }

    let flags = SettingsFile {
        author: Some(cli.author.clone()),
        detail_threshold: cli.detail_threshold,
        locale: cli.locale.map(|locale| match locale {
            CliLocale::Default => Locale::Default,
            CliLocale::Simple => Locale::Simple,
            CliLocale::Cjk => Locale::Cjk,
        }),
        parallel: None,
    };
    Ok(flags.apply(settings)?)
}

fn load_document(path: &Path) -> Result<Document, CliError> {
    let bytes = read_bytes(path)?;
    let malformed = |source: ModelError| CliError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    let mut doc = if is_json(path) {
        load_json(&bytes).map_err(malformed)?
    } else {
        let text = String::from_utf8(bytes).map_err(|_| CliError::NotText(path.to_path_buf()))?;
        parse_plain(&text).map_err(malformed)?
    };
    if doc.metadata.source_name.is_none() {
        doc.metadata.source_name = Some(path.display().to_string());
    }
    debug!(path = %path.display(), blocks = doc.blocks.len(), "loaded document");
    Ok(doc)
}

fn write_document(path: &Path, doc: &Document) -> Result<(), CliError> {
    let bytes = if is_json(path) {
        save_json(doc).map_err(|err| CliError::Encode(err.to_string()))?
    } else {
        render_redline(doc).into_bytes()
    };
    fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => CliError::MissingInput(path.to_path_buf()),
        _ => CliError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn read_text(path: &Path) -> Result<String, CliError> {
    String::from_utf8(read_bytes(path)?).map_err(|_| CliError::NotText(path.to_path_buf()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
