use std::fs;
use std::path::Path;
use std::process;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;

use lektio_app::cli::{Cli, Commands, CompleteArgs, ExtractArgs};
use lektio_app::config;
use lektio_app::error::AppError;
use lektio_app::pipeline::{DocumentPipeline, ExtractedRecord};
use lektio_app::services::ocr::OcrHandle;
use lektio_app::services::reconcile::MissingFieldValues;
use lektio_app::services::subjects::SubjectCatalogEntry;
use lektio_app::services::UploadedFile;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose));

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt().with_max_level(level).with_target(false).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Extract(args) => run_extract(args).await,
        Commands::Complete(args) => run_complete(args),
    }
}

async fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let config = config::load()?;

    let bytes = fs::read(&args.file).map_err(|source| AppError::Io {
        path: args.file.clone(),
        source,
    })?;
    let mime_type = mime_for_path(&args.file).ok_or_else(|| AppError::UnknownFileType {
        path: args.file.clone(),
    })?;
    let name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let file = UploadedFile {
        name,
        mime_type: mime_type.to_string(),
        bytes,
    };

    let catalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => Vec::new(),
    };

    let ocr = OcrHandle::spawn(config.ocr.clone());
    let pipeline = DocumentPipeline::new(&config);
    let result = pipeline.extract_document(&file, &catalog, &ocr).await;
    ocr.shutdown().await;

    print_record(&result?, args.pretty)
}

fn run_complete(args: CompleteArgs) -> Result<(), AppError> {
    let raw = fs::read(&args.record).map_err(|source| AppError::Io {
        path: args.record.clone(),
        source,
    })?;
    let mut record: ExtractedRecord = serde_json::from_slice(&raw)?;

    DocumentPipeline::complete_missing(
        &mut record,
        MissingFieldValues {
            subject: args.subject,
            deadline: args.deadline,
        },
    );

    print_record(&record, args.pretty)
}

fn load_catalog(path: &Path) -> Result<Vec<SubjectCatalogEntry>, AppError> {
    let raw = fs::read(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&raw)?)
}

fn print_record(record: &ExtractedRecord, pretty: bool) -> Result<(), AppError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    println!("{rendered}");
    Ok(())
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
