//! Certificate inventory import CLI

use cert_core::report::{self, ReportFormat};
use cert_core::{CertificateStore, ImportPipeline, ImportSummary, UploadedFile};
use cert_store::PgStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Upload size cap, enforced here rather than by the decoder.
const MAX_UPLOAD_BYTES: u64 = 1024 * 1024;

#[derive(Parser)]
#[command(name = "cert-import")]
#[command(about = "Employee certificate inventory import tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// PostgreSQL connection string (defaults to $DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import certificate files (.cer, .pfx) under one certificate type
    Files {
        /// Certificate type name from the catalog
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Certificate files to import
        files: Vec<PathBuf>,

        /// Output format (json, markdown)
        #[arg(short, long, default_value = "markdown")]
        output: String,
    },

    /// Import a CA-portal HTML export
    Portal {
        /// Exported HTML document
        file: PathBuf,

        /// Output format (json, markdown)
        #[arg(short, long, default_value = "markdown")]
        output: String,
    },

    /// Decode one certificate file and print the derived form fields
    Inspect {
        /// Certificate file
        file: PathBuf,
    },

    /// List certificates expiring within a window
    Expiring {
        /// Window size in days
        #[arg(long, default_value = "40")]
        days: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| {
            error!("no database configured; pass --database-url or set DATABASE_URL");
            std::process::exit(1);
        });

    let store = match PgStore::connect(&database_url).await {
        Ok(store) => store,
        Err(e) => {
            error!("database connection failed: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.migrate().await {
        error!("database migration failed: {e}");
        std::process::exit(1);
    }

    let today = chrono::Utc::now().date_naive();

    match cli.command {
        Commands::Files {
            type_name,
            files,
            output,
        } => cmd_files(store, type_name, files, output, today).await,
        Commands::Portal { file, output } => cmd_portal(store, file, output, today).await,
        Commands::Inspect { file } => cmd_inspect(store, file, today).await,
        Commands::Expiring { days } => cmd_expiring(store, days, today).await,
    }
}

async fn cmd_files(
    store: PgStore,
    type_name: String,
    paths: Vec<PathBuf>,
    output: String,
    today: chrono::NaiveDate,
) {
    if paths.is_empty() {
        error!("no files given");
        std::process::exit(1);
    }

    let certificate_type = match store.find_type_by_label(&type_name).await {
        Ok(Some(t)) => t,
        Ok(None) => {
            error!("unknown certificate type: {type_name}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("type lookup failed: {e}");
            std::process::exit(1);
        }
    };

    let mut uploads = Vec::with_capacity(paths.len());
    for path in &paths {
        match read_upload(path).await {
            Some(upload) => uploads.push(upload),
            None => continue,
        }
    }

    let pipeline = ImportPipeline::new(store.clone(), store);
    match pipeline.import_files(&uploads, &certificate_type, today).await {
        Ok(summary) => print_summary(&summary, &output),
        Err(e) => {
            error!("import failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn cmd_portal(store: PgStore, path: PathBuf, output: String, today: chrono::NaiveDate) {
    let html = match tokio::fs::read(&path).await {
        Ok(html) => html,
        Err(e) => {
            error!("cannot read {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    info!("importing portal export: {}", path.display());
    let pipeline = ImportPipeline::new(store.clone(), store);
    match pipeline.import_portal_export(&html, today).await {
        Ok(summary) => print_summary(&summary, &output),
        Err(e) => {
            error!("portal import failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn cmd_inspect(store: PgStore, path: PathBuf, today: chrono::NaiveDate) {
    let Some(upload) = read_upload(&path).await else {
        std::process::exit(1);
    };

    let pipeline = ImportPipeline::new(store.clone(), store);
    match pipeline.prefill(&upload, today).await {
        Ok(prefill) => match serde_json::to_string_pretty(&prefill) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                error!("failed to render prefill: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("inspection failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn cmd_expiring(store: PgStore, days: i64, today: chrono::NaiveDate) {
    match store.list_expiring(today, days).await {
        Ok(records) => {
            if records.is_empty() {
                println!("No certificates expire within {days} days.");
                return;
            }
            for record in records {
                println!(
                    "{}  expires {}  status {}  ({})",
                    record.serial, record.expiry_date, record.status, record.id
                );
            }
        }
        Err(e) => {
            error!("listing failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn read_upload(path: &PathBuf) -> Option<UploadedFile> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            error!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    if metadata.len() > MAX_UPLOAD_BYTES {
        warn!(
            "skipping {}: larger than {} bytes",
            path.display(),
            MAX_UPLOAD_BYTES
        );
        return None;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Some(UploadedFile { name, bytes })
}

fn print_summary(summary: &ImportSummary, output: &str) {
    let format = match output.to_lowercase().as_str() {
        "json" => ReportFormat::Json,
        _ => ReportFormat::Markdown,
    };
    match report::render(summary, format) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => {
            error!("failed to render summary: {e}");
            std::process::exit(1);
        }
    }
}
