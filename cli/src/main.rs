//! pdf-worker CLI - PDF extraction pipeline and job worker

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_pipeline::config::{
    DEFAULT_MAX_PAGES, DEFAULT_MAX_PDF_SIZE_MB, DEFAULT_STORAGE_BUCKET, DEFAULT_TASK_TIMEOUT_SECS,
};
use pdf_pipeline::job::{JobSource, JsonLinesSource};
use pdf_pipeline::services::{
    Database, FsDatabase, LocalStorage, Storage, SupabaseDatabase, SupabaseStorage,
};
use pdf_pipeline::{
    compute_hash, detect_format_from_path, ExtractOptions, JobProcessor, PageExtractor, PdfSource,
    Pipeline, SupabaseConfig, Worker, WorkerConfig, WorkerStats,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdf-worker")]
#[command(version)]
#[command(about = "Extract text and tables from PDFs and process extraction jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction pipeline on a local PDF and print the result as JSON
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Document id recorded in the result (defaults to the file stem)
        #[arg(long, value_name = "ID")]
        document_id: Option<String>,

        /// Maximum accepted page count
        #[arg(long, env = "MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: u32,

        /// Extract pages one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Show page count, digest, and a per-page summary
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the SHA-256 digest of a file
    Hash {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Process JSON-lines jobs until the input is exhausted
    Worker(WorkerArgs),

    /// Show version information
    Version,
}

#[derive(Args)]
struct WorkerArgs {
    /// Job file, one JSON job per line ("-" for stdin)
    #[arg(long, value_name = "FILE", default_value = "-")]
    jobs: String,

    /// Read PDFs from this directory instead of Supabase Storage
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    /// Write results and statuses to this directory instead of Supabase
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase service role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Storage bucket holding uploaded PDFs
    #[arg(long, env = "STORAGE_BUCKET", default_value = DEFAULT_STORAGE_BUCKET)]
    bucket: String,

    /// Maximum accepted PDF size in MB
    #[arg(long, env = "MAX_PDF_SIZE_MB", default_value_t = DEFAULT_MAX_PDF_SIZE_MB)]
    max_pdf_size_mb: u64,

    /// Maximum accepted page count
    #[arg(long, env = "MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Per-job time limit in seconds
    #[arg(long, env = "TASK_TIMEOUT_SECONDS", default_value_t = DEFAULT_TASK_TIMEOUT_SECS)]
    task_timeout: u64,

    /// Root for job working directories
    #[arg(long, env = "TEMP_DIR")]
    temp_dir: Option<PathBuf>,
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
            document_id,
            max_pages,
            sequential,
        } => cmd_extract(
            &input,
            output.as_deref(),
            compact,
            document_id,
            max_pages,
            sequential,
        ),
        Commands::Info { input } => cmd_info(&input),
        Commands::Hash { input } => cmd_hash(&input),
        Commands::Worker(args) => cmd_worker(args),
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

fn init_logging() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    document_id: Option<String>,
    max_pages: u32,
    sequential: bool,
) -> CliResult {
    let document_id = document_id.unwrap_or_else(|| {
        input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    });

    let options = ExtractOptions::new().with_parallel(!sequential);
    let pipeline = Pipeline::with_extractor(PageExtractor::with_options(options), max_pages);

    let pb = spinner("Extracting...");
    let result = pipeline.run(&document_id, input);
    pb.finish_and_clear();
    let result = result?;

    let json = if compact {
        result.to_json_compact()?
    } else {
        result.to_json()?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!(
            "{} {} ({} pages, {} tables)",
            "Saved to".green(),
            path.display(),
            result.metadata.total_pages,
            result.metadata.total_tables
        );
    } else {
        println!("{}", json);
    }

    for error in &result.errors {
        eprintln!("{}: {}", "Warning".yellow(), error);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let format = detect_format_from_path(input)?;
    let extractor = PageExtractor::new();
    let doc = extractor.open(&PdfSource::Path(input))?;
    let pages = extractor.scan_pages(doc.as_ref())?;
    let digest = compute_hash(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!("{}: {}", "Pages".bold(), doc.page_count());
    println!("{}: {}", "SHA-256".bold(), digest);

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for page in &pages.items {
        let chars = if page.is_blank() {
            "blank".dimmed().to_string()
        } else {
            format!("{} chars", page.char_count())
        };
        println!(
            "{:>5}  {:<14} {} tables, {} images",
            page.page_number, chars, page.tables_count, page.images_count
        );
    }

    for error in &pages.errors {
        eprintln!("{}: {}", "Warning".yellow(), error);
    }

    Ok(())
}

fn cmd_hash(input: &Path) -> CliResult {
    println!("{}  {}", compute_hash(input)?, input.display());
    Ok(())
}

fn cmd_worker(args: WorkerArgs) -> CliResult {
    let mut config = WorkerConfig::new()
        .with_max_pdf_size_mb(args.max_pdf_size_mb)
        .with_max_pages(args.max_pages)
        .with_task_timeout_secs(args.task_timeout);
    if let Some(dir) = &args.temp_dir {
        config = config.with_temp_dir(dir);
    }

    let supabase = || -> Result<SupabaseConfig, Box<dyn std::error::Error>> {
        let url = args
            .supabase_url
            .clone()
            .ok_or("SUPABASE_URL is required without --storage-dir/--output-dir")?;
        let key = args
            .supabase_key
            .clone()
            .ok_or("SUPABASE_SERVICE_ROLE_KEY is required without --storage-dir/--output-dir")?;
        Ok(SupabaseConfig::new(url, key).with_bucket(args.bucket.clone()))
    };

    let storage: Arc<dyn Storage> = match &args.storage_dir {
        Some(dir) => Arc::new(LocalStorage::new(dir)),
        None => Arc::new(SupabaseStorage::new(supabase()?)?),
    };
    let database: Arc<dyn Database> = match &args.output_dir {
        Some(dir) => Arc::new(FsDatabase::new(dir)?),
        None => Arc::new(SupabaseDatabase::new(supabase()?)?),
    };

    let processor = Arc::new(JobProcessor::new(storage, database, config)?);
    let worker = Worker::new(processor);

    let reader: Box<dyn BufRead> = if args.jobs == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(fs::File::open(&args.jobs)?))
    };
    let mut source = JsonLinesSource::new(reader);

    let stats = if args.workers <= 1 {
        worker.run(&mut source)
    } else {
        run_pool(worker, &mut source, args.workers)
    };

    println!(
        "{} {} completed, {} failed, {} rejected",
        "Done!".green().bold(),
        stats.completed,
        stats.failed,
        stats.rejected
    );

    Ok(())
}

/// Feed jobs from `source` to a pool of worker threads.
fn run_pool<S: JobSource>(worker: Worker, source: &mut S, workers: usize) -> WorkerStats {
    let (tx, rx) = crossbeam_channel::bounded(workers);
    let pool = std::thread::spawn(move || worker.run_concurrent(rx, workers));

    let mut rejected = 0;
    while let Some(next) = source.next_job() {
        match next {
            Ok(job) => {
                if tx.send(job).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!("Skipping job record: {}", e);
                rejected += 1;
            }
        }
    }
    drop(tx);

    let mut stats = pool.join().unwrap_or_else(|_| {
        log::error!("Worker pool panicked");
        WorkerStats::default()
    });
    stats.rejected += rejected;
    stats
}

fn cmd_version() {
    println!("{} {}", "pdf-worker".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF extraction pipeline and job worker");
    println!();
    println!("License: MIT");
}
