use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use codesum_chunker::{Chunker, FsSource, SourceProvider};
use codesum_graph::DependencyResolver;
use codesum_summarizer::{
    build_generator, CacheMode, Orchestrator, PipelineStats, ProjectResult, PromptLog,
    SummaryClient,
};
use config::AppConfig;
use scanner::ProjectScanner;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod scanner;

#[derive(Parser)]
#[command(name = "codesum")]
#[command(about = "Summarize a source tree chunk by chunk with a text-generation service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Configuration file (default: ./codesum.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize every chunk, file and the whole project
    Summarize(SummarizeArgs),

    /// Show chunks and their resolved dependencies without generating text
    Chunks(ChunksArgs),
}

#[derive(Args)]
struct SummarizeArgs {
    /// Project root
    path: PathBuf,

    /// Output file (default: summary_<project>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result artifact as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Args)]
struct ChunksArgs {
    /// Project root
    path: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    tuning: TuningArgs,
}

/// Command-line overrides for configuration values
#[derive(Args, Default)]
struct TuningArgs {
    /// Number of summarization workers
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum concurrent chunk tasks
    #[arg(long)]
    pool_size: Option<usize>,

    /// Lines per chunk window
    #[arg(long)]
    window_size: Option<usize>,

    /// Lines shared by consecutive windows
    #[arg(long)]
    overlap: Option<usize>,

    /// Wait for in-flight dependency summaries instead of skipping them
    #[arg(long)]
    await_in_flight: bool,
}

impl TuningArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(workers) = self.workers {
            config.summarizer.worker_count = workers;
        }
        if let Some(pool_size) = self.pool_size {
            config.summarizer.pool_size = pool_size;
        }
        if let Some(window_size) = self.window_size {
            config.chunking.window_size = window_size;
        }
        if let Some(overlap) = self.overlap {
            config.chunking.overlap_size = overlap;
        }
        if self.await_in_flight {
            config.summarizer.cache_mode = CacheMode::AwaitInFlight;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON output
    let json_output = match &cli.command {
        Commands::Summarize(args) => args.json,
        Commands::Chunks(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_env()?;

    match cli.command {
        Commands::Summarize(args) => {
            args.tuning.apply(&mut config);
            config.validate()?;
            run_summarize(args, config).await
        }
        Commands::Chunks(args) => {
            args.tuning.apply(&mut config);
            config.validate()?;
            run_chunks(args, config)
        }
    }
}

fn scan_project(root: &Path, config: &AppConfig) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("Project path {} is not a directory", root.display());
    }
    let files = ProjectScanner::new(root, &config.project)?.scan();
    if files.is_empty() {
        log::warn!(
            "No files with extensions {:?} under {}",
            config.project.extensions,
            root.display()
        );
    }
    Ok(files)
}

fn project_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "project".to_string())
}

async fn run_summarize(args: SummarizeArgs, config: AppConfig) -> Result<()> {
    let files = scan_project(&args.path, &config)?;
    let name = project_name(&args.path);

    let stats = Arc::new(PipelineStats::new());
    let generator = build_generator(&config.llm, Some(stats.clone()))?;
    let mut client = SummaryClient::new(generator, stats.clone());
    if config.output.prompt_log_sample_percent > 0 {
        client = client.with_prompt_log(PromptLog::new(
            &config.output.prompt_log_dir,
            config.output.prompt_log_sample_percent,
        ));
    }

    let chunker = Chunker::java(config.chunking.clone())?;
    let source: Arc<dyn SourceProvider> = Arc::new(FsSource);
    let orchestrator =
        Orchestrator::new(config.summarizer.clone(), chunker, source, Arc::new(client))?;

    let project_path = args.path.display().to_string();
    let result = orchestrator
        .run(&project_path, &files)
        .await
        .context("Summarization pipeline failed")?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("summary_{name}.json")));
    result
        .write_json(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    stats
        .export(&config.output.stats_dir, &name)
        .context("Failed to write statistics")?;

    if args.json {
        println!("{}", result.to_json()?);
    } else {
        print_summary(&result, &output);
    }
    Ok(())
}

fn print_summary(result: &ProjectResult, output: &Path) {
    println!("Project: {}", result.project_path);
    println!(
        "Files: {} | Chunks: {} | File summaries: {}",
        result.total_files,
        result.total_chunks,
        result.file_summaries.len()
    );
    println!();
    println!("{}", result.project_summary);
    println!();
    println!("Results saved to {}", output.display());
}

fn run_chunks(args: ChunksArgs, config: AppConfig) -> Result<()> {
    let files = scan_project(&args.path, &config)?;

    let chunker = Chunker::java(config.chunking.clone())?;
    let chunks = chunker.chunk_files(&files, &FsSource);
    let resolver = DependencyResolver::build(&files, &FsSource, chunker.analyzer().clone());

    if args.json {
        let rows: Vec<serde_json::Value> = chunks
            .iter()
            .map(|chunk| {
                let scan = resolver.find_dependencies(chunk);
                serde_json::json!({
                    "file_path": chunk.file_path,
                    "start_line": chunk.start_line,
                    "end_line": chunk.end_line,
                    "enclosing_type": chunk.enclosing_type,
                    "call_sites": scan.call_sites,
                    "dependencies": scan.dependencies,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for chunk in &chunks {
        let scan = resolver.find_dependencies(chunk);
        println!(
            "{}:{}-{} ({} lines, {}/{} calls resolved)",
            chunk.file_path,
            chunk.start_line,
            chunk.end_line,
            chunk.line_count(),
            scan.dependencies.len(),
            scan.call_sites
        );
        for dep in &scan.dependencies {
            println!("    -> {dep}");
        }
    }
    println!("{}", Chunker::get_stats(&chunks));
    Ok(())
}
