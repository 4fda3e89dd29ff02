use anyhow::{anyhow, Context as AnyhowContext, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use config::ReqgateConfig;
use reqgate_evidence::{EvidenceScanner, FsTree, ScanReport};
use reqgate_protocol::{RequirementRecord, StatusRow};
use reqgate_reconcile::{
    CommandJudge, EvidenceContext, HttpJudge, Judge, Reconciler, ReplayJudge, RunMode,
    StatusLedger,
};
use reqgate_report::{
    aggregate, read_status_rows, ArtifactWriter, CompletionPolicy, RunMetadata, SourceDocument,
};
use reqgate_requirements::{QualityReport, RequirementExtractor};
use serde_json::json;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod config;
mod discover;

#[derive(Parser)]
#[command(name = "reqgate")]
#[command(about = "Evidence-gated reconciliation of requirements against a codebase", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML); defaults to ./reqgate.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the requirements document into canonical records
    Extract(ExtractArgs),

    /// Scan a codebase for typed, file-anchored evidence
    Scan(ScanArgs),

    /// Extract, scan, reconcile through a judge and write every artifact
    Run(RunArgs),

    /// Completion rollup of an existing status file
    Summarize(SummarizeArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Requirements document (default: newest Requirements/*Canonical_Requirements*.md)
    #[arg(long)]
    doc: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "AgentInput")]
    out_dir: PathBuf,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ScanArgs {
    /// Codebase root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Requirements document named in the digest (default: discovered when present)
    #[arg(long)]
    doc: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "AgentInput")]
    out_dir: PathBuf,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("judge_source")
        .args(["judge_command", "judge_url", "judge_replay"])
        .multiple(false)
))]
struct RunArgs {
    /// Requirements document (default: newest Requirements/*Canonical_Requirements*.md)
    #[arg(long)]
    doc: Option<PathBuf>,

    /// Codebase root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Directory for input-side artifacts
    #[arg(long, default_value = "AgentInput")]
    input_dir: PathBuf,

    /// Directory for status artifacts
    #[arg(long, default_value = "AgentOutput")]
    output_dir: PathBuf,

    /// Run mode: test (first 5 requirements) or full
    #[arg(long)]
    run_mode: Option<RunMode>,

    /// Requirements per judge call
    #[arg(long)]
    batch_size: Option<usize>,

    /// Upper bound on requirements evaluated in full mode
    #[arg(long)]
    max_requirements: Option<usize>,

    /// Judge program: receives the request JSON on stdin, answers on stdout
    #[arg(long)]
    judge_command: Option<String>,

    /// Argument passed to the judge program (repeatable)
    #[arg(long = "judge-arg", requires = "judge_command")]
    judge_args: Vec<String>,

    /// Judge HTTP endpoint
    #[arg(long)]
    judge_url: Option<String>,

    /// Recorded judge responses (JSON array or JSON lines), served in order
    #[arg(long)]
    judge_replay: Option<PathBuf>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SummarizeArgs {
    /// Status JSONL file (requirements_status.jsonl)
    #[arg(long)]
    status: PathBuf,

    /// Status taxonomy JSON (default: [report].taxonomy from config)
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Output JSON instead of markdown
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON parsing
    let json_output = match &cli.command {
        Commands::Extract(args) => args.json,
        Commands::Scan(args) => args.json,
        Commands::Run(args) => args.json,
        Commands::Summarize(args) => args.json,
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

    let mut config = ReqgateConfig::load(cli.config.as_deref())?;
    config.apply_env()?;

    match cli.command {
        Commands::Extract(args) => run_extract(args, &config),
        Commands::Scan(args) => run_scan(args, &config),
        Commands::Run(args) => run_pipeline(args, config).await,
        Commands::Summarize(args) => run_summarize(args, &config),
    }
}

struct LoadedDocument {
    path: String,
    text: String,
    requirements: Vec<RequirementRecord>,
}

fn load_requirements(doc: Option<&Path>, config: &ReqgateConfig) -> Result<LoadedDocument> {
    let path = discover::resolve_document(doc)?;
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let path = path.to_string_lossy().replace('\\', "/");
    let requirements = RequirementExtractor::new(config.requirements.clone())
        .extract(&text, &path)
        .with_context(|| format!("Failed to extract requirements from {path}"))?;
    Ok(LoadedDocument {
        path,
        text,
        requirements,
    })
}

fn scan_codebase(root: &Path, config: &ReqgateConfig) -> Result<ScanReport> {
    let tree = FsTree::new(root)
        .context("Invalid codebase root")?
        .with_skip_dirs(&config.scan.skip_dirs)
        .respect_gitignore(config.scan.respect_gitignore)
        .max_file_bytes(config.scan.limits.max_file_bytes);
    let scanner = EvidenceScanner::new(config.scan.limits.clone())
        .context("Invalid [scan.limits]")?
        .with_scope(config.scan.scope());
    Ok(scanner.scan(&tree))
}

fn write_extract_artifacts(
    writer: &ArtifactWriter,
    requirements: &[RequirementRecord],
) -> Result<(Vec<PathBuf>, QualityReport)> {
    let mut written = writer.write_requirements(requirements)?;
    let quality = QualityReport::from_requirements(requirements);
    written.push(writer.write_quality_report(&quality)?);
    Ok((written, quality))
}

fn run_extract(args: ExtractArgs, config: &ReqgateConfig) -> Result<()> {
    let doc = load_requirements(args.doc.as_deref(), config)?;
    let writer = ArtifactWriter::new(&args.out_dir)?;
    let (written, quality) = write_extract_artifacts(&writer, &doc.requirements)?;

    if args.json {
        let out = json!({
            "document": doc.path,
            "requirements": doc.requirements.len(),
            "missing_acceptance_criteria": quality.missing.len(),
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        eprintln!(
            "Extracted {} requirements ({} without acceptance criteria) from {}",
            doc.requirements.len(),
            quality.missing.len(),
            doc.path
        );
        print_written(&written);
    }
    Ok(())
}

fn run_scan(args: ScanArgs, config: &ReqgateConfig) -> Result<()> {
    let document = match &args.doc {
        Some(path) => path.to_string_lossy().replace('\\', "/"),
        None => discover::resolve_document(None)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| "(none)".to_string()),
    };
    let report = scan_codebase(&args.root, config)?;
    let writer = ArtifactWriter::new(&args.out_dir)?;
    let written = writer.write_scan(&report, &document)?;

    if args.json {
        let out = json!({
            "files_scanned": report.files_scanned,
            "evidence": report.kind_counts(),
            "truncated": report.truncated,
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        eprintln!(
            "Scanned {} files: {} endpoints, {} tables, {} test files, {} UI surfaces, {} CI workflows",
            report.files_scanned,
            report.endpoints.len(),
            report.schema.tables.len(),
            report.tests.len(),
            report.ui_surfaces.len(),
            report.ci_workflows.len()
        );
        print_written(&written);
    }
    Ok(())
}

async fn run_pipeline(args: RunArgs, mut config: ReqgateConfig) -> Result<()> {
    if let Some(mode) = args.run_mode {
        config.reconcile.run_mode = mode;
    }
    if let Some(batch_size) = args.batch_size {
        config.reconcile.batch_size = batch_size;
    }
    if let Some(max_requirements) = args.max_requirements {
        config.reconcile.max_requirements = max_requirements;
    }
    config
        .reconcile
        .validate()
        .map_err(|e| anyhow!("Invalid run options: {e}"))?;
    let judge = build_judge(&args, &config)?;

    let doc = load_requirements(args.doc.as_deref(), &config)?;
    let input = ArtifactWriter::new(&args.input_dir)?;
    write_extract_artifacts(&input, &doc.requirements)?;

    let report = scan_codebase(&args.root, &config)?;
    input.write_scan(&report, &doc.path)?;

    let mut ledger = StatusLedger::seed(&doc.requirements);
    input.write_status_seed(ledger.records())?;

    let context = EvidenceContext::from_scan(&report, &doc.path);
    let reconciler = Reconciler::new(judge, config.reconcile.clone());
    let judge_description = reconciler.judge_description();
    let run = reconciler
        .run(&mut ledger, &doc.requirements, &context)
        .await
        .context("Reconciliation aborted")?;

    let classifier = config.report.classifier()?;
    let by_id: HashMap<&str, &RequirementRecord> = doc
        .requirements
        .iter()
        .map(|r| (r.requirement_id.as_str(), r))
        .collect();
    let rows: Vec<StatusRow> = ledger
        .records()
        .iter()
        .map(|record| {
            let milestone = by_id
                .get(record.requirement_id.as_str())
                .map_or(reqgate_report::DEFAULT_MILESTONE, |req| {
                    classifier.classify_record(req)
                });
            StatusRow::from_record(record, milestone)
        })
        .collect();

    let policy = CompletionPolicy::load(config.report.taxonomy.as_deref());
    let summary = aggregate(&rows, &policy);
    let meta = RunMetadata::from_run(
        &config.reconcile,
        &run,
        &summary,
        SourceDocument::from_text(&doc.path, &doc.text),
        judge_description,
    );

    let output = ArtifactWriter::new(&args.output_dir)?;
    let mut written = output.write_status(&rows, &meta)?;
    written.push(output.write_undocumented(&run.undocumented)?);
    written.push(output.write_milestone_summary(&summary)?);
    written.push(output.write_run_metadata(&meta)?);

    if args.json {
        let out = json!({
            "run": run,
            "report": summary,
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        eprintln!(
            "Reconciled {} of {} requirements in {} batches ({} downgraded by the evidence gate)",
            run.evaluated,
            doc.requirements.len(),
            run.batches,
            run.downgraded
        );
        eprintln!(
            "Complete: {} of {} ({:.1}%) under {}",
            summary.complete,
            summary.total,
            summary.completion_ratio() * 100.0,
            summary.policy
        );
        print_written(&written);
    }
    Ok(())
}

fn build_judge(args: &RunArgs, config: &ReqgateConfig) -> Result<Box<dyn Judge>> {
    let section = &config.judge;
    let timeout = Duration::from_secs(section.timeout_secs);

    if let Some(path) = &args.judge_replay {
        return replay_judge(path);
    }
    if let Some(program) = &args.judge_command {
        return Ok(Box::new(
            CommandJudge::new(program.clone(), args.judge_args.clone()).with_timeout(timeout),
        ));
    }
    if let Some(url) = &args.judge_url {
        return http_judge(url, config, timeout);
    }

    let configured = [
        section.replay.is_some(),
        section.command.is_some(),
        section.url.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if configured > 1 {
        return Err(anyhow!(
            "[judge] sets more than one of replay, command and url; keep exactly one"
        ));
    }
    if let Some(path) = &section.replay {
        return replay_judge(path);
    }
    if let Some(program) = &section.command {
        return Ok(Box::new(
            CommandJudge::new(program.clone(), section.args.clone()).with_timeout(timeout),
        ));
    }
    if let Some(url) = &section.url {
        return http_judge(url, config, timeout);
    }
    Err(anyhow!(
        "No judge configured: pass --judge-command, --judge-url or --judge-replay, or set [judge] in the config"
    ))
}

fn replay_judge(path: &Path) -> Result<Box<dyn Judge>> {
    let judge = ReplayJudge::load(path)
        .with_context(|| format!("Failed to load judge replay {}", path.display()))?;
    Ok(Box::new(judge))
}

fn http_judge(url: &str, config: &ReqgateConfig, timeout: Duration) -> Result<Box<dyn Judge>> {
    let token = match &config.judge.token_env {
        Some(var) => Some(
            env::var(var).with_context(|| format!("Judge token variable {var} is not set"))?,
        ),
        None => None,
    };
    let judge = HttpJudge::new(url, token, timeout).context("Failed to build HTTP judge")?;
    Ok(Box::new(judge))
}

fn run_summarize(args: SummarizeArgs, config: &ReqgateConfig) -> Result<()> {
    let rows = read_status_rows(&args.status)
        .with_context(|| format!("Failed to read status file {}", args.status.display()))?;
    let taxonomy = args.taxonomy.as_deref().or(config.report.taxonomy.as_deref());
    let policy = CompletionPolicy::load(taxonomy);
    let summary = aggregate(&rows, &policy);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", reqgate_report::render_milestone_summary(&summary));
    }
    Ok(())
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        eprintln!("Wrote: {}", path.display());
    }
}
