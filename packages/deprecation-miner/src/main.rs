//! Deprecation miner CLI
//!
//! Extracts deprecation facts from release notes, verifies snippet cases
//! against a real interpreter, and builds edit requests from extracted facts.
//! Logs go to stderr; results go to stdout and JSON artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_client::CompletionOptions;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deprecation_miner::artifact::{builtin_cases, read_cases, read_facts, read_json, write_json};
use deprecation_miner::config::Config;
use deprecation_miner::{
    Aggregator, BehaviorClassifier, ClassificationResult, EditRequest, HttpFetcher, LocalityProbe,
    SchemaExtractor, SnippetHarness, SourceStatus, VerificationSummary, DEFAULT_SOURCES,
};

#[derive(Parser)]
#[command(name = "deprecation-miner")]
#[command(about = "Mine API deprecations from release notes and verify them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract deprecation facts from release notes
    Extract {
        /// Source URL (repeatable). Defaults to the built-in release notes.
        #[arg(long = "source")]
        sources: Vec<String>,

        /// File with one source URL per line
        #[arg(long)]
        sources_file: Option<PathBuf>,

        #[arg(long, default_value = "extracted_deprecations.json")]
        output: PathBuf,
    },

    /// Run old/new snippet pairs and check the old code's behavior
    Verify {
        /// JSON list of cases. Defaults to the bundled Python catalog.
        #[arg(long)]
        cases: Option<PathBuf>,

        /// Write per-case results and the summary as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Per-snippet timeout in seconds
        #[arg(long, env = "SNIPPET_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,
    },

    /// Build an edit request from extracted facts
    EditRequests {
        #[arg(long)]
        facts: PathBuf,

        /// JSON mapping of probe name to {prompt: [...], ground_truth: [...]}
        #[arg(long)]
        locality: Option<PathBuf>,

        #[arg(long)]
        sequential: bool,

        #[arg(long)]
        output: PathBuf,
    },

    /// Run one completion against the local completion model
    Complete {
        prompt: String,

        #[arg(long, default_value_t = 1024)]
        max_tokens: u32,

        #[arg(long, default_value_t = 0.1)]
        temperature: f32,
    },
}

#[derive(Serialize)]
struct VerificationReport<'a> {
    summary: VerificationSummary,
    results: &'a [ClassificationResult],
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,deprecation_miner=debug,llm_client=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Extract {
            sources,
            sources_file,
            output,
        } => extract(&config, sources, sources_file.as_deref(), &output).await,
        Commands::Verify {
            cases,
            report,
            timeout_secs,
        } => verify(&config, cases.as_deref(), report.as_deref(), timeout_secs).await,
        Commands::EditRequests {
            facts,
            locality,
            sequential,
            output,
        } => edit_requests(&facts, locality.as_deref(), sequential, &output),
        Commands::Complete {
            prompt,
            max_tokens,
            temperature,
        } => complete(&config, &prompt, max_tokens, temperature).await,
    }
}

async fn extract(
    config: &Config,
    mut sources: Vec<String>,
    sources_file: Option<&Path>,
    output: &Path,
) -> Result<()> {
    if let Some(path) = sources_file {
        let listing = fs::read_to_string(path)
            .with_context(|| format!("failed to read sources file {}", path.display()))?;
        sources.extend(parse_source_list(&listing));
    }
    if sources.is_empty() {
        sources = DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect();
    }

    let retry = config.retry_policy();
    let fetcher = HttpFetcher::new(config.fetch_config(), retry)?;
    let extractor = SchemaExtractor::new(config.generator()?)
        .with_retry(retry)
        .with_config(config.extraction_config());
    let aggregator =
        Aggregator::new(fetcher, extractor).with_config(config.aggregator_config());

    let report = aggregator.run_and_persist(&sources, output).await?;

    for source in &report.sources {
        match &source.status {
            SourceStatus::Extracted => {
                println!("ok      {} ({} facts)", source.source_id, source.fact_count)
            }
            SourceStatus::FetchFailed(e) => println!("fetch   {} failed: {}", source.source_id, e),
            SourceStatus::ExtractionFailed(e) => {
                println!("extract {} failed: {}", source.source_id, e)
            }
        }
    }

    if report.facts.is_empty() {
        println!("No facts extracted.");
    } else {
        println!("Persisted {} facts to {}", report.facts.len(), output.display());
    }

    Ok(())
}

/// One source per line; blank lines and `#` comments are skipped.
fn parse_source_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

async fn verify(
    config: &Config,
    cases_path: Option<&Path>,
    report_path: Option<&Path>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let cases = match cases_path {
        Some(path) => read_cases(path)?,
        None => builtin_cases()?,
    };
    tracing::info!(count = cases.len(), "Verifying snippet cases");

    let mut harness_config = config.harness_config();
    if let Some(secs) = timeout_secs {
        harness_config = harness_config.with_timeout(std::time::Duration::from_secs(secs));
    }
    let classifier = BehaviorClassifier::new(SnippetHarness::new(harness_config)?);

    let results = classifier.classify_all(&cases).await;

    for result in &results {
        let verdict = if result.confirmed() {
            "confirmed"
        } else if result.old_matched_expected {
            "new failed"
        } else {
            "unexpected"
        };
        println!(
            "{:<10} {} (old: {:?}, new: {:?})",
            verdict, result.case_name, result.old_outcome.exit_status, result.new_outcome.exit_status
        );
    }

    let summary = VerificationSummary::from_results(&results);
    println!("{}", summary);

    if let Some(path) = report_path {
        write_json(
            path,
            &VerificationReport {
                summary,
                results: &results,
            },
        )?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn edit_requests(
    facts_path: &Path,
    locality_path: Option<&Path>,
    sequential: bool,
    output: &Path,
) -> Result<()> {
    let facts = read_facts(facts_path)?;

    let mut request = EditRequest::from_facts(&facts).with_sequential_edit(sequential);
    if let Some(path) = locality_path {
        let probes: BTreeMap<String, LocalityProbe> = read_json(path)?;
        request = request.with_locality_probes(probes);
    }

    request
        .validate()
        .with_context(|| format!("cannot build edit request from {}", facts_path.display()))?;
    write_json(output, &request)?;

    println!("Wrote {} edits to {}", request.len(), output.display());
    Ok(())
}

async fn complete(config: &Config, prompt: &str, max_tokens: u32, temperature: f32) -> Result<()> {
    let client = config.ollama_client();
    let options = CompletionOptions {
        max_tokens,
        temperature,
        ..Default::default()
    };

    let text = config
        .retry_policy()
        .call(|| client.generate(prompt, &options))
        .await
        .context("completion failed")?;

    println!("{}", text);
    Ok(())
}
