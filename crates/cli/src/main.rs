//! # forumlens CLI
//!
//! Operator-facing entry point for the forum-conversation pipeline. One
//! subcommand per stage: declare the collection, ingest the JSON export,
//! submit the enrichment job, then aggregate, summarize, export and pivot
//! the enriched corpus. Each stage is independently re-runnable; all state
//! lives in the hosted collection and the local CSV snapshots.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use forumlens::analysis::{self, ANALYSIS_FIELDS, EXPORT_FIELDS};
use forumlens::categories::{registry_for, ROOT_CAUSES, TECHNICAL_DOMAINS};
use forumlens::enrich::{self, standard_operations, PollConfig};
use forumlens::ingest::{self, SchemaOutcome, DEFAULT_BATCH_SIZE};
use forumlens::providers::{CollectionStore, TransformationAgentClient, WeaviateStore};
use forumlens::schema::{forum_post_schema, SchemaVersion};
use forumlens::{AppConfig, Filter};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Declare the collection schema (drop-and-recreate on conflict)
    Init(InitArgs),
    /// Load a JSON export and upsert it into the collection in batches
    Ingest(IngestArgs),
    /// Submit the enrichment operations and wait for the job to finish
    Enrich(EnrichArgs),
    /// Aggregate each enriched property and print grouped counts
    Analyze,
    /// Generative summary over a filtered slice of the corpus
    Summarize(SummarizeArgs),
    /// Ask the model to propose support-topic categories from a sample
    SuggestCategories(SuggestCategoriesArgs),
    /// Export the enriched corpus to a flat CSV
    Export(ExportArgs),
    /// Pivot an exported CSV into the heatmap counts matrix (offline)
    Report(ReportArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaVersionArg {
    /// The first layout with a single uncapped conversation field
    Original,
    /// The revised layout with a capped conversation plus its full twin
    Capped,
}

impl From<SchemaVersionArg> for SchemaVersion {
    fn from(value: SchemaVersionArg) -> Self {
        match value {
            SchemaVersionArg::Original => SchemaVersion::Original,
            SchemaVersionArg::Capped => SchemaVersion::CappedConversation,
        }
    }
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Schema revision to create
    #[arg(long, value_enum, default_value = "capped")]
    schema_version: SchemaVersionArg,
    /// Replace an existing collection without asking
    #[arg(long)]
    yes: bool,
}

#[derive(Parser, Debug)]
struct IngestArgs {
    /// Path to the JSON array of forum threads
    file: PathBuf,
    /// Ingest only the first N records
    #[arg(long)]
    limit: Option<usize>,
    /// Documents per upload batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Parser, Debug)]
struct EnrichArgs {
    /// Seconds between status polls
    #[arg(long, default_value_t = 10)]
    poll_secs: u64,
    /// Give up after this many polls
    #[arg(long, default_value_t = 360)]
    max_polls: u32,
}

#[derive(Parser, Debug)]
struct SummarizeArgs {
    /// Root cause code to filter on
    #[arg(long, default_value = "conceptual_misunderstanding")]
    root_cause: String,
    /// Technical domain code to filter on
    #[arg(long, default_value = "queries")]
    domain: String,
    /// Maximum documents fed to the model
    #[arg(long, default_value_t = 100)]
    limit: usize,
}

#[derive(Parser, Debug)]
struct SuggestCategoriesArgs {
    /// Sample size fed to the model
    #[arg(long, default_value_t = 30)]
    limit: usize,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Output CSV path
    #[arg(long, default_value = "data/transformed_data.csv")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Exported CSV to pivot
    #[arg(long = "in", default_value = "data/transformed_data.csv")]
    input: PathBuf,
    /// Output CSV path for the pivoted counts
    #[arg(long, default_value = "data/heatmap_data.csv")]
    out: PathBuf,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let subscriber = fmt::Subscriber::builder()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => handle_init(args).await,
        Commands::Ingest(args) => handle_ingest(args).await,
        Commands::Enrich(args) => handle_enrich(args).await,
        Commands::Analyze => handle_analyze().await,
        Commands::Summarize(args) => handle_summarize(args).await,
        Commands::SuggestCategories(args) => handle_suggest_categories(args).await,
        Commands::Export(args) => handle_export(args).await,
        Commands::Report(args) => handle_report(args),
    }
}

fn store_from_config(config: &AppConfig) -> Result<WeaviateStore> {
    Ok(WeaviateStore::new(
        &config.weaviate_url,
        &config.weaviate_api_key,
        config.anthropic_api_key.as_deref(),
    )?)
}

/// Asks for a y/n keystroke before a destructive replacement.
fn confirm_replace(name: &str) -> Result<bool> {
    print!("Collection '{name}' already exists. Do you want to delete it? (y/n): ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

// --- Command Handlers ---

async fn handle_init(args: InitArgs) -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = store_from_config(&config)?;
    let schema = forum_post_schema(&config.collection_name, args.schema_version.into());

    let mut replace = args.yes;
    if !replace && store.collection_exists(&schema.name).await? {
        if confirm_replace(&schema.name)? {
            replace = true;
        } else {
            println!("Exiting without deleting the collection.");
            return Ok(());
        }
    }

    match ingest::ensure_collection(&store, &schema, replace).await? {
        SchemaOutcome::Created => println!("Created collection '{}'.", schema.name),
        SchemaOutcome::Replaced => println!("Replaced collection '{}'.", schema.name),
    }
    Ok(())
}

async fn handle_ingest(args: IngestArgs) -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = store_from_config(&config)?;

    let threads = ingest::load_threads(&args.file, args.limit)?;
    let report =
        ingest::upsert_threads(&store, &config.collection_name, &threads, args.batch_size)
            .await?;

    println!(
        "Uploaded {} of {} threads in {} batches.",
        report.succeeded(),
        report.attempted,
        report.batches
    );
    for failure in report.failures.iter().take(5) {
        println!("Failed to add object {}: {}", failure.id, failure.message);
    }
    if report.failures.len() > 5 {
        println!("...and {} more failures.", report.failures.len() - 5);
    }

    let count = store.count_objects(&config.collection_name).await?;
    println!("Collection '{}' now holds {count} documents.", config.collection_name);
    Ok(())
}

async fn handle_enrich(args: EnrichArgs) -> Result<()> {
    let config = AppConfig::from_env()?;
    let agent = TransformationAgentClient::new(&config.weaviate_url, &config.weaviate_api_key)?;

    let operations = standard_operations();
    info!("Submitting {} enrichment operations", operations.len());
    let job = enrich::submit_enrichment(&agent, &config.collection_name, &operations).await?;
    println!("Enrichment workflow started: {}", job.workflow_id);

    let poll = PollConfig {
        interval: Duration::from_secs(args.poll_secs),
        max_polls: args.max_polls,
    };
    let outcome = enrich::await_completion(&agent, &job, &poll).await?;
    println!(
        "Workflow {} finished in state '{}' after {:.2} seconds ({} polls).",
        job.workflow_id, outcome.state, outcome.duration_secs, outcome.polls
    );
    if !outcome.is_completed() {
        bail!("Enrichment ended in terminal state '{}'", outcome.state);
    }
    Ok(())
}

async fn handle_analyze() -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = store_from_config(&config)?;

    for field in ANALYSIS_FIELDS {
        let groups =
            analysis::aggregate_by_field(&store, &config.collection_name, field, None).await?;
        println!("\nProperty: {field}");
        for group in groups {
            println!("Value: {} Count: {}", group.value, group.count);
        }
    }

    // Which domains dominate when the root cause was a conceptual one.
    let filter = Filter::equals("rootCauseCategory", "conceptual_misunderstanding");
    let groups = analysis::aggregate_by_field(
        &store,
        &config.collection_name,
        "technicalDomain",
        Some(&filter),
    )
    .await?;
    println!("\nProperty: technicalDomain (rootCauseCategory = conceptual_misunderstanding)");
    for group in groups {
        println!("Value: {} Count: {}", group.value, group.count);
    }
    Ok(())
}

async fn handle_summarize(args: SummarizeArgs) -> Result<()> {
    if registry_for("rootCauseCategory").is_some_and(|r| !r.contains(&args.root_cause)) {
        bail!("'{}' is not a known root cause code", args.root_cause);
    }
    if registry_for("technicalDomain").is_some_and(|r| !r.contains(&args.domain)) {
        bail!("'{}' is not a known technical domain code", args.domain);
    }

    let config = AppConfig::from_env()?;
    let store = store_from_config(&config)?;

    let filter = Filter::equals("rootCauseCategory", args.root_cause.as_str())
        .and("technicalDomain", args.domain.as_str());
    let task = "From these forum post conversations, identify 3-5 most common things \
                that we can help users to understand better. \
                If possible, also provide a count of each type in the sample.";
    let text = analysis::summarize_filtered(
        &store,
        &config.collection_name,
        Some(&filter),
        args.limit,
        task,
        &["summary", "title"],
    )
    .await?;
    println!("\n{text}");
    Ok(())
}

async fn handle_suggest_categories(args: SuggestCategoriesArgs) -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = store_from_config(&config)?;

    let task = "Using this sample of forum post conversations and common sense, \
                categorize these forum posts for support topics into 5-10 categories. \
                We will use them on a larger dataset, so please make sure the \
                categories are general enough. Write each category also into a \
                snake case format, like 'data_import'.";
    let text = analysis::summarize_filtered(
        &store,
        &config.collection_name,
        None,
        args.limit,
        task,
        &["conversation", "title"],
    )
    .await?;
    println!("{text}");
    Ok(())
}

async fn handle_export(args: ExportArgs) -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = store_from_config(&config)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let exported =
        analysis::export_flat(&store, &config.collection_name, EXPORT_FIELDS, &args.out).await?;
    println!("Exported {exported} rows to {}.", args.out.display());
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let pairs =
        analysis::pair_counts_from_csv(&args.input, "rootCauseCategory", "technicalDomain")?;
    let pivot = analysis::pivot_report(&pairs, &ROOT_CAUSES, &TECHNICAL_DOMAINS);

    // Quick console preview before writing the file.
    println!("{}\t{}", pivot.row_field, pivot.cols.join("\t"));
    for (row, cells) in pivot.rows.iter().zip(&pivot.cells) {
        let rendered: Vec<String> = cells.iter().map(u64::to_string).collect();
        println!("{row}\t{}", rendered.join("\t"));
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    pivot.write_csv(&args.out)?;
    println!("Wrote pivoted counts to {}.", args.out.display());
    Ok(())
}
