//! obo-dataset command line interface
//!
//! # Usage
//!
//! ```bash
//! # Parse an ontology into JSON files plus a binary snapshot
//! obo-dataset build --input data/datasets/cl.obo --out out/cl --snapshot out/cl.bin
//!
//! # Unseen-concept train/test folds from the snapshot's query set
//! obo-dataset split --snapshot out/cl.bin --out out/cl/folds --folds 3
//!
//! # Negative pairs for the dictionary set
//! obo-dataset negatives --snapshot out/cl.bin --set dictionary --out out/cl/pairs
//!
//! # Download every ontology listed in the registry dump
//! obo-dataset fetch --manifest data/ontologies.jsonld --out-dir data/datasets
//! ```
//!
//! Settings come from `--config` (or `OBO_DATASET_CONFIG`); flags override them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use obo_dataset::catalog::{CatalogFetcher, CatalogManifest};
use obo_dataset::config::DatasetConfig;
use obo_dataset::negative::NegativeSampler;
use obo_dataset::ontology::dataset::read_pairs;
use obo_dataset::ontology::{OntologyDataset, OntologyParser};
use obo_dataset::split::{write_folds, FoldSplitter};

#[derive(Parser)]
#[command(name = "obo-dataset")]
#[command(version)]
#[command(about = "Build entity-normalization datasets from OBO ontologies")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML config file (defaults to $OBO_DATASET_CONFIG, then built-in defaults)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log progress at INFO level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PairSet {
    Dictionary,
    Query,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an ontology file into vocabulary, mentions, edges and dictionary/query sets
    Build {
        /// OBO file to parse
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the JSON outputs
        #[arg(short, long)]
        out: PathBuf,

        /// Also write a binary snapshot here
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Fraction of each concept's synonyms moved into the dictionary
        #[arg(long)]
        migration_rate: Option<f64>,

        /// Keep names and synonyms exactly as written
        #[arg(long)]
        no_normalize: bool,

        /// `typo||correction` dictionary for the normalizer
        #[arg(long)]
        typo_path: Option<PathBuf>,
    },

    /// Split query pairs into train/test folds
    Split {
        /// Snapshot whose query set is split
        #[arg(long, conflicts_with = "queries", required_unless_present = "queries")]
        snapshot: Option<PathBuf>,

        /// JSON file of `[mention, id]` pairs to split instead
        #[arg(long)]
        queries: Option<PathBuf>,

        /// Directory receiving fold_{k}/train.json and fold_{k}/test.json
        #[arg(short, long)]
        out: PathBuf,

        /// Row-level split instead of concept-disjoint
        #[arg(long)]
        seen: bool,

        #[arg(long)]
        test_fraction: Option<f64>,

        #[arg(long)]
        folds: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Synthesize negative (mention, concept) pairs
    Negatives {
        #[arg(long)]
        snapshot: PathBuf,

        /// Which mention set supplies the positive pairs
        #[arg(long, value_enum, default_value = "query")]
        set: PairSet,

        /// Directory receiving positive.json and negative.json
        #[arg(short, long)]
        out: PathBuf,

        #[arg(long)]
        per_positive: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Download ontologies listed in a registry dump
    Fetch {
        #[arg(long)]
        manifest: Option<PathBuf>,

        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Print statistics of a snapshot
    Stats {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match load_config(cli.config.as_ref()) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DatasetConfig> {
    match path {
        Some(path) => DatasetConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => DatasetConfig::from_env().context("Failed to load config from OBO_DATASET_CONFIG"),
    }
}

async fn run(command: Commands, mut config: DatasetConfig) -> Result<()> {
    match command {
        Commands::Build {
            input,
            out,
            snapshot,
            migration_rate,
            no_normalize,
            typo_path,
        } => {
            if let Some(rate) = migration_rate {
                config.migration_rate = rate;
            }
            if no_normalize {
                config.use_normalizer = false;
            }
            if typo_path.is_some() {
                config.normalizer.typo_path = typo_path;
            }
            cmd_build(&config, input, out, snapshot)
        }
        Commands::Split {
            snapshot,
            queries,
            out,
            seen,
            test_fraction,
            folds,
            seed,
        } => {
            if seen {
                config.split.unseen = false;
            }
            if let Some(f) = test_fraction {
                config.split.test_fraction = f;
            }
            if let Some(k) = folds {
                config.split.folds = k;
            }
            if let Some(s) = seed {
                config.split.seed = s;
            }
            cmd_split(&config, snapshot, queries, out)
        }
        Commands::Negatives {
            snapshot,
            set,
            out,
            per_positive,
            seed,
        } => {
            if let Some(n) = per_positive {
                config.negatives.per_positive = n;
            }
            if let Some(s) = seed {
                config.negatives.seed = s;
            }
            cmd_negatives(&config, snapshot, set, out)
        }
        Commands::Fetch { manifest, out_dir } => {
            if let Some(m) = manifest {
                config.fetch.manifest = m;
            }
            if let Some(d) = out_dir {
                config.fetch.output_dir = d;
            }
            cmd_fetch(&config).await
        }
        Commands::Stats { snapshot } => cmd_stats(snapshot),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_build(
    config: &DatasetConfig,
    input: PathBuf,
    out: PathBuf,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    config.validate()?;
    let parser = OntologyParser::from_config(config)?;
    let dataset = parser
        .parse_file(&input)
        .with_context(|| format!("Failed to read ontology {}", input.display()))?;

    dataset.write_json_dir(&out)?;
    if let Some(path) = snapshot {
        dataset.save_binary(&path)?;
    }

    println!(
        "{} Built dataset from {} into {}",
        "OK".green(),
        input.display(),
        out.display()
    );
    print!("{}", dataset.stats);
    Ok(())
}

fn cmd_split(
    config: &DatasetConfig,
    snapshot: Option<PathBuf>,
    queries: Option<PathBuf>,
    out: PathBuf,
) -> Result<()> {
    let pairs = match (snapshot, queries) {
        (Some(path), _) => load_snapshot(&path)?.query,
        (None, Some(path)) => read_pairs(&path)
            .with_context(|| format!("Failed to read query pairs {}", path.display()))?,
        (None, None) => anyhow::bail!("either --snapshot or --queries is required"),
    };

    let folds = FoldSplitter::from_config(&config.split)?.split(&pairs);
    write_folds(&out, &folds)?;

    println!(
        "{} Wrote {} fold(s) of {} query pairs to {}",
        "OK".green(),
        folds.len(),
        pairs.len(),
        out.display()
    );
    for (k, fold) in folds.iter().enumerate() {
        println!(
            "  fold {}: train {} / test {} ({:.1}% test)",
            k,
            fold.train.len(),
            fold.test.len(),
            fold.test_share() * 100.0
        );
    }
    Ok(())
}

fn cmd_negatives(
    config: &DatasetConfig,
    snapshot: PathBuf,
    set: PairSet,
    out: PathBuf,
) -> Result<()> {
    let dataset = load_snapshot(&snapshot)?;
    let positives = match set {
        PairSet::Dictionary => &dataset.dictionary,
        PairSet::Query => &dataset.query,
    };

    let pairs = NegativeSampler::from_config(&config.negatives)?
        .sample(&dataset.concept_ids(), positives)?;
    pairs.write_json_dir(&out)?;

    println!(
        "{} Wrote {} positive and {} negative pairs to {}",
        "OK".green(),
        pairs.positive.len(),
        pairs.negative.len(),
        out.display()
    );
    Ok(())
}

async fn cmd_fetch(config: &DatasetConfig) -> Result<()> {
    let fetch = &config.fetch;
    let manifest = CatalogManifest::load(&fetch.manifest, &fetch.skip_ids)
        .with_context(|| format!("Failed to load manifest {}", fetch.manifest.display()))?;

    let report = CatalogFetcher::from_config(fetch)?
        .fetch_all(&manifest, &fetch.output_dir)
        .await?;

    println!(
        "{} Fetched {}/{} ontologies into {}",
        "OK".green(),
        report.fetched.len(),
        manifest.len(),
        fetch.output_dir.display()
    );
    for (id, error) in &report.failed {
        println!("  {} {}: {}", "FAILED".red(), id, error);
    }
    Ok(())
}

fn cmd_stats(snapshot: PathBuf) -> Result<()> {
    let dataset = load_snapshot(&snapshot)?;
    println!("Source hash: {}", dataset.source_hash);
    print!("{}", dataset.stats);
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<OntologyDataset> {
    OntologyDataset::load_binary(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}
