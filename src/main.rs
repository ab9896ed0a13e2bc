use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use changeclass::github::{
    import_builds, parse_repo_slug, BuildSource, GitHubActionsSource, JsonFileSource,
};
use changeclass::models::{ChangeSummary, CommitChanges};
use changeclass::vcs::history_url;
use changeclass::{
    ChangeTaxonomy, ClassificationPipeline, CommitPairResolver, Config, Distiller, GitBackend,
    GitHubClient, HistoryIngester, HistoryStore, PipelineConfig, ProcessDistiller,
    SelectionPolicy, Storage, VersionControl,
};

#[derive(Parser, Debug)]
#[command(name = "changeclass")]
#[command(version = "0.1.0")]
#[command(about = "Classify source changes between commit pairs into maintenance activities")]
struct Args {
    /// Database path for storing results (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine the commits of a repository into the database
    Ingest {
        /// Local path or remote url of the repository
        repo: String,
    },

    /// Import CI build results for an ingested repository
    ImportBuilds {
        /// Local path or remote url the repository was ingested from
        repo: String,

        /// GitHub repository as owner/name (derived from the repo url if omitted)
        #[arg(long, conflicts_with = "file")]
        github: Option<String>,

        /// JSON file of builds instead of GitHub Actions
        #[arg(long)]
        file: Option<PathBuf>,

        /// Maximum workflow runs to fetch
        #[arg(long)]
        max_runs: Option<usize>,
    },

    /// Classify the changes of commit pairs and store the tallies
    Classify {
        /// Local path or remote url of an ingested repository
        repo: String,

        #[arg(long, value_enum, default_value = "all")]
        policy: Policy,

        /// Base revision for --policy pair
        #[arg(long, required_if_eq("policy", "pair"))]
        base: Option<String>,

        /// Target revision for --policy pair
        #[arg(long, required_if_eq("policy", "pair"))]
        target: Option<String>,

        /// Distiller command (overrides DISTILLER_COMMAND)
        #[arg(long)]
        distiller: Option<String>,

        /// Also store a tally per changed file
        #[arg(long)]
        per_file: bool,

        /// Give up a build walk after this many first parents
        #[arg(long)]
        max_walk_depth: Option<usize>,

        /// Hide the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// Distill and classify two versions of a single file
    DistillFiles {
        old: PathBuf,
        new: PathBuf,

        /// Distiller command (overrides DISTILLER_COMMAND)
        #[arg(long)]
        distiller: Option<String>,
    },

    /// Print stored tallies for a repository
    Show {
        repo: String,

        /// Output format (json, text, markdown)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    All,
    Bugfix,
    Builds,
    Pair,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("changeclass=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let storage = Storage::new(&config.database_path)?;

    match args.command {
        Command::Ingest { repo } => {
            let backend = GitBackend::open_or_clone(&repo)?;
            let ingester = HistoryIngester::new(&storage, &config.bugfix_pattern)?;
            let summary = ingester.ingest(&backend)?;
            println!(
                "Ingested {} commits ({} bug fixes) from {}",
                summary.commits, summary.bugfixes, summary.vcs_system.url
            );
        }

        Command::ImportBuilds {
            repo,
            github,
            file,
            max_runs,
        } => {
            let url = history_url(&repo);
            let vcs_system = storage
                .vcs_system_by_url(&url)?
                .ok_or_else(|| anyhow::anyhow!("{} has not been ingested", url))?;

            let source: Box<dyn BuildSource> = match file {
                Some(path) => Box::new(JsonFileSource::new(path)),
                None => {
                    let slug = github.as_deref().unwrap_or(&repo);
                    let (owner, name) = parse_repo_slug(slug)?;
                    let client = GitHubClient::new(config.github_token.as_deref())?;
                    Box::new(
                        GitHubActionsSource::new(client, &owner, &name).with_max_runs(max_runs),
                    )
                }
            };

            let summary = import_builds(source.as_ref(), &storage, &vcs_system).await?;
            println!(
                "Imported {} builds, {} linked to mined commits",
                summary.builds, summary.linked
            );
        }

        Command::Classify {
            repo,
            policy,
            base,
            target,
            distiller,
            per_file,
            max_walk_depth,
            no_progress,
        } => {
            let distiller = process_distiller(distiller.as_deref(), &config)?;
            let backend = GitBackend::open_or_clone(&repo)?;

            let policy = match policy {
                Policy::All => SelectionPolicy::AllCommits,
                Policy::Bugfix => SelectionPolicy::BugfixCommits,
                Policy::Builds => SelectionPolicy::BuildLinked,
                Policy::Pair => SelectionPolicy::SinglePair {
                    base: base.unwrap_or_default(),
                    target: target.unwrap_or_default(),
                },
            };

            let mut pipeline_config = PipelineConfig::from(&config);
            pipeline_config.per_file_results |= per_file;
            pipeline_config.show_progress = !no_progress;
            if max_walk_depth.is_some() {
                pipeline_config.max_walk_depth = max_walk_depth;
            }

            let resolver = CommitPairResolver::new(&storage, &backend, policy)?
                .with_max_walk_depth(pipeline_config.max_walk_depth);
            let pipeline = ClassificationPipeline::new(
                &backend,
                &storage,
                &distiller,
                resolver.vcs_system().id,
                pipeline_config,
            );

            tracing::info!("Classifying {} with {:?}", backend.url(), resolver.policy());
            let summary = pipeline.run(&resolver)?;
            println!(
                "Classified {} pairs: {} stored, {} not analyzed, {} failed",
                summary.total(),
                summary.processed,
                summary.not_analyzed,
                summary.failed
            );
        }

        Command::DistillFiles { old, new, distiller } => {
            let distiller = process_distiller(distiller.as_deref(), &config)?;
            distill_files(&distiller, &old, &new);
        }

        Command::Show {
            repo,
            format,
            output,
        } => {
            let url = history_url(&repo);
            let vcs_system = storage
                .vcs_system_by_url(&url)?
                .ok_or_else(|| anyhow::anyhow!("{} has not been ingested", url))?;
            let results = storage.list_commit_changes(vcs_system.id)?;

            let rendered = match format.as_str() {
                "json" => serde_json::to_string_pretty(&results)?,
                "markdown" => format_markdown(&url, &results),
                _ => format_text(&url, &results),
            };

            if let Some(ref path) = output {
                std::fs::write(path, &rendered)?;
                tracing::info!("Output written to: {}", path);
            } else {
                println!("{}", rendered);
            }
        }
    }

    Ok(())
}

fn process_distiller(flag: Option<&str>, config: &Config) -> anyhow::Result<ProcessDistiller> {
    let command = flag
        .or(config.distiller_command.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!("no distiller configured; set DISTILLER_COMMAND or pass --distiller")
        })?;
    Ok(ProcessDistiller::new(command)?)
}

fn distill_files(distiller: &dyn Distiller, old: &Path, new: &Path) {
    let taxonomy = ChangeTaxonomy::new();
    let changes = changeclass::distiller::distill(distiller, old, new);

    if changes.is_empty() {
        println!("No changes extracted (counts as 1 OTHER)");
        return;
    }

    for change in &changes {
        let label = match taxonomy.classify(change) {
            Ok(category) => category.to_string(),
            Err(_) => "UNCLASSIFIED".to_string(),
        };
        println!(
            "{:<14} {} on {}",
            label, change.change_kind, change.changed_entity
        );
    }
}

fn short(hash: &str) -> &str {
    hash.get(..10).unwrap_or(hash)
}

fn format_text(url: &str, results: &[CommitChanges]) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n=== Change classification: {} ===\n\n", url));
    output.push_str(&format!("Pairs stored: {}\n\n", results.len()));

    for result in results {
        let changes = match result.summary() {
            ChangeSummary::NotAnalyzed => "not analyzed".to_string(),
            ChangeSummary::Tally(tally) => tally
                .iter()
                .map(|(category, count)| format!("{}={}", category, count))
                .collect::<Vec<_>>()
                .join(" "),
        };
        output.push_str(&format!(
            "  {} -> {}  {}\n",
            short(&result.old_revision),
            short(&result.new_revision),
            changes
        ));
    }

    output
}

fn format_markdown(url: &str, results: &[CommitChanges]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Change classification: {}\n\n", url));
    output.push_str("| Base | Target | DATA | COMPUTATION | INTERFACE | LOGIC_CONTROL | OTHER |\n");
    output.push_str("|------|--------|------|-------------|-----------|---------------|-------|\n");

    for result in results {
        let cells = match &result.changes {
            None => "- | - | - | - | -".to_string(),
            Some(tally) => changeclass::models::Category::ALL
                .iter()
                .map(|category| tally.get(*category).to_string())
                .collect::<Vec<_>>()
                .join(" | "),
        };
        output.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            short(&result.old_revision),
            short(&result.new_revision),
            cells
        ));
    }

    output
}
