use anyhow::{Context, Result};
use arxiv_scout::config::{find_config_file, get_config, load_config, render_toml, Config};
use arxiv_scout::models::{ArxivPaper, ArxivQuery, DateRange, SortBy, SortOrder};
use arxiv_scout::ArxivSource;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// arXiv Scout - Search arXiv and fetch paper metadata
#[derive(Parser, Debug)]
#[command(name = "arxiv-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search arXiv and fetch paper metadata", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Plain)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable the response cache for this command
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortField {
    Submitted,
    Updated,
    Relevance,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    Asc,
    Desc,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search by keyword and/or category
    Search {
        /// Free-text keywords, AND-ed together
        #[arg(long, short)]
        keyword: Option<String>,

        /// Category code, e.g. cs.AI
        #[arg(long, short)]
        category: Option<String>,

        /// Offset of the first result
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Maximum number of results
        #[arg(long, short = 'n', default_value_t = 10)]
        max_results: usize,

        /// Only papers published on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only papers published on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Sort field
        #[arg(long, value_enum, default_value_t = SortField::Submitted)]
        sort_by: SortField,

        /// Sort order
        #[arg(long, value_enum, default_value_t = Order::Desc)]
        sort_order: Order,
    },

    /// Fetch papers by arXiv id or URL
    Fetch {
        /// Ids such as 2101.00001, arXiv:2101.00001v2 or https://arxiv.org/abs/2101.00001
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config(path).with_context(|| format!("loading {}", path.display()));
    }
    if let Some(path) = find_config_file() {
        return load_config(&path).with_context(|| format!("loading {}", path.display()));
    }
    Ok(get_config()?)
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("arxiv_scout={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn output_papers(papers: &[ArxivPaper], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(papers)?),
        OutputFormat::Plain => {
            for paper in papers {
                println!("{}", paper.title);
                println!("  {}", paper.authors_joined());
                println!(
                    "  {} | {} | {}",
                    paper.published,
                    paper.primary_category.as_deref().unwrap_or("-"),
                    paper.link
                );
                println!();
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    if cli.no_cache {
        config.cache.enabled = false;
    }

    let source = ArxivSource::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling request");
            on_interrupt.cancel();
        }
    });

    let papers = match cli.command {
        Commands::Search {
            keyword,
            category,
            start,
            max_results,
            from,
            to,
            sort_by,
            sort_order,
        } => {
            let mut query = ArxivQuery::new()
                .start(start)
                .max_results(max_results)
                .published(DateRange::from_dates(from, to))
                .sort_by(match sort_by {
                    SortField::Submitted => SortBy::SubmittedDate,
                    SortField::Updated => SortBy::LastUpdatedDate,
                    SortField::Relevance => SortBy::Relevance,
                })
                .sort_order(match sort_order {
                    Order::Asc => SortOrder::Ascending,
                    Order::Desc => SortOrder::Descending,
                });
            query.keyword = keyword;
            query.category = category;

            source.search_with_cancellation(&query, &cancel).await?
        }
        Commands::Fetch { ids } => source.fetch_by_ids_with_cancellation(&ids, &cancel).await?,
        Commands::Config => {
            print!("{}", render_toml(&config)?);
            return Ok(());
        }
    };

    if !cli.quiet {
        eprintln!("Found {} papers", papers.len());
    }
    output_papers(&papers, cli.output)
}
