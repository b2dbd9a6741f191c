mod config;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use precobot_chat::{run_server, Router};
use precobot_core::{CatalogStats, MarkupQuote};
use precobot_store::{CatalogStore, LineStatus, MutationReport};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "precobot",
    version,
    about = "Internal price-catalog assistant for the repair counter"
)]
struct Cli {
    /// Catalog directory (overrides config)
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    /// Canonical output file (overrides config)
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chat transport on stdio
    Serve,

    /// Look up prices by case-insensitive substring
    Lookup {
        /// Search text, e.g. "bateria iphone 14"
        query: String,
    },

    /// Append catalog entries, one product per line
    Add {
        /// Lines to add (reads stdin if omitted)
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Replace a model's options, one product per line
    Edit {
        /// Lines to apply (reads stdin if omitted)
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Compute a markup quote from cost, logistics, and sale price
    Mkp {
        /// Part cost
        #[arg(long)]
        cost: f64,

        /// Total logistics cost
        #[arg(long)]
        logistics: f64,

        /// Final sale price
        #[arg(long)]
        sale: f64,
    },

    /// Show catalog statistics
    Stats,

    /// Show the active configuration path
    Config,
}

fn default_catalog_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "precobot", "precobot")
        .map(|dirs| dirs.data_dir().join("catalog"))
        .unwrap_or_else(|| PathBuf::from("catalog"))
}

fn open_store(cli: &Cli, config: &Config) -> Result<CatalogStore> {
    let dir = cli
        .catalog_dir
        .clone()
        .or_else(|| config.catalog.dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_catalog_dir);
    let output = cli
        .out
        .clone()
        .or_else(|| config.catalog.output.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| dir.join("precos.json"));

    CatalogStore::open(&dir, &output)
        .with_context(|| format!("failed to load catalog from {}", dir.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;

    match &cli.command {
        Commands::Serve => {
            let store = open_store(&cli, &config)?;
            let router =
                Router::new(Arc::new(store)).with_greeting(config.chat.greeting.clone());
            run_server(&router)
        }
        Commands::Lookup { query } => {
            let store = open_store(&cli, &config)?;
            cmd_lookup(&store, query)
        }
        Commands::Add { text } => {
            let store = open_store(&cli, &config)?;
            let text = text_or_stdin(text.clone())?;
            cmd_add(&store, &text)
        }
        Commands::Edit { text } => {
            let store = open_store(&cli, &config)?;
            let text = text_or_stdin(text.clone())?;
            cmd_edit(&store, &text)
        }
        Commands::Mkp {
            cost,
            logistics,
            sale,
        } => cmd_mkp(*cost, *logistics, *sale),
        Commands::Stats => {
            let store = open_store(&cli, &config)?;
            cmd_stats(&store.stats())
        }
        Commands::Config => {
            println!("{}", config::show_config_path());
            Ok(())
        }
    }
}

fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(t) => Ok(t),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn cmd_lookup(store: &CatalogStore, query: &str) -> Result<()> {
    let results = store.lookup(query);
    if results.is_empty() {
        println!("no match for \"{query}\"");
        return Ok(());
    }
    for (name, price) in &results {
        println!("{name}: R$ {price:.2}");
    }
    Ok(())
}

fn cmd_add(store: &CatalogStore, text: &str) -> Result<()> {
    let report = store.add(text)?;
    print_report(&report);
    Ok(())
}

fn cmd_edit(store: &CatalogStore, text: &str) -> Result<()> {
    let report = store.edit(text)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &MutationReport) {
    for line in &report.lines {
        match line {
            LineStatus::Added { code, names } => {
                println!("added {code}: {}", names.join(", "));
            }
            LineStatus::Replaced { code, names } => {
                println!("replaced {code}: {}", names.join(", "));
            }
            LineStatus::NoMatch { model } => {
                println!("no record matched model \"{model}\"");
            }
            LineStatus::Skipped => {
                println!("skipped line without a price");
            }
        }
    }
    if report.lines.is_empty() {
        println!("nothing to do");
    }
}

fn cmd_mkp(cost: f64, logistics: f64, sale: f64) -> Result<()> {
    let Some(quote) = MarkupQuote::compute(cost, logistics, sale) else {
        bail!("cost, logistics, and royalty add up to zero — nothing to quote");
    };

    println!("cost: R$ {:.2}", quote.cost);
    println!("logistics: R$ {:.2}", quote.logistics);
    println!("royalty (10%): R$ {:.2}", quote.royalty);
    println!("total cost: R$ {:.2}", quote.total_cost);
    println!("sale: R$ {:.2}", quote.sale);
    println!("markup: {:.2} ({})", quote.markup, quote.band);
    println!("ideal sale (3.0): R$ {:.2}", quote.ideal_sale);
    println!("minimum sale (2.5): R$ {:.2}", quote.minimum_sale);
    Ok(())
}

fn cmd_stats(stats: &CatalogStats) -> Result<()> {
    println!("records: {}", stats.total_records);
    println!("options: {}", stats.total_options);
    println!("price entries: {}", stats.total_prices);
    Ok(())
}
