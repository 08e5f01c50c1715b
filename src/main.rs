//! Command-line entry point for the DataJud search client.
//!
//! Exposes one subcommand per caller-facing operation and prints results
//! as pretty JSON. The API key is taken from `DATAJUD_API_KEY`.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use datajud_search::{Config, CourtCategory, DatajudClient, Instance};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datajud-search", version, about = "Query the DataJud public judicial-process API")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exact lookup by process number
    Number {
        /// Court alias, e.g. tjsp
        court: String,
        /// Process number, punctuated or digits-only
        number: String,
        #[arg(long, default_value_t = 10)]
        size: usize,
    },
    /// Search by procedural class (code or name)
    Class {
        court: String,
        class: String,
        #[arg(long, default_value_t = 10)]
        size: usize,
        /// Inclusive lower bound on filing date (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<String>,
        /// Inclusive upper bound on filing date (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<String>,
        /// Instance level: G1, G2 or JE
        #[arg(long)]
        instance: Option<String>,
    },
    /// Search by party name
    Party {
        court: String,
        name: String,
        #[arg(long, default_value_t = 10)]
        size: usize,
    },
    /// All processes filed between two dates
    DateRange {
        court: String,
        /// Inclusive lower bound (YYYY-MM-DD)
        date_from: String,
        /// Inclusive upper bound (YYYY-MM-DD)
        date_to: String,
        #[arg(long, default_value_t = 10)]
        size: usize,
        #[arg(long)]
        instance: Option<String>,
    },
    /// List known courts
    Courts {
        /// Filter by category: superior, federal, state, labor, electoral, military
        #[arg(long)]
        category: Option<String>,
    },
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

fn parse_instance(value: Option<&str>) -> anyhow::Result<Option<Instance>> {
    value.map(str::parse::<Instance>).transpose().map_err(Into::into)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let client = DatajudClient::new(config)?;

    match cli.command {
        Command::Number { court, number, size } => {
            let result = client.search_by_number(&court, &number, size).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Class {
            court,
            class,
            size,
            date_from,
            date_to,
            instance,
        } => {
            let date_from = date_from.as_deref().map(parse_date).transpose()?;
            let date_to = date_to.as_deref().map(parse_date).transpose()?;
            let instance = parse_instance(instance.as_deref())?;
            let result = client
                .search_by_class(&court, &class, size, date_from, date_to, instance)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Party { court, name, size } => {
            let result = client.search_by_party(&court, &name, size).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::DateRange {
            court,
            date_from,
            date_to,
            size,
            instance,
        } => {
            let result = client
                .search_by_date_range(
                    &court,
                    parse_date(&date_from)?,
                    parse_date(&date_to)?,
                    size,
                    parse_instance(instance.as_deref())?,
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Courts { category } => {
            let category = category
                .as_deref()
                .map(str::parse::<CourtCategory>)
                .transpose()?;
            let courts = client.list_courts(category);
            println!("{}", serde_json::to_string_pretty(&courts)?);
        }
    }

    Ok(())
}
