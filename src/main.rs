use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use searchq::config::Config;
use searchq::search_query::{self, Dialect};
use searchq::sql::DateOverride;

mod cli;

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let config = Config::load_with(&args.config)?;
    tracing::debug!(config = ?config, "loaded config");

    match args.command {
        cli::Command::Ast { query, relational } => {
            let dialect = if relational {
                Dialect::Relational
            } else {
                Dialect::Document
            };
            print_json(&search_query::parse(&query, dialect)?)
        }

        cli::Command::Document { query, policy } => {
            let engine = searchq::document::DocumentSearch::new(policy.apply(config.document));
            print_json(&engine.search(&query)?)
        }

        cli::Command::Sql {
            query,
            policy,
            date_default_only,
        } => {
            let date_override = if date_default_only {
                DateOverride::DefaultOperatorOnly
            } else {
                config.date_override
            };
            let engine = searchq::sql::SqlSearch::new(policy.apply(config.relational))
                .with_date_override(date_override);
            print_json(&engine.search(query.as_deref())?)
        }
    }
}
