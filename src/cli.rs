use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use searchq::policy::FieldPolicy;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Policy file (YAML). Missing file means empty policies.
    #[clap(short, long, default_value = "searchq.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the policy read from the config file.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Comma separated fields a bare token searches
    #[clap(long)]
    pub any: Option<String>,

    /// Comma separated fields matched by pattern instead of equality
    #[clap(long = "string")]
    pub is_string: Option<String>,

    /// Comma separated date fields
    #[clap(long = "date")]
    pub is_date: Option<String>,
}

impl PolicyArgs {
    pub fn apply(&self, mut policy: FieldPolicy) -> FieldPolicy {
        if let Some(any) = &self.any {
            policy = policy.with_any(parse_fields(any));
        }
        if let Some(is_string) = &self.is_string {
            policy = policy.with_is_string(parse_fields(is_string));
        }
        if let Some(is_date) = &self.is_date {
            policy = policy.with_is_date(parse_fields(is_date));
        }
        policy
    }
}

pub fn parse_fields(fields: &str) -> Vec<String> {
    fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the parsed syntax tree
    Ast {
        #[clap(allow_hyphen_values = true)]
        query: String,

        /// Lex with the relational dialect (no `-` negation)
        #[clap(long, default_value = "false")]
        relational: bool,
    },
    /// Compile to a document-store filter
    Document {
        #[clap(allow_hyphen_values = true)]
        query: String,

        #[clap(flatten)]
        policy: PolicyArgs,
    },
    /// Compile to parameterized SQL
    Sql {
        /// Omit for the match-everything filter
        #[clap(allow_hyphen_values = true)]
        query: Option<String>,

        #[clap(flatten)]
        policy: PolicyArgs,

        /// Keep written comparison operators on relative dates
        #[clap(long, default_value = "false")]
        date_default_only: bool,
    },
}
