//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    cache::CacheCommands,
    completions::CompletionsArgs,
    conv::ConvCommands,
    convert::ConvertArgs,
    import::ImportArgs,
    init::InitArgs,
    item::ItemCommands,
    uom::UomCommands,
};

#[derive(Parser)]
#[command(name = "metron")]
#[command(author, version, about = "Metron unit-of-measure catalog")]
#[command(
    long_about = "A unit-of-measure catalog of units, dimensions, and admin-defined \
                  conversion rules, with exact decimal conversion between any \
                  connected units."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Project root (default: auto-detect by finding .metron/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new metron catalog
    Init(InitArgs),

    /// Unit of measure management
    #[command(subcommand)]
    Uom(UomCommands),

    /// Conversion rule management
    #[command(subcommand)]
    Conv(ConvCommands),

    /// Convert a quantity between units
    Convert(ConvertArgs),

    /// Item management (base-unit bindings)
    #[command(subcommand)]
    Item(ItemCommands),

    /// Transform cache inspection and reset
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Bulk import units, rules, and items from a file
    Import(ImportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for list, yaml for show)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
}
