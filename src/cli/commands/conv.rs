//! `metron conv` command - Conversion rule management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;

use crate::cli::helpers::{confirm, display_decimal, open_service, parse_code, parse_dimension, parse_quantity};
use crate::cli::table::print_rows;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::EdgeFilter;

#[derive(Subcommand, Debug)]
pub enum ConvCommands {
    /// Create or update the rule for an ordered unit pair
    Set(SetArgs),

    /// List conversion rules
    List(ListArgs),

    /// Delete a rule (soft delete; the pair can be revived)
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Source unit code
    pub from: String,

    /// Target unit code
    pub to: String,

    /// Multiplicative factor (to = factor * from + offset)
    #[arg(long, short = 'k')]
    pub factor: String,

    /// Additive offset
    #[arg(long, short = 'o', default_value = "0")]
    pub offset: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by source unit
    #[arg(long)]
    pub from: Option<String>,

    /// Filter by target unit
    #[arg(long)]
    pub to: Option<String>,

    /// Filter by dimension
    #[arg(long, short = 'd')]
    pub dimension: Option<String>,

    /// Include soft-deleted rules
    #[arg(long)]
    pub include_deleted: bool,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Source unit code
    pub from: String,

    /// Target unit code
    pub to: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: ConvCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConvCommands::Set(args) => run_set(args, global),
        ConvCommands::List(args) => run_list(args, global),
        ConvCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let from = parse_code(&args.from)?;
    let to = parse_code(&args.to)?;
    let factor = parse_quantity(&args.factor)?;
    let offset = parse_quantity(&args.offset)?;

    let result = svc
        .upsert_edge(&from, &to, factor, offset)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let verb = if result.created { "Created" } else { "Updated" };
        let offset_note = if result.edge.offset != Decimal::ZERO {
            format!(" + {}", display_decimal(result.edge.offset))
        } else {
            String::new()
        };
        println!(
            "{} {} rule {} -> {} ({} = {} * {}{})",
            style("✓").green(),
            verb,
            style(&from).cyan(),
            style(&to).cyan(),
            to,
            display_decimal(result.edge.factor),
            from,
            offset_note
        );
    }

    if let Some(warning) = result.warning {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;

    let filter = EdgeFilter {
        from_code: args.from.as_deref().map(parse_code).transpose()?,
        to_code: args.to.as_deref().map(parse_code).transpose()?,
        dimension: args.dimension.as_deref().map(parse_dimension).transpose()?,
        include_deleted: args.include_deleted,
    };
    let edges = svc
        .db()
        .list_edges(&filter)
        .map_err(|e| miette::miette!("{}", e))?;

    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&edges).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&edges).into_diagnostic()?);
        }
        format => {
            let rows: Vec<Vec<String>> = edges
                .iter()
                .map(|e| {
                    vec![
                        e.from_code.to_string(),
                        e.to_code.to_string(),
                        display_decimal(e.factor),
                        display_decimal(e.offset),
                        match e.deleted_at {
                            Some(at) => format!("deleted {}", at.format("%Y-%m-%d")),
                            None => "active".to_string(),
                        },
                    ]
                })
                .collect();
            print_rows(&["FROM", "TO", "FACTOR", "OFFSET", "STATE"], &rows, format);

            if !global.quiet {
                println!("{} rule(s)", style(edges.len()).cyan());
            }
        }
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let from = parse_code(&args.from)?;
    let to = parse_code(&args.to)?;

    if !confirm(&format!("Delete rule {} -> {}?", from, to), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    svc.delete_edge(&from, &to)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Deleted rule {} -> {}",
            style("✓").green(),
            style(&from).cyan(),
            style(&to).cyan()
        );
    }
    Ok(())
}
