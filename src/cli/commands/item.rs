//! `metron item` command - Item base-unit bindings

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_service, parse_code};
use crate::cli::table::print_rows;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Create a new item bound to a base unit
    New(NewArgs),

    /// List items
    List,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item code
    pub code: String,

    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Unit in which stock quantity is stored
    #[arg(long, short = 'b')]
    pub base_unit: String,
}

pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ItemCommands::New(args) => run_new(args, global),
        ItemCommands::List => run_list(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let item = svc
        .create_item(&args.code, args.name, parse_code(&args.base_unit)?)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.quiet {
        println!("{}", item.code);
    } else {
        println!(
            "{} Created item {} (base unit {})",
            style("✓").green(),
            style(&item.code).cyan(),
            style(&item.base_unit_code).cyan()
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let items = svc
        .db()
        .list_items()
        .map_err(|e| miette::miette!("{}", e))?;

    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&items).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items).into_diagnostic()?);
        }
        format => {
            let rows: Vec<Vec<String>> = items
                .iter()
                .map(|i| {
                    vec![
                        i.code.clone(),
                        i.name.clone(),
                        i.base_unit_code.to_string(),
                    ]
                })
                .collect();
            print_rows(&["CODE", "NAME", "BASE UNIT"], &rows, format);

            if !global.quiet {
                println!("{} item(s)", style(items.len()).cyan());
            }
        }
    }
    Ok(())
}
