//! `metron uom` command - Unit of measure management

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use miette::{IntoDiagnostic, Result};

use crate::catalog::unit::Unit;
use crate::cli::helpers::{confirm, open_service, parse_code, parse_dimension};
use crate::cli::table::print_rows;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, UnitFilter, UnitPatch};

#[derive(Subcommand, Debug)]
pub enum UomCommands {
    /// Create a new unit
    New(NewArgs),

    /// List units with filtering and cursor pagination
    List(ListArgs),

    /// Show a unit's details
    Show(ShowArgs),

    /// Update fields on an existing unit
    Set(SetArgs),

    /// Delete a unit (fails when referenced)
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Unit code (e.g. "cm", case-insensitive)
    pub code: Option<String>,

    /// Display name (e.g. "centimeter")
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Dimension (e.g. "length")
    #[arg(long, short = 'd')]
    pub dimension: Option<String>,

    /// Display symbol (defaults to the code)
    #[arg(long, short = 's')]
    pub symbol: Option<String>,

    /// Mark as the SI base unit of its dimension
    #[arg(long)]
    pub si_base: bool,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by dimension
    #[arg(long, short = 'd')]
    pub dimension: Option<String>,

    /// Resume listing after this code (from a previous page)
    #[arg(long)]
    pub cursor: Option<String>,

    /// Page size
    #[arg(long, short = 'n')]
    pub per_page: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Unit code
    pub code: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Unit code
    pub code: String,

    /// New display name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New display symbol
    #[arg(long, short = 's')]
    pub symbol: Option<String>,

    /// New dimension (rejected while conversion rules reference the unit)
    #[arg(long, short = 'd')]
    pub dimension: Option<String>,

    /// Set or clear the SI base flag
    #[arg(long)]
    pub si_base: Option<bool>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Unit code
    pub code: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: UomCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UomCommands::New(args) => run_new(args, global),
        UomCommands::List(args) => run_list(args, global),
        UomCommands::Show(args) => run_show(args, global),
        UomCommands::Set(args) => run_set(args, global),
        UomCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;

    let (code, name, dimension, symbol, si_base) = if args.interactive {
        prompt_new(&args)?
    } else {
        let code = args
            .code
            .ok_or_else(|| miette::miette!("unit code is required (or use --interactive)"))?;
        let name = args.name.ok_or_else(|| miette::miette!("--name is required"))?;
        let dimension = args
            .dimension
            .ok_or_else(|| miette::miette!("--dimension is required"))?;
        (code, name, dimension, args.symbol, args.si_base)
    };

    let unit = svc
        .create_unit(
            parse_code(&code)?,
            name,
            symbol,
            parse_dimension(&dimension)?,
            si_base,
        )
        .map_err(|e| miette::miette!("{}", e))?;

    if global.quiet {
        println!("{}", unit.code);
    } else {
        let base_note = if unit.is_si_base { " (SI base)" } else { "" };
        println!(
            "{} Created unit {} ({}) in dimension {}{}",
            style("✓").green(),
            style(&unit.code).cyan(),
            unit.name,
            style(&unit.dimension).cyan(),
            base_note
        );
    }
    Ok(())
}

fn prompt_new(args: &NewArgs) -> Result<(String, String, String, Option<String>, bool)> {
    let theme = ColorfulTheme::default();

    let code: String = match &args.code {
        Some(code) => code.clone(),
        None => Input::with_theme(&theme)
            .with_prompt("Unit code")
            .interact_text()
            .into_diagnostic()?,
    };
    let name: String = Input::with_theme(&theme)
        .with_prompt("Display name")
        .interact_text()
        .into_diagnostic()?;
    let dimension: String = Input::with_theme(&theme)
        .with_prompt("Dimension")
        .interact_text()
        .into_diagnostic()?;
    let symbol: String = Input::with_theme(&theme)
        .with_prompt("Symbol (empty to use the code)")
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;
    let si_base = Confirm::with_theme(&theme)
        .with_prompt("SI base unit for this dimension?")
        .default(false)
        .interact()
        .into_diagnostic()?;

    let symbol = if symbol.trim().is_empty() {
        None
    } else {
        Some(symbol.trim().to_string())
    };
    Ok((code, name, dimension, symbol, si_base))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let config = Config::load();

    let filter = UnitFilter {
        dimension: args.dimension.as_deref().map(parse_dimension).transpose()?,
    };
    let per_page = args.per_page.unwrap_or_else(|| config.per_page());
    let page = svc
        .db()
        .list_units(&filter, args.cursor.as_deref(), per_page)
        .map_err(|e| miette::miette!("{}", e))?;

    match global.format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&page.rows).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&page.rows).into_diagnostic()?
            );
        }
        format => {
            let rows: Vec<Vec<String>> = page
                .rows
                .iter()
                .map(|u| {
                    vec![
                        u.code.to_string(),
                        u.name.clone(),
                        u.display_symbol().to_string(),
                        u.dimension.to_string(),
                        if u.is_si_base { "yes" } else { "" }.to_string(),
                    ]
                })
                .collect();
            print_rows(&["CODE", "NAME", "SYMBOL", "DIMENSION", "SI BASE"], &rows, format);

            if !global.quiet {
                println!("{} unit(s)", style(page.rows.len()).cyan());
            }
        }
    }

    if let Some(cursor) = page.next_cursor {
        if !global.quiet {
            println!(
                "More results. Continue with {}",
                style(format!("--cursor {}", cursor)).yellow()
            );
        }
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let unit = svc
        .db()
        .require_unit(&parse_code(&args.code)?)
        .map_err(|e| miette::miette!("{}", e))?;

    output_unit(&unit, global)
}

fn output_unit(unit: &Unit, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(unit).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(unit).into_diagnostic()?);
        }
    }
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let code = parse_code(&args.code)?;

    let patch = UnitPatch {
        name: args.name,
        symbol: args.symbol,
        dimension: args.dimension.as_deref().map(parse_dimension).transpose()?,
        is_si_base: args.si_base,
    };
    if patch.is_empty() {
        return Err(miette::miette!("nothing to change; pass at least one field"));
    }

    let unit = svc
        .update_unit(&code, &patch)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.quiet {
        println!("{}", unit.code);
    } else {
        println!("{} Updated unit {}", style("✓").green(), style(&unit.code).cyan());
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let code = parse_code(&args.code)?;

    // Surface the lookup error before prompting
    svc.db()
        .require_unit(&code)
        .map_err(|e| miette::miette!("{}", e))?;

    if !confirm(&format!("Delete unit '{}'?", code), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let unit = svc
        .delete_unit(&code)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!("{} Deleted unit {}", style("✓").green(), style(&unit.code).cyan());
    }
    Ok(())
}
