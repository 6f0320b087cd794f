//! `metron convert` command - Convert quantities between units

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{display_decimal, open_service, parse_code, parse_quantity};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Quantity to convert (decimal)
    pub quantity: String,

    /// Source unit code
    #[arg(long, short = 'F')]
    pub from: String,

    /// Target unit code
    #[arg(long, short = 't')]
    pub to: String,

    /// Convert in an item's context, pivoting through its base unit
    #[arg(long, short = 'i')]
    pub item: Option<String>,
}

pub fn run(args: ConvertArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let converter = svc.converter();

    let quantity = parse_quantity(&args.quantity)?;
    let from = parse_code(&args.from)?;
    let to = parse_code(&args.to)?;

    match args.item {
        Some(item_code) => {
            let result = converter
                .convert_for_item(&item_code, quantity, &from, &to)
                .map_err(|e| miette::miette!("{}", e))?;

            match global.format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "item": result.item_code,
                        "from": result.from.as_str(),
                        "to": result.to.as_str(),
                        "quantity": display_decimal(quantity),
                        "base_unit": result.base_unit.as_str(),
                        "base_quantity": display_decimal(result.base_qty),
                        "result": display_decimal(result.qty),
                    });
                    println!("{}", serde_json::to_string_pretty(&payload).into_diagnostic()?);
                }
                _ if global.quiet => println!("{}", display_decimal(result.qty)),
                _ => {
                    println!(
                        "{} {} {} = {} {} (item {})",
                        style("✓").green(),
                        display_decimal(quantity),
                        from,
                        style(display_decimal(result.qty)).cyan(),
                        to,
                        style(&result.item_code).cyan()
                    );
                    println!(
                        "  base: {} {}",
                        display_decimal(result.base_qty),
                        result.base_unit
                    );
                }
            }
        }
        None => {
            let result = converter
                .convert(quantity, &from, &to)
                .map_err(|e| miette::miette!("{}", e))?;

            match global.format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "from": from.as_str(),
                        "to": to.as_str(),
                        "quantity": display_decimal(quantity),
                        "result": display_decimal(result),
                    });
                    println!("{}", serde_json::to_string_pretty(&payload).into_diagnostic()?);
                }
                _ if global.quiet => println!("{}", display_decimal(result)),
                _ => {
                    println!(
                        "{} {} {} = {} {}",
                        style("✓").green(),
                        display_decimal(quantity),
                        from,
                        style(display_decimal(result)).cyan(),
                        to
                    );
                }
            }
        }
    }
    Ok(())
}
