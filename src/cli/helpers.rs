//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;

use crate::catalog::unit::{Dimension, UnitCode};
use crate::cli::GlobalOpts;
use crate::core::{CatalogService, Config, Project};

/// Locate the project from --project or by walking up from cwd
pub fn resolve_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Open the catalog service for the current project
pub fn open_service(global: &GlobalOpts) -> Result<CatalogService> {
    let project = resolve_project(global)?;
    let config = Config::load();
    CatalogService::open(&project, config.author()).map_err(|e| miette::miette!("{}", e))
}

pub fn parse_code(raw: &str) -> Result<UnitCode> {
    raw.parse().map_err(|e| miette::miette!("{}", e))
}

pub fn parse_dimension(raw: &str) -> Result<Dimension> {
    raw.parse().map_err(|e| miette::miette!("{}", e))
}

pub fn parse_quantity(raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|e| miette::miette!("invalid decimal '{}': {}", raw, e))
}

/// Ask for confirmation on stdin unless --yes was passed
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    std::io::Write::flush(&mut std::io::stdout()).into_diagnostic()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).into_diagnostic()?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Trim trailing zeros for display (2.500 -> 2.5)
pub fn display_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_display_decimal() {
        assert_eq!(display_decimal(dec!(2.500)), "2.5");
        assert_eq!(display_decimal(dec!(250)), "250");
        assert_eq!(display_decimal(dec!(0.0254)), "0.0254");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("250").unwrap(), dec!(250));
        assert_eq!(parse_quantity("-40.5").unwrap(), dec!(-40.5));
        assert!(parse_quantity("abc").is_err());
    }
}
