//! `metron import` command - Bulk load units, rules, and items
//!
//! YAML bundles carry all three entity kinds; CSV carries units only.
//! Existing entries are skipped, not overwritten, so a bundle can be
//! re-applied safely after partial failures.

use std::path::PathBuf;

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::cli::helpers::{open_service, parse_code, parse_dimension};
use crate::cli::GlobalOpts;
use crate::core::{CatalogService, StoreError};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// File to import
    pub file: PathBuf,

    /// Input file format (distinct from the global --format output flag)
    #[arg(long = "input-format", value_enum, default_value = "yaml")]
    pub input_format: ImportFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ImportFormat {
    /// YAML bundle with units, conversions, and items
    Yaml,
    /// CSV of units (code,name,symbol,dimension,si_base)
    Csv,
}

/// A declarative catalog bundle
#[derive(Debug, Default, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub conversions: Vec<EdgeSpec>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

#[derive(Debug, Deserialize)]
pub struct UnitSpec {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub dimension: String,
    #[serde(default)]
    pub si_base: bool,
}

#[derive(Debug, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub factor: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub offset: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ItemSpec {
    pub code: String,
    pub name: String,
    pub base_unit: String,
}

/// Counts of applied and skipped entries
#[derive(Debug, Default)]
pub struct ImportStats {
    pub units: usize,
    pub conversions: usize,
    pub items: usize,
    pub skipped: usize,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let contents = std::fs::read_to_string(&args.file).into_diagnostic()?;

    let bundle = match args.input_format {
        ImportFormat::Yaml => serde_yml::from_str(&contents).into_diagnostic()?,
        ImportFormat::Csv => units_from_csv(&contents)?,
    };

    let stats = apply_bundle(&svc, &bundle)?;

    if !global.quiet {
        println!(
            "{} Imported {} unit(s), {} rule(s), {} item(s)",
            style("✓").green(),
            style(stats.units).cyan(),
            style(stats.conversions).cyan(),
            style(stats.items).cyan()
        );
        if stats.skipped > 0 {
            println!(
                "  {} existing entr(ies) skipped",
                style(stats.skipped).yellow()
            );
        }
    }
    Ok(())
}

fn units_from_csv(contents: &str) -> Result<ImportBundle> {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let mut units = Vec::new();
    for record in reader.deserialize::<UnitSpec>() {
        units.push(record.into_diagnostic()?);
    }
    Ok(ImportBundle {
        units,
        ..ImportBundle::default()
    })
}

/// Apply a bundle in dependency order: units, then rules, then items
pub fn apply_bundle(svc: &CatalogService, bundle: &ImportBundle) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for spec in &bundle.units {
        let result = svc.create_unit(
            parse_code(&spec.code)?,
            spec.name.clone(),
            spec.symbol.clone(),
            parse_dimension(&spec.dimension)?,
            spec.si_base,
        );
        match result {
            Ok(_) => stats.units += 1,
            Err(StoreError::DuplicateUnit(_)) => stats.skipped += 1,
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    }

    for spec in &bundle.conversions {
        let from = parse_code(&spec.from)?;
        let to = parse_code(&spec.to)?;
        let offset = spec.offset.unwrap_or(Decimal::ZERO);
        let result = svc
            .upsert_edge(&from, &to, spec.factor, offset)
            .map_err(|e| miette::miette!("{}", e))?;
        if result.created {
            stats.conversions += 1;
        } else {
            stats.skipped += 1;
        }
        if let Some(warning) = result.warning {
            eprintln!("{} {}", style("warning:").yellow().bold(), warning);
        }
    }

    for spec in &bundle.items {
        let result = svc.create_item(&spec.code, spec.name.clone(), parse_code(&spec.base_unit)?);
        match result {
            Ok(_) => stats.items += 1,
            Err(StoreError::DuplicateItem(_)) => stats.skipped += 1,
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CatalogDb, NullAudit};
    use rust_decimal_macros::dec;

    fn service() -> CatalogService {
        let db = CatalogDb::open_in_memory().unwrap();
        CatalogService::new(db, Box::new(NullAudit), "test".to_string())
    }

    const BUNDLE: &str = r#"
units:
  - code: m
    name: meter
    dimension: length
    si_base: true
  - code: cm
    name: centimeter
    dimension: length
conversions:
  - from: cm
    to: m
    factor: "0.01"
items:
  - code: rod
    name: Steel rod
    base_unit: m
"#;

    #[test]
    fn test_apply_yaml_bundle() {
        let svc = service();
        let bundle: ImportBundle = serde_yml::from_str(BUNDLE).unwrap();
        let stats = apply_bundle(&svc, &bundle).unwrap();

        assert_eq!(stats.units, 2);
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.items, 1);
        assert_eq!(stats.skipped, 0);

        let result = svc
            .converter()
            .convert(dec!(250), &"cm".parse().unwrap(), &"m".parse().unwrap())
            .unwrap();
        assert_eq!(result, dec!(2.50));
    }

    #[test]
    fn test_reapply_skips_existing() {
        let svc = service();
        let bundle: ImportBundle = serde_yml::from_str(BUNDLE).unwrap();
        apply_bundle(&svc, &bundle).unwrap();

        let stats = apply_bundle(&svc, &bundle).unwrap();
        assert_eq!(stats.units, 0);
        assert_eq!(stats.items, 0);
        // 2 units + 1 edge pair + 1 item already present
        assert_eq!(stats.skipped, 4);
    }

    #[test]
    fn test_units_from_csv() {
        let csv = "code,name,symbol,dimension,si_base\n\
                   kg,kilogram,kg,mass,true\n\
                   g,gram,,mass,false\n";
        let bundle = units_from_csv(csv).unwrap();
        assert_eq!(bundle.units.len(), 2);
        assert!(bundle.units[0].si_base);
        // Empty CSV fields deserialize as None for Option columns
        assert!(bundle.units[1].symbol.is_none());
    }

    #[test]
    fn test_edge_offset_defaults_to_none() {
        let yaml = "from: c\nto: f\nfactor: \"1.8\"\noffset: \"32\"\n";
        let spec: EdgeSpec = serde_yml::from_str(yaml).unwrap();
        assert_eq!(spec.offset, Some(dec!(32)));

        let yaml = "from: cm\nto: m\nfactor: \"0.01\"\n";
        let spec: EdgeSpec = serde_yml::from_str(yaml).unwrap();
        assert!(spec.offset.is_none());
    }
}
