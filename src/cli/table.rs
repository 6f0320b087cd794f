//! Table formatting for CLI list commands
//!
//! Auto format renders a bordered table; TSV and CSV stay single-line
//! for pipability. YAML/JSON output is handled at the call sites since
//! it serializes the full entities, not the table projection.

use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::escape_csv;
use crate::cli::OutputFormat;

/// Print headers and rows in the requested tabular format
pub fn print_rows(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) {
    match format {
        OutputFormat::Tsv => {
            println!("{}", headers.join("\t"));
            for row in rows {
                println!("{}", row.join("\t"));
            }
        }
        OutputFormat::Csv => {
            println!("{}", headers.join(","));
            for row in rows {
                let escaped: Vec<String> = row.iter().map(|c| escape_csv(c)).collect();
                println!("{}", escaped.join(","));
            }
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().map(|h| h.to_string()));
            for row in rows {
                builder.push_record(row.clone());
            }
            let mut table = builder.build();
            table.with(Style::sharp());
            println!("{}", table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharp_table_renders_all_cells() {
        let mut builder = Builder::default();
        builder.push_record(["CODE", "NAME"]);
        builder.push_record(["cm", "centimeter"]);
        let mut table = builder.build();
        table.with(Style::sharp());
        let rendered = table.to_string();
        assert!(rendered.contains("CODE"));
        assert!(rendered.contains("centimeter"));
    }
}
