//! `metron cache` command - Transform cache inspection
//!
//! The cache lives for one process, so stats here reflect the current
//! invocation only. The subcommands exist for scripting parity with
//! the library API and for verifying invalidation behavior.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::open_service;
use crate::cli::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show transform cache and catalog statistics
    Stats,

    /// Drop all cached transforms
    Reset,
}

pub fn run(cmd: CacheCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CacheCommands::Stats => run_stats(global),
        CacheCommands::Reset => run_reset(global),
    }
}

fn run_stats(global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    let cache = svc.cache().stats();
    let store = svc
        .db()
        .statistics()
        .map_err(|e| miette::miette!("{}", e))?;

    println!("{}", style("Transform Cache").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Entries: {}", style(cache.entries).cyan());
    println!("  Hits:    {}", style(cache.hits).cyan());
    println!("  Misses:  {}", style(cache.misses).cyan());
    println!("  Resets:  {}", style(cache.resets).cyan());
    println!();
    println!("{}", style("Catalog").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Units:         {}", style(store.units).cyan());
    println!("  Active rules:  {}", style(store.active_edges).cyan());
    println!("  Deleted rules: {}", style(store.deleted_edges).cyan());
    println!("  Items:         {}", style(store.items).cyan());

    if !store.units_by_dimension.is_empty() {
        println!();
        println!("  {}", style("Units by dimension:").bold());
        let mut dims: Vec<_> = store.units_by_dimension.iter().collect();
        dims.sort_by_key(|(k, _)| (*k).clone());
        for (dimension, count) in dims {
            println!("    {:<14} {}", dimension, count);
        }
    }

    Ok(())
}

fn run_reset(global: &GlobalOpts) -> Result<()> {
    let svc = open_service(global)?;
    svc.cache().reset();
    println!("{} Transform cache cleared", style("✓").green());
    Ok(())
}
