//! `metron init` command - Initialize a new catalog project

use console::style;
use miette::{IntoDiagnostic, Result};
use rust_embed::Embed;

use crate::cli::commands::import::{apply_bundle, ImportBundle};
use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};
use crate::core::{CatalogService, Config};

#[derive(Embed)]
#[folder = "seed/"]
struct SeedData;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Load the built-in SI starter catalog after initializing
    #[arg(long)]
    pub seed: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
    }

    let project = match Project::init(&path) {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} Metron catalog already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    println!(
        "{} Initialized metron catalog at {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );

    if args.seed {
        let config = Config::load();
        let svc =
            CatalogService::open(&project, config.author()).map_err(|e| miette::miette!("{}", e))?;
        let stats = apply_bundle(&svc, &load_seed()?)?;
        println!(
            "{} Seeded {} unit(s) and {} conversion rule(s)",
            style("✓").green(),
            style(stats.units).cyan(),
            style(stats.conversions).cyan()
        );
    }

    if !global.quiet {
        println!();
        println!("Next steps:");
        println!("  {} Add a unit", style("metron uom new").yellow());
        println!("  {} Define a conversion", style("metron conv set").yellow());
        println!(
            "  {} Convert a quantity",
            style("metron convert 250 --from cm --to m").yellow()
        );
    }
    Ok(())
}

fn load_seed() -> Result<ImportBundle> {
    let file = SeedData::get("catalog.yaml")
        .ok_or_else(|| miette::miette!("embedded seed catalog missing"))?;
    let contents = std::str::from_utf8(file.data.as_ref()).into_diagnostic()?;
    serde_yml::from_str(contents).into_diagnostic()
}
