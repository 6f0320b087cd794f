use clap::Parser;
use metron::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => metron::cli::commands::init::run(args, &global),
        Commands::Uom(cmd) => metron::cli::commands::uom::run(cmd, &global),
        Commands::Conv(cmd) => metron::cli::commands::conv::run(cmd, &global),
        Commands::Convert(args) => metron::cli::commands::convert::run(args, &global),
        Commands::Item(cmd) => metron::cli::commands::item::run(cmd, &global),
        Commands::Cache(cmd) => metron::cli::commands::cache::run(cmd, &global),
        Commands::Import(args) => metron::cli::commands::import::run(args, &global),
        Commands::Completions(args) => metron::cli::commands::completions::run(args),
    }
}
