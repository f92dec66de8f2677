//! sailtrack CLI
//!
//! Entry point for the `sailtrack` command-line tool.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use sailtrack::inventory::{InventoryError, SourceInventory};
use sailtrack::pipeline::{run, RunOptions};

#[derive(Parser)]
#[command(name = "sailtrack")]
#[command(about = "Merge sailing-race tracker telemetry into GPX and qtVlm outputs", version)]
struct Cli {
    /// Source directories, each containing config.xml and tracks.json,
    /// in merge order
    #[arg(value_name = "SOURCE_DIR")]
    sources: Vec<PathBuf>,

    /// Path to a sources.toml manifest (alternative to positional dirs)
    #[arg(long, short = 'm', conflicts_with = "sources")]
    manifest: Option<PathBuf>,

    /// Only include boats of this race class
    #[arg(long, short = 'c')]
    class: Option<String>,

    /// Restrict output to boats with this name
    #[arg(long, short = 's')]
    ship: Option<String>,

    /// Drop boats more than an hour behind the fleet's last report
    #[arg(long, short = 'f')]
    exclude_dnf: bool,

    /// Add display-color extensions to GPX tracks
    #[arg(long, short = 'g')]
    color_tracks: bool,

    /// Output directory
    #[arg(long, short = 'o', default_value = ".")]
    out_dir: PathBuf,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Verbose progress on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let inventory = match load_inventory(&cli) {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let options = RunOptions {
        class_filter: cli.class,
        name_filter: cli.ship,
        exclude_dnf: cli.exclude_dnf,
        color_tracks: cli.color_tracks,
        out_dir: cli.out_dir,
        verbose: cli.verbose,
    };

    match run(&inventory, &options) {
        Ok(summary) => {
            if cli.json {
                match summary.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing summary: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                println!("{}", summary.human_summary());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn load_inventory(cli: &Cli) -> Result<SourceInventory, InventoryError> {
    match &cli.manifest {
        Some(path) => SourceInventory::load(path),
        None if cli.sources.is_empty() => Err(InventoryError::NoSources),
        None => SourceInventory::from_dirs(&cli.sources),
    }
}
