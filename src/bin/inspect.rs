//! arraystore Inspector
//!
//! Lists and prints datasets stored in an arraystore file.

use std::path::PathBuf;
use std::process;

use arraystore::{Dataset, Mode, Store};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// arraystore inspector
#[derive(Parser, Debug)]
#[command(name = "arraystore-inspect")]
#[command(about = "Inspect datasets stored in an arraystore file")]
#[command(version)]
struct Args {
    /// Container file to open (read-only)
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every dataset with its unit, element type and extents
    List,

    /// Show metadata and summary statistics of one dataset
    Show {
        /// Dataset name
        name: String,
    },

    /// Print the values of one dataset, one per line
    Dump {
        /// Dataset name
        name: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arraystore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("arraystore-inspect v{}", arraystore::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> arraystore::Result<()> {
    let mut store = Store::open(&args.file, Mode::Read)?;

    match args.command {
        Commands::List => {
            let names = store.dataset_names().to_vec();
            for name in names {
                let info = store.describe(&name)?;
                let extent = match info.shape.dims() {
                    [] => "scalar".to_string(),
                    dims => dims
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>()
                        .join("x"),
                };
                println!("{}\t{}\t{}\t{}", info.name, info.unit, info.data_type, extent);
            }
        }
        Commands::Show { name } => {
            let dataset = store.read_dataset(&name)?;
            print_summary(&dataset);
        }
        Commands::Dump { name } => {
            for value in store.read(&name)? {
                // Debug formatting round-trips f64 exactly
                println!("{:?}", value);
            }
        }
    }

    store.close()
}

fn print_summary(dataset: &Dataset) {
    println!("name:   {}", dataset.name);
    println!("units:  {}", dataset.unit);
    println!("length: {}", dataset.len());

    if dataset.is_empty() {
        return;
    }

    let min = dataset.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = dataset.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = dataset.values.iter().sum::<f64>() / dataset.len() as f64;

    println!("min:    {}", min);
    println!("max:    {}", max);
    println!("mean:   {}", mean);
}
