//! bincube CLI
//!
//! Inspects, reshapes and exports binned datasets stored as HDF5.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::needless_pass_by_value,
    clippy::too_many_lines
)]

use bincube_algorithms::{transform, ReshapeOptions};
use bincube_core::{nearest, AxisOrder, LookupMode};
use bincube_io::{inspect, load, memory_status, save, save_hyperstack, SaveOptions};
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Store(#[from] bincube_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] bincube_core::Error),

    #[error("Invalid options file: {0}")]
    Options(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// Binned photoemission dataset tool.
#[derive(Parser)]
#[command(name = "bincube")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the layout of a stored dataset
    Info {
        /// Stored dataset
        path: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reorder, reverse and offset-correct the axes of a stored dataset
    Reshape {
        /// Stored dataset
        input: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Axis tags of the stored data (t, e, x, y)
        #[arg(long, default_value = "texy")]
        order_in: String,

        /// Requested axis tags
        #[arg(long, default_value = "etxy")]
        order_out: String,

        /// Histogram to normalize frames by
        #[arg(long)]
        normalize_by: Option<String>,

        /// Tags of axes to reverse
        #[arg(long)]
        revert: Option<String>,

        /// Time zero subtracted from the t axis
        #[arg(long)]
        t0: Option<f64>,

        /// Centre subtracted from the x axis
        #[arg(long)]
        kx0: Option<f64>,

        /// Centre subtracted from the y axis
        #[arg(long)]
        ky0: Option<f64>,

        /// JSON file with reshape options; flags above take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write to a numbered sibling instead of failing when the output exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Find the bin nearest to a value along one axis
    Nearest {
        /// Stored dataset
        path: PathBuf,

        /// Dimension index
        #[arg(long)]
        axis: usize,

        /// Physical value to look up
        #[arg(long)]
        value: f64,
    },

    /// Export a 4-D dataset as a FIJI hyperstack
    Hyperstack {
        /// Stored dataset
        input: PathBuf,

        /// Output directory
        #[arg(long)]
        dir: PathBuf,

        /// Output file name
        #[arg(long)]
        name: String,

        /// Axis tags of the stored data (t, e, x, y)
        #[arg(long, default_value = "texy")]
        order_in: String,

        /// Write to a numbered sibling instead of failing when the output exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Show system memory usage
    Memory,
}

/// Axis order FIJI expects: kx, ky, energy, time.
const HYPERSTACK_ORDER: &str = "xyet";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { path, json } => {
            let summary = inspect(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("File: {}", summary.path.display());
            println!(
                "Format version: {}",
                summary.format_version.as_deref().unwrap_or("unknown")
            );
            println!("Shape: {:?}", summary.shape);
            println!("Frame entries: {}", summary.frame_entries);
            println!(
                "Estimated size: {:.3} MB",
                summary.estimated_bytes as f64 / 1_048_576.0
            );
            println!("Axes:");
            for axis in &summary.axes {
                println!("  d{}  {:<20} {} bins", axis.index, axis.label, axis.len);
            }
            if summary.histograms.is_empty() {
                println!("Histograms: none");
            } else {
                println!("Histograms: {}", summary.histograms.join(", "));
            }
        }

        Commands::Reshape {
            input,
            output,
            order_in,
            order_out,
            normalize_by,
            revert,
            t0,
            kx0,
            ky0,
            config,
            overwrite,
        } => {
            let base = match config {
                Some(path) => read_options(&path)?,
                None => ReshapeOptions::new(),
            };
            let options = override_options(base, normalize_by, revert, t0, kx0, ky0);

            let dataset = load(&input)?;
            info!(
                "reshaping {} from '{}' to '{}'",
                input.display(),
                order_in,
                order_out
            );
            let reshaped = transform(&dataset, &order_in, &order_out, &options)?;
            let written = save(
                &output,
                &reshaped,
                &SaveOptions::default().with_overwrite(overwrite),
            )?;
            println!("Wrote {:?} dataset to {}", reshaped.shape(), written.display());
        }

        Commands::Nearest { path, axis, value } => {
            let dataset = load(&path)?;
            let selected = dataset.axis(axis).ok_or_else(|| {
                CliError::Usage(format!(
                    "axis {} out of range for {}-dimensional data",
                    axis,
                    dataset.ndim()
                ))
            })?;
            let found = nearest(&selected.values, value, LookupMode::Flat)?;
            let index = found
                .flat()
                .ok_or_else(|| CliError::Usage("flat lookup returned no index".to_string()))?;
            println!(
                "{}[{}] = {} (requested {})",
                selected.label, index, selected.values[index], value
            );
        }

        Commands::Hyperstack {
            input,
            dir,
            name,
            order_in,
            overwrite,
        } => {
            let order = AxisOrder::parse(&order_in)?;
            check_hyperstack_order(&order)?;

            let dataset = load(&input)?;
            let stacked = transform(
                &dataset,
                &order_in,
                HYPERSTACK_ORDER,
                &ReshapeOptions::new(),
            )?;
            let written = save_hyperstack(stacked.data(), &dir, &name, overwrite)?;
            println!("Wrote hyperstack to {}", written.display());
        }

        Commands::Memory => {
            println!("{}", memory_status());
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_options(path: &Path) -> Result<ReshapeOptions> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Applies command-line flags on top of options read from a file.
fn override_options(
    mut options: ReshapeOptions,
    normalize_by: Option<String>,
    revert: Option<String>,
    t0: Option<f64>,
    kx0: Option<f64>,
    ky0: Option<f64>,
) -> ReshapeOptions {
    if let Some(name) = normalize_by {
        options = options.with_normalize_by(name);
    }
    if let Some(revert) = revert {
        options = options.with_revert(revert);
    }
    let mut offsets = options.offsets;
    if let Some(t0) = t0 {
        offsets = offsets.with_time_zero(t0);
    }
    if let Some(kx0) = kx0 {
        offsets = offsets.with_kx_center(kx0);
    }
    if let Some(ky0) = ky0 {
        offsets = offsets.with_ky_center(ky0);
    }
    options.with_offsets(offsets)
}

fn check_hyperstack_order(order: &AxisOrder) -> Result<()> {
    let target = AxisOrder::parse(HYPERSTACK_ORDER)?;
    if !order.is_permutation_of(&target) {
        return Err(CliError::Usage(format!(
            "hyperstack export needs all of '{}' in the input order, got '{}'",
            HYPERSTACK_ORDER, order
        )));
    }
    Ok(())
}
