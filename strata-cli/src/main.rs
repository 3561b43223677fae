use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use strata_data::{FakeDatasetConfig, GridDataset, Selection, SphereCenter};
use strata_plot::{ImageFormat, PhasePlot, PhasePlotConfig, ProfilePlot, ProfilePlotConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Profile and phase plots of a synthetic grid dataset
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Line plots of fields binned over one field
    Profile {
        #[command(flatten)]
        data: DataArgs,

        /// Field to bin over
        #[arg(short, long)]
        x_field: String,

        /// Fields to profile, one figure each
        #[arg(required = true)]
        fields: Vec<String>,

        /// JSON file holding a profile plot configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Colored 2D histograms of fields binned over two fields
    Phase {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short, long)]
        x_field: String,

        #[arg(short, long)]
        y_field: String,

        /// Fields to bin, one figure each
        #[arg(required = true)]
        fields: Vec<String>,

        /// Colormap applied to every field
        #[arg(long)]
        cmap: Option<String>,

        /// JSON file holding a phase plot configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SelectionArg {
    All,
    Region,
    Sphere,
}

#[derive(Args)]
struct DataArgs {
    /// Cells per side of the synthetic grid
    #[arg(long, default_value_t = 16)]
    dims: usize,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value = "all")]
    selection: SelectionArg,
}

#[derive(Args)]
struct OutputArgs {
    /// File name, prefix or directory for the saved images
    #[arg(short, long)]
    output: Option<String>,

    /// Save every figure in each of these formats instead
    #[arg(short, long)]
    format: Vec<ImageFormat>,
}

impl DataArgs {
    fn selection(&self) -> Result<Selection> {
        let ds = GridDataset::fake_random(&FakeDatasetConfig {
            dims: self.dims,
            seed: self.seed.unwrap_or(strata_data::grid::DEFAULT_SEED),
            ..Default::default()
        });
        let center = ds.domain_center();
        Ok(match self.selection {
            SelectionArg::All => ds.all_data(),
            SelectionArg::Region => ds.region(
                center,
                center.map(|c| c - 0.25),
                center.map(|c| c + 0.25),
            ),
            SelectionArg::Sphere => ds.sphere(SphereCenter::Point(center), 0.3, "cm")?,
        })
    }
}

fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let written = match cli.command {
        Commands::Profile {
            data,
            x_field,
            fields,
            config,
            output,
        } => {
            let config: ProfilePlotConfig = load_config(config.as_deref())?;
            let source = data.selection()?;
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let mut plot = ProfilePlot::new(&source, &x_field, &fields, &config)?;
            if output.format.is_empty() {
                plot.save(output.output.as_deref())?
            } else {
                let report = plot.save_formats(output.output.as_deref(), &output.format)?;
                report_failures(&report)?;
                report.written
            }
        }
        Commands::Phase {
            data,
            x_field,
            y_field,
            fields,
            cmap,
            config,
            output,
        } => {
            let config: PhasePlotConfig = load_config(config.as_deref())?;
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let mut plot = PhasePlot::new(data.selection()?, &x_field, &y_field, &fields, &config)?;
            if let Some(cmap) = &cmap {
                for field in &fields {
                    plot.set_cmap(field, cmap)?;
                }
            }
            if output.format.is_empty() {
                plot.save(output.output.as_deref())?
            } else {
                let report = plot.save_formats(output.output.as_deref(), &output.format)?;
                report_failures(&report)?;
                report.written
            }
        }
    };

    for path in &written {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn report_failures(report: &strata_plot::SaveReport) -> Result<()> {
    for (path, err) in &report.failed {
        tracing::error!("Failed to write {}: {err}", path.display());
    }
    if report.written.is_empty() && !report.failed.is_empty() {
        bail!("No figures were written");
    }
    Ok(())
}
