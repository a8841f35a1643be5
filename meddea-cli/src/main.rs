//! meddea: command-line analysis of MeDDEA photon and spectrum lists.
//!
//! Input is a JSON file holding already-parsed telemetry tables. Products
//! are written to stdout as CSV, spectrograms to a PNG file.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]

mod input;
mod output;
mod render;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use meddea_spectrum::{
    LightCurveConfig, Pixel, PixelList, Quantity, SpectralRegion, SpectralRegions,
    SpectrumConfig, Timestamp, DEFAULT_LIGHTCURVE_STRIDE,
};
use thiserror::Error;

use input::Loaded;
use render::{Colormap, PlottersRenderer};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Core(#[from] meddea_spectrum::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("{command} is not available for {container}")]
    Unsupported {
        command: &'static str,
        container: &'static str,
    },
}

/// Spectral unit of light-curve regions.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RegionUnit {
    /// ADC channels
    Chan,
    /// Calibrated energy
    Kev,
}

/// MeDDEA photon and spectrum list analysis.
#[derive(Parser)]
#[command(name = "meddea")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Input file and optional time window.
#[derive(Args)]
struct Selection {
    /// Input JSON file
    input: PathBuf,

    /// Keep only data after this time (seconds)
    #[arg(long)]
    start: Option<f64>,

    /// Keep only data before this time (seconds)
    #[arg(long)]
    end: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of an input file
    Info {
        #[command(flatten)]
        selection: Selection,
    },

    /// Time-integrated spectrum as CSV
    Spectrum {
        #[command(flatten)]
        selection: Selection,

        /// Pixel as MODULE:PIXEL (repeatable, defaults to all present pixels)
        #[arg(short, long, value_parser = parse_pixel)]
        pixel: Vec<Pixel>,

        /// Bin calibrated energies instead of raw channels (photon lists)
        #[arg(long)]
        calibrate: bool,
    },

    /// Light curve per spectral region as CSV
    Lightcurve {
        #[command(flatten)]
        selection: Selection,

        /// Spectral region as LOWER:UPPER (repeatable)
        #[arg(short, long, required = true, value_parser = parse_bounds)]
        region: Vec<(f64, f64)>,

        /// Unit of the region bounds
        #[arg(long, value_enum, default_value = "chan")]
        unit: RegionUnit,

        /// Pixel as MODULE:PIXEL (repeatable, defaults to all present pixels)
        #[arg(short, long, value_parser = parse_pixel)]
        pixel: Vec<Pixel>,

        /// Integration time in seconds (photon lists)
        #[arg(long, default_value = "1.0")]
        integration_time: f64,

        /// Count only every n-th event (photon lists)
        #[arg(long, default_value_t = DEFAULT_LIGHTCURVE_STRIDE)]
        stride: usize,
    },

    /// Telemetry data rate of a photon list as CSV
    DataRate {
        #[command(flatten)]
        selection: Selection,
    },

    /// Render the spectrogram of a spectrum list to a PNG file
    Spectrogram {
        #[command(flatten)]
        selection: Selection,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value = "1024")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "768")]
        height: u32,

        /// Colormap
        #[arg(long, value_enum, default_value = "viridis")]
        colormap: Colormap,
    },
}

fn parse_pixel(s: &str) -> std::result::Result<Pixel, String> {
    let (module, pixel) = s
        .split_once(':')
        .ok_or_else(|| format!("expected MODULE:PIXEL, got '{s}'"))?;
    let module: u8 = module.trim().parse().map_err(|e| format!("module: {e}"))?;
    let pixel: u8 = pixel.trim().parse().map_err(|e| format!("pixel: {e}"))?;
    Pixel::new(module, pixel).map_err(|e| e.to_string())
}

fn parse_bounds(s: &str) -> std::result::Result<(f64, f64), String> {
    let (lower, upper) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LOWER:UPPER, got '{s}'"))?;
    let lower: f64 = lower.trim().parse().map_err(|e| format!("lower: {e}"))?;
    let upper: f64 = upper.trim().parse().map_err(|e| format!("upper: {e}"))?;
    Ok((lower, upper))
}

fn load_selection(selection: &Selection) -> Result<Loaded> {
    let loaded = input::load(&selection.input)?;
    if selection.start.is_none() && selection.end.is_none() {
        return Ok(loaded);
    }
    let start = Timestamp(selection.start.unwrap_or(f64::NEG_INFINITY));
    let end = Timestamp(selection.end.unwrap_or(f64::INFINITY));
    Ok(match loaded {
        Loaded::Photons(list) => Loaded::Photons(list.select_time_range(start, end)),
        Loaded::Spectra(list) => Loaded::Spectra(list.select_time_range(start, end)),
    })
}

fn regions_from(bounds: &[(f64, f64)], unit: RegionUnit) -> Result<SpectralRegions> {
    let regions = bounds
        .iter()
        .map(|&(lower, upper)| match unit {
            RegionUnit::Chan => SpectralRegion::channels(lower, upper),
            RegionUnit::Kev => SpectralRegion::kev(lower, upper),
        })
        .collect::<meddea_spectrum::Result<Vec<_>>>()?;
    Ok(SpectralRegions::new(regions)?)
}

fn pixels_or(pixels: Vec<Pixel>, fallback: impl FnOnce() -> PixelList) -> PixelList {
    if pixels.is_empty() {
        fallback()
    } else {
        PixelList::new(pixels)
    }
}

fn run(command: Commands) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match command {
        Commands::Info { selection } => match load_selection(&selection)? {
            Loaded::Photons(list) => {
                write!(out, "{list}")?;
                let pixels = list.present_pixels();
                let labels: Vec<String> = pixels.iter().map(|p| p.to_string()).collect();
                writeln!(out, "Pixels ({}): {}", pixels.len(), labels.join(" "))?;
                writeln!(out, "Calibrated: {}", list.is_calibrated())?;
            }
            Loaded::Spectra(list) => {
                write!(out, "{list}")?;
                let labels: Vec<String> =
                    list.pixel_list().iter().map(|p| p.to_string()).collect();
                writeln!(out, "Pixels ({}): {}", list.pixel_list().len(), labels.join(" "))?;
                writeln!(out, "Bins: {} ({})", list.bin_edges().n_bins(), list.bin_edges().unit())?;
            }
        },

        Commands::Spectrum {
            selection,
            pixel,
            calibrate,
        } => {
            let spectrum = match load_selection(&selection)? {
                Loaded::Photons(list) => {
                    let pixels = pixels_or(pixel, || list.present_pixels());
                    let mut config = SpectrumConfig::new();
                    if calibrate {
                        config = config.calibrated();
                    }
                    list.spectrum(&pixels, &config)?
                }
                Loaded::Spectra(list) => {
                    if calibrate {
                        warn!("--calibrate has no effect on spectrum lists");
                    }
                    let pixels = pixels_or(pixel, || list.pixel_list().clone());
                    list.spectrum(&pixels)?
                }
            };
            info!("spectrum holds {} counts", spectrum.total_counts());
            output::write_spectrum(&mut out, &spectrum)?;
        }

        Commands::Lightcurve {
            selection,
            region,
            unit,
            pixel,
            integration_time,
            stride,
        } => {
            let regions = regions_from(&region, unit)?;
            let lc = match load_selection(&selection)? {
                Loaded::Photons(list) => {
                    let pixels = pixels_or(pixel, || list.present_pixels());
                    let config = LightCurveConfig::new(Quantity::seconds(integration_time))?
                        .with_stride(stride)?;
                    list.lightcurve(&pixels, &regions, &config)?
                }
                Loaded::Spectra(list) => {
                    let pixels = pixels_or(pixel, || list.pixel_list().clone());
                    list.lightcurve(&pixels, &regions)?
                }
            };
            output::write_time_series(&mut out, &lc)?;
        }

        Commands::DataRate { selection } => match load_selection(&selection)? {
            Loaded::Photons(list) => {
                let rate = list.data_rate()?;
                output::write_time_series(&mut out, &rate)?;
            }
            Loaded::Spectra(_) => {
                return Err(CliError::Unsupported {
                    command: "data-rate",
                    container: "spectrum lists",
                })
            }
        },

        Commands::Spectrogram {
            selection,
            output,
            width,
            height,
            colormap,
        } => match load_selection(&selection)? {
            Loaded::Spectra(list) => {
                let mut renderer = PlottersRenderer {
                    path: output,
                    size: (width, height),
                    colormap,
                };
                list.render_spectrogram(&mut renderer)?;
                info!("wrote spectrogram to {}", renderer.path.display());
            }
            Loaded::Photons(_) => {
                return Err(CliError::Unsupported {
                    command: "spectrogram",
                    container: "photon lists",
                })
            }
        },
    }

    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
