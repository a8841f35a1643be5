//! meddea-spectrum: Spectra, light curves and data rates from MeDDEA
//! telemetry.
//!
//! Two containers are provided:
//! - [`PhotonList`] - per-photon events plus packet headers
//! - [`SpectrumList`] - per-packet summary spectra for up to 24 pixel slots
//!
#![warn(missing_docs)]

mod binning;
mod config;
mod photon_list;
mod spectrogram;
mod spectrum_list;
mod summary;

pub use binning::{TimeGrid, MAX_TIME_BINS};
pub use config::{LightCurveConfig, SpectrumConfig, DEFAULT_LIGHTCURVE_STRIDE};
pub use photon_list::{PhotonList, MAX_PHOTON_DATA_RATE, PACKET_HEADER_BYTES};
pub use spectrogram::SpectrogramRenderer;
pub use spectrum_list::SpectrumList;

// Re-export core types for convenience
pub use meddea_core::{
    BinEdges, BinnedTimeSeries, Diagnosed, Diagnostic, Error, Pixel, PixelList, Quantity, Result,
    SpectralRegion, SpectralRegions, Spectrogram, Spectrum, Timestamp, Unit,
};
