//! meddea-core: Core types for MeDDEA detector telemetry analysis.
//!
//! This crate provides pixel addressing, unit-tagged quantities, spectral
//! regions and bin edges, the columnar event and packet series handed over
//! by upstream parsers, and the derived products (spectra, binned time
//! series, spectrograms) built from them.
//!

pub mod diagnostics;
pub mod error;
pub mod pixel;
pub mod products;
pub mod series;
pub mod spectral;
pub mod units;

pub use diagnostics::{Diagnosed, Diagnostic};
pub use error::{Error, Result};
pub use pixel::{Pixel, PixelList, PixelSize};
pub use products::{BinnedTimeSeries, Column, Spectrogram, Spectrum};
pub use series::{Event, EventBatch, PacketBatch, Timestamp};
pub use spectral::{BinEdges, SpectralRegion, SpectralRegions};
pub use units::{Quantity, Unit};
