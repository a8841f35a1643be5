//! Spectral axes, spectral regions and histogramming.

use std::fmt;

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::units::{Quantity, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

/// Largest raw ADC channel value plus one.
pub const ADC_CHANNELS: u32 = 4096;

/// Channel width of one summary spectrum bin.
pub const SUMMARY_BIN_WIDTH: u32 = 8;

fn expect_spectral(unit: Unit) -> Result<()> {
    if unit.is_spectral() {
        Ok(())
    } else {
        Err(Error::UnsupportedUnit {
            found: unit,
            expected: "chan or keV",
        })
    }
}

/// A spectral interval `[lower, upper)` in channels or keV.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpectralRegion {
    lower: f64,
    upper: f64,
    unit: Unit,
}

impl SpectralRegion {
    /// Creates a region from two bounds in the same spectral unit.
    pub fn new(lower: Quantity, upper: Quantity) -> Result<Self> {
        expect_spectral(lower.unit())?;
        let upper_value = upper.value_in(lower.unit())?;
        if upper_value <= lower.value() {
            return Err(Error::InvalidParameter(format!(
                "spectral region upper bound {upper} must exceed lower bound {lower}"
            )));
        }
        Ok(Self {
            lower: lower.value(),
            upper: upper_value,
            unit: lower.unit(),
        })
    }

    /// Region in raw channels.
    pub fn channels(lower: f64, upper: f64) -> Result<Self> {
        Self::new(Quantity::channels(lower), Quantity::channels(upper))
    }

    /// Region in keV.
    pub fn kev(lower: f64, upper: f64) -> Result<Self> {
        Self::new(Quantity::kev(lower), Quantity::kev(upper))
    }

    #[must_use]
    pub fn lower(&self) -> Quantity {
        Quantity::new(self.lower, self.unit)
    }

    #[must_use]
    pub fn upper(&self) -> Quantity {
        Quantity::new(self.upper, self.unit)
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns true if `value` (already in this region's unit) lies inside.
    #[inline]
    #[must_use]
    pub fn contains_value(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }

    /// Unit-checked membership test.
    pub fn contains(&self, value: Quantity) -> Result<bool> {
        Ok(self.contains_value(value.value_in(self.unit)?))
    }

    /// Column label for light curves built over this region.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}_cts", self.lower(), self.upper())
    }
}

impl fmt::Display for SpectralRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower(), self.upper())
    }
}

/// One or more spectral regions sharing a single unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpectralRegions {
    regions: Vec<SpectralRegion>,
}

impl SpectralRegions {
    /// Collects regions, failing if they mix units.
    pub fn new(regions: impl IntoIterator<Item = SpectralRegion>) -> Result<Self> {
        let regions: Vec<SpectralRegion> = regions.into_iter().collect();
        if let Some(first) = regions.first() {
            if let Some(other) = regions.iter().find(|r| r.unit != first.unit) {
                return Err(Error::UnsupportedUnit {
                    found: other.unit,
                    expected: first.unit.symbol(),
                });
            }
        }
        Ok(Self { regions })
    }

    /// Unit shared by all regions, `None` when empty.
    #[must_use]
    pub fn unit(&self) -> Option<Unit> {
        self.regions.first().map(SpectralRegion::unit)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpectralRegion> {
        self.regions.iter()
    }

    /// Returns the only region, failing unless there is exactly one.
    pub fn single(&self) -> Result<&SpectralRegion> {
        match self.regions.as_slice() {
            [region] => Ok(region),
            other => Err(Error::UnsupportedRegionCount(other.len())),
        }
    }
}

impl From<SpectralRegion> for SpectralRegions {
    fn from(region: SpectralRegion) -> Self {
        Self {
            regions: vec![region],
        }
    }
}

/// Monotonically increasing histogram bin edges with a spectral unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BinEdges {
    edges: Array1<f64>,
    unit: Unit,
}

impl BinEdges {
    /// Creates bin edges, validating length and ordering.
    pub fn new(edges: Array1<f64>, unit: Unit) -> Result<Self> {
        expect_spectral(unit)?;
        if edges.len() < 2 {
            return Err(Error::InvalidBinEdges(format!(
                "need at least two edges, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::InvalidBinEdges("non-finite edge".to_string()));
        }
        if edges.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidBinEdges(
                "edges must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { edges, unit })
    }

    /// `n_bins` bins of equal `width` starting at `start`.
    pub fn uniform(start: f64, width: f64, n_bins: usize, unit: Unit) -> Result<Self> {
        if width <= 0.0 || n_bins == 0 {
            return Err(Error::InvalidBinEdges(format!(
                "uniform edges need positive width and bins, got width {width}, {n_bins} bins"
            )));
        }
        #[allow(clippy::cast_precision_loss)]
        let edges = Array1::from_iter((0..=n_bins).map(|i| start + width * i as f64));
        Self::new(edges, unit)
    }

    /// Unit-width channel bins over the full ADC range.
    #[must_use]
    pub fn raw_channels() -> Self {
        Self {
            edges: Array1::from_iter((0..ADC_CHANNELS).map(f64::from)),
            unit: Unit::Channel,
        }
    }

    /// 0.1 keV bins from 0 to 100 keV.
    #[must_use]
    pub fn default_energy() -> Self {
        Self {
            edges: Array1::from_iter((0..=1000u32).map(|i| f64::from(i) / 10.0)),
            unit: Unit::KiloElectronVolt,
        }
    }

    /// Edges of the on-board summary spectra: 0 to 4096 channels in steps of 8.
    #[must_use]
    pub fn summary_spectrum() -> Self {
        Self {
            edges: Array1::from_iter(
                (0..=ADC_CHANNELS / SUMMARY_BIN_WIDTH).map(|i| f64::from(i * SUMMARY_BIN_WIDTH)),
            ),
            unit: Unit::Channel,
        }
    }

    #[must_use]
    pub fn edges(&self) -> &Array1<f64> {
        &self.edges
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Number of bins (edges minus one).
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Midpoint of each bin.
    #[must_use]
    pub fn centers(&self) -> Array1<f64> {
        let n = self.n_bins();
        Array1::from_iter((0..n).map(|i| 0.5 * (self.edges[i] + self.edges[i + 1])))
    }

    /// Index of the bin holding `value`.
    ///
    /// Bins are half-open except the last, which includes its upper edge.
    /// Values outside the edges have no bin.
    #[must_use]
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        let edges = self.edges.as_slice()?;
        let first = edges[0];
        let last = edges[edges.len() - 1];
        if !(value >= first && value <= last) {
            return None;
        }
        if value == last {
            return Some(edges.len() - 2);
        }
        // first edge strictly greater than value
        let upper = edges.partition_point(|&e| e <= value);
        Some(upper - 1)
    }

    /// Counts `values` into the bins.
    pub fn histogram(&self, values: impl IntoIterator<Item = f64>) -> Array1<u64> {
        let mut counts = Array1::<u64>::zeros(self.n_bins());
        for value in values {
            if let Some(bin) = self.bin_index(value) {
                counts[bin] += 1;
            }
        }
        counts
    }
}

// Deserialization goes through the validating constructors.

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SpectralRegion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            lower: f64,
            upper: f64,
            unit: Unit,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(
            Quantity::new(raw.lower, raw.unit),
            Quantity::new(raw.upper, raw.unit),
        )
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SpectralRegions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            regions: Vec<SpectralRegion>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.regions).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for BinEdges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            edges: Array1<f64>,
            unit: Unit,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.edges, raw.unit).map_err(serde::de::Error::custom)
    }
}
