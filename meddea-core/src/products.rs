//! Derived data products: spectra, binned time series and spectrograms.

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::series::Timestamp;
use crate::spectral::BinEdges;
use crate::units::{Quantity, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A counts spectrum with Poisson uncertainties.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spectrum {
    edges: BinEdges,
    counts: Array1<f64>,
    uncertainty: Array1<f64>,
}

impl Spectrum {
    /// Creates a spectrum from per-bin counts; the uncertainty is `sqrt(counts)`.
    pub fn from_counts(edges: BinEdges, counts: Array1<f64>) -> Result<Self> {
        if counts.len() != edges.n_bins() {
            return Err(Error::LengthMismatch {
                column: "counts",
                expected: edges.n_bins(),
                actual: counts.len(),
            });
        }
        let uncertainty = counts.mapv(f64::sqrt);
        Ok(Self {
            edges,
            counts,
            uncertainty,
        })
    }

    #[must_use]
    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    /// Bin centers, the axis values the spectrum is reported at.
    #[must_use]
    pub fn spectral_axis(&self) -> Array1<f64> {
        self.edges.centers()
    }

    /// Unit of the spectral axis.
    #[must_use]
    pub fn unit(&self) -> Unit {
        self.edges.unit()
    }

    /// Counts per bin.
    #[must_use]
    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    /// One-sigma uncertainty per bin.
    #[must_use]
    pub fn uncertainty(&self) -> &Array1<f64> {
        &self.uncertainty
    }

    /// Sum over all bins.
    #[must_use]
    pub fn total_counts(&self) -> f64 {
        self.counts.sum()
    }

    /// Bin-wise sum of two spectra on the same axis.
    pub fn checked_add(&self, other: &Spectrum) -> Result<Spectrum> {
        if self.edges != other.edges {
            return Err(Error::InvalidBinEdges(
                "cannot add spectra with different bin edges".to_string(),
            ));
        }
        Spectrum::from_counts(self.edges.clone(), &self.counts + &other.counts)
    }
}

/// A named, unit-tagged column of a [`BinnedTimeSeries`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Column {
    pub name: String,
    pub unit: Unit,
    pub values: Array1<f64>,
}

/// Time-indexed table with one or more value columns.
///
/// `time` holds the start of each bin when `bin_size` is set, or the sample
/// times at native cadence otherwise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinnedTimeSeries {
    time: Vec<Timestamp>,
    bin_size: Option<Quantity>,
    columns: Vec<Column>,
}

impl BinnedTimeSeries {
    /// Creates a table with the given time index and no columns.
    pub fn new(time: Vec<Timestamp>, bin_size: Option<Quantity>) -> Result<Self> {
        if let Some(size) = bin_size {
            let seconds = size.value_in(Unit::Second)?;
            if seconds <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "bin size must be positive, got {size}"
                )));
            }
        }
        Ok(Self {
            time,
            bin_size,
            columns: Vec::new(),
        })
    }

    /// Appends a column, checking its length against the time index.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        unit: Unit,
        values: Array1<f64>,
    ) -> Result<()> {
        if values.len() != self.time.len() {
            return Err(Error::LengthMismatch {
                column: "time series column",
                expected: self.time.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column {
            name: name.into(),
            unit,
            values,
        });
        Ok(())
    }

    #[must_use]
    pub fn time(&self) -> &[Timestamp] {
        &self.time
    }

    #[must_use]
    pub fn bin_size(&self) -> Option<Quantity> {
        self.bin_size
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Pixel-summed counts as a function of time and spectral bin.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spectrogram {
    /// Time of each row.
    pub time: Vec<Timestamp>,
    /// Spectral bins of each column.
    pub edges: BinEdges,
    /// Counts, shape `(time, bin)`.
    pub counts: Array2<f64>,
}

impl Spectrogram {
    /// Covered `(start, end)` time, `None` when there are no rows.
    #[must_use]
    pub fn time_extent(&self) -> Option<(Timestamp, Timestamp)> {
        Some((*self.time.first()?, *self.time.last()?))
    }

    /// Largest count in any cell.
    #[must_use]
    pub fn max_count(&self) -> f64 {
        self.counts.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_spectrum_uncertainty() {
        let edges = BinEdges::uniform(0.0, 1.0, 3, Unit::Channel).unwrap();
        let spectrum = Spectrum::from_counts(edges, array![4.0, 0.0, 9.0]).unwrap();
        assert_relative_eq!(spectrum.uncertainty()[0], 2.0);
        assert_relative_eq!(spectrum.uncertainty()[2], 3.0);
        assert_relative_eq!(spectrum.total_counts(), 13.0);
        assert_relative_eq!(spectrum.spectral_axis()[1], 1.5);
    }

    #[test]
    fn test_spectrum_length_check() {
        let edges = BinEdges::uniform(0.0, 1.0, 3, Unit::Channel).unwrap();
        assert!(Spectrum::from_counts(edges, array![1.0]).is_err());
    }

    #[test]
    fn test_spectrum_add() {
        let edges = BinEdges::uniform(0.0, 1.0, 2, Unit::Channel).unwrap();
        let a = Spectrum::from_counts(edges.clone(), array![1.0, 2.0]).unwrap();
        let b = Spectrum::from_counts(edges, array![3.0, 4.0]).unwrap();
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.counts(), &array![4.0, 6.0]);

        let other = BinEdges::uniform(0.0, 2.0, 2, Unit::Channel).unwrap();
        let c = Spectrum::from_counts(other, array![0.0, 0.0]).unwrap();
        assert!(a.checked_add(&c).is_err());
    }

    #[test]
    fn test_binned_series_columns() {
        let time = vec![Timestamp(0.0), Timestamp(1.0)];
        let mut ts = BinnedTimeSeries::new(time, Some(Quantity::seconds(1.0))).unwrap();
        ts.push_column("rate", Unit::BytePerSecond, array![1.0, 2.0])
            .unwrap();
        assert!(ts.push_column("bad", Unit::Count, array![1.0]).is_err());
        assert_eq!(ts.column("rate").unwrap().unit, Unit::BytePerSecond);
        assert!(BinnedTimeSeries::new(Vec::new(), Some(Quantity::kev(1.0))).is_err());
    }
}
