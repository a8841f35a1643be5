//! Summary spectrum list container.
//!
//! Summary spectrum packets carry one coarse spectrum (512 bins of 8
//! channels) for each of up to 24 pixel slots, together with the pixel id
//! that occupied every slot. The slot order may change from packet to
//! packet; the set of pixels may not.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use log::warn;
use meddea_core::pixel::NUM_SPECTRUM_SLOTS;
use meddea_core::{
    BinEdges, BinnedTimeSeries, Diagnosed, Diagnostic, Error, PacketBatch, PixelList, Result,
    SpectralRegions, Spectrogram, Spectrum, Timestamp, Unit,
};
use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};

use crate::spectrogram::SpectrogramRenderer;
use crate::summary::{group_thousands, time_span};

/// Per-packet summary spectra for a set of pixels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpectrumList {
    packets: PacketBatch,
    /// Counts, shape `(packet, slot, bin)`.
    spectra: Array3<u32>,
    /// Pixel id in each slot, shape `(packet, slot)`.
    slot_pixels: Array2<u16>,
    pixel_list: PixelList,
    edges: BinEdges,
}

impl SpectrumList {
    /// Creates a spectrum list from packet headers, the spectrum cube and
    /// the per-packet slot pixel ids.
    ///
    /// More than 24 distinct pixel ids means corrupted telemetry; the default
    /// pixel assignment is used and a [`Diagnostic`] is returned. A slot
    /// assignment that covers different pixels in different packets is an
    /// error.
    pub fn new(
        packets: PacketBatch,
        spectra: Array3<u32>,
        pixel_ids: Array2<u16>,
    ) -> Result<Diagnosed<Self>> {
        packets.validate()?;
        let (n_rows, n_slots, n_bins) = spectra.dim();
        if n_rows == 0 {
            return Err(Error::EmptySeries("spectrum"));
        }
        check_len("spectra", packets.len(), n_rows)?;
        check_len("pixel id rows", n_rows, pixel_ids.nrows())?;
        check_len("pixel id slots", n_slots, pixel_ids.ncols())?;
        if n_slots > NUM_SPECTRUM_SLOTS {
            return Err(Error::InvalidParameter(format!(
                "at most {NUM_SPECTRUM_SLOTS} pixel slots supported, got {n_slots}"
            )));
        }
        let edges = BinEdges::summary_spectrum();
        check_len("spectral bins", edges.n_bins(), n_bins)?;

        let distinct: BTreeSet<u16> = pixel_ids.iter().copied().collect();
        if distinct.len() > NUM_SPECTRUM_SLOTS {
            let diagnostic = Diagnostic::PixelAssignmentFallback {
                distinct: distinct.len(),
            };
            warn!("{diagnostic}");
            let defaults = PixelList::default_spectrum();
            let row = Array1::from_iter(defaults.iter().take(n_slots).map(|p| p.id()));
            let slot_pixels = row
                .broadcast((n_rows, n_slots))
                .map(|view| view.to_owned())
                .ok_or_else(|| Error::InvalidParameter("cannot broadcast slots".to_string()))?;
            let list = Self {
                packets,
                spectra,
                slot_pixels,
                pixel_list: defaults.iter().take(n_slots).collect(),
                edges,
            };
            return Ok(Diagnosed {
                value: list,
                diagnostics: vec![diagnostic],
            });
        }

        let first_row = pixel_ids.row(0).to_vec();
        let mut reference = first_row.clone();
        reference.sort_unstable();
        reference.dedup();
        if reference.len() != n_slots {
            return Err(Error::PixelAssignmentUnstable { row: 0 });
        }
        for (row, ids) in pixel_ids.axis_iter(Axis(0)).enumerate().skip(1) {
            let mut sorted = ids.to_vec();
            sorted.sort_unstable();
            if sorted != reference {
                return Err(Error::PixelAssignmentUnstable { row });
            }
        }
        let pixel_list = PixelList::from_ids(&first_row)?;

        Ok(Diagnosed::clean(Self {
            packets,
            spectra,
            slot_pixels: pixel_ids,
            pixel_list,
            edges,
        }))
    }

    /// Replaces the shared spectral axis, e.g. with energy-calibrated edges.
    pub fn with_bin_edges(mut self, edges: BinEdges) -> Result<Self> {
        check_len("spectral bins", self.spectra.dim().2, edges.n_bins())?;
        self.edges = edges;
        Ok(self)
    }

    /// Packet header series.
    #[must_use]
    pub fn packets(&self) -> &PacketBatch {
        &self.packets
    }

    /// Packet times.
    #[must_use]
    pub fn time(&self) -> &[Timestamp] {
        &self.packets.time
    }

    /// Spectrum cube, shape `(packet, slot, bin)`.
    #[must_use]
    pub fn spectra(&self) -> &Array3<u32> {
        &self.spectra
    }

    /// Pixel assignment of the slots, in slot order of the first packet.
    #[must_use]
    pub fn pixel_list(&self) -> &PixelList {
        &self.pixel_list
    }

    /// Shared spectral bin edges.
    #[must_use]
    pub fn bin_edges(&self) -> &BinEdges {
        &self.edges
    }

    /// Number of packets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// True if there are no packets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Slot spectra of packet `i`, shape `(slot, bin)`.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<ArrayView2<'_, u32>> {
        (i < self.len()).then(|| self.spectra.index_axis(Axis(0), i))
    }

    /// True if the spectral axis is in keV.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.edges.unit() == Unit::KiloElectronVolt
    }

    /// Packets strictly inside `(start, end)`, keeping the pixel assignment.
    #[must_use]
    pub fn select_time_range(&self, start: Timestamp, end: Timestamp) -> Self {
        let rows = self.packets.rows_between(start, end);
        Self {
            packets: self.packets.take(&rows),
            spectra: self.spectra.select(Axis(0), &rows),
            slot_pixels: self.slot_pixels.select(Axis(0), &rows),
            pixel_list: self.pixel_list.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Per-packet counts summed over the slots holding one of `pixels`,
    /// shape `(packet, bin)`.
    fn pixel_summed(&self, pixels: &PixelList) -> Array2<f64> {
        let wanted: HashSet<u16> = pixels.iter().map(|p| p.id()).collect();
        let (n_rows, _, n_bins) = self.spectra.dim();
        let mut flux = Array2::<f64>::zeros((n_rows, n_bins));
        for ((row, slot), id) in self.slot_pixels.indexed_iter() {
            if wanted.contains(id) {
                let counts = self.spectra.slice(s![row, slot, ..]);
                flux.row_mut(row)
                    .zip_mut_with(&counts, |acc, &c| *acc += f64::from(c));
            }
        }
        flux
    }

    /// Time-integrated spectrum of the given pixels.
    ///
    /// Pixels not present in the list contribute nothing.
    pub fn spectrum(&self, pixels: &PixelList) -> Result<Spectrum> {
        let counts = self.pixel_summed(pixels).sum_axis(Axis(0));
        Spectrum::from_counts(self.edges.clone(), counts)
    }

    /// Counts per packet in each spectral region, summed over the given
    /// pixels. Bins are selected by their center.
    pub fn lightcurve(
        &self,
        pixels: &PixelList,
        regions: &SpectralRegions,
    ) -> Result<BinnedTimeSeries> {
        if regions.is_empty() {
            return Err(Error::InvalidParameter(
                "light curve needs at least one spectral region".to_string(),
            ));
        }
        if let Some(unit) = regions.unit() {
            if unit != self.edges.unit() {
                return Err(Error::UnsupportedUnit {
                    found: unit,
                    expected: self.edges.unit().symbol(),
                });
            }
        }
        let flux = self.pixel_summed(pixels);
        let centers = self.edges.centers();
        let mut lc = BinnedTimeSeries::new(self.packets.time.clone(), None)?;
        for region in regions.iter() {
            let mask = centers.mapv(|c| if region.contains_value(c) { 1.0 } else { 0.0 });
            lc.push_column(region.label(), Unit::Count, flux.dot(&mask))?;
        }
        Ok(lc)
    }

    /// Counts summed over all slots, shape `(packet, bin)`.
    #[must_use]
    pub fn spectrogram(&self) -> Spectrogram {
        Spectrogram {
            time: self.packets.time.clone(),
            edges: self.edges.clone(),
            counts: self.spectra.mapv(f64::from).sum_axis(Axis(1)),
        }
    }

    /// Hands the spectrogram to a renderer.
    pub fn render_spectrogram<R: SpectrogramRenderer>(
        &self,
        renderer: &mut R,
    ) -> std::result::Result<(), R::Error> {
        renderer.render(&self.spectrogram())
    }
}

impl fmt::Display for SpectrumList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: u64 = self.spectra.iter().map(|&c| u64::from(c)).sum();
        writeln!(
            f,
            "SpectrumList ({} spectra, {} events)",
            group_thousands(self.len() as u64),
            group_thousands(events)
        )?;
        if let Some(span) = time_span(&self.packets.time) {
            writeln!(f, "{span}")?;
        }
        Ok(())
    }
}

fn check_len(column: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            column,
            expected,
            actual,
        })
    }
}
