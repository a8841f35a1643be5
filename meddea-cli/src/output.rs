//! CSV output for analysis products.

use std::io::Write;

use meddea_spectrum::{BinnedTimeSeries, Spectrum};

use crate::Result;

/// Writes a spectrum as `center,counts,uncertainty` rows.
pub fn write_spectrum<W: Write>(out: &mut W, spectrum: &Spectrum) -> Result<()> {
    let unit = spectrum.unit().symbol();
    writeln!(out, "center_{unit},counts,uncertainty")?;
    let centers = spectrum.spectral_axis();
    for ((center, count), sigma) in centers
        .iter()
        .zip(spectrum.counts().iter())
        .zip(spectrum.uncertainty().iter())
    {
        writeln!(out, "{center},{count},{sigma}")?;
    }
    Ok(())
}

/// Writes a binned time series as one row per bin, one column per series.
pub fn write_time_series<W: Write>(out: &mut W, series: &BinnedTimeSeries) -> Result<()> {
    write!(out, "time_s")?;
    for column in series.columns() {
        write!(out, ",{} [{}]", column.name, column.unit.symbol())?;
    }
    writeln!(out)?;
    for (row, time) in series.time().iter().enumerate() {
        write!(out, "{}", time.as_secs())?;
        for column in series.columns() {
            write!(out, ",{}", column.values[row])?;
        }
        writeln!(out)?;
    }
    Ok(())
}
