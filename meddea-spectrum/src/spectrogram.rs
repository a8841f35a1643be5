//! Rendering seam for spectrograms.
//!
//! Drawing lives outside this crate; a renderer receives the pixel-summed
//! [`Spectrogram`] and does whatever its backend needs with it.

use meddea_core::Spectrogram;

/// A plotting backend able to draw a spectrogram.
pub trait SpectrogramRenderer {
    /// Error reported by the backend.
    type Error;

    /// Draws the spectrogram.
    fn render(&mut self, spectrogram: &Spectrogram) -> Result<(), Self::Error>;
}
