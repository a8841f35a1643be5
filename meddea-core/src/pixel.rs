//! Pixel addressing for the MeDDEA detector plane.
//!
//! Each of the four detector modules is read out by one ASIC with twelve
//! pixels (eight large, four small). A pixel is addressed either by the pair
//! `(module, pixel)` or by a flat 16-bit id that encodes the same pair.

use std::fmt;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of detector modules (ASICs).
pub const NUM_MODULES: u8 = 4;

/// Number of pixels per module.
pub const PIXELS_PER_MODULE: u8 = 12;

/// Number of pixel slots carried by one summary spectrum packet.
pub const NUM_SPECTRUM_SLOTS: usize = 24;

/// Fixed bit pattern in the upper bits of every flat pixel id.
pub const PIXEL_ID_BASE: u16 = 0xCA00;

const MODULE_SHIFT: u16 = 5;
const PIXEL_MASK: u16 = 0x1F;
const MODULE_MASK: u16 = 0x3;

/// Pixels 0..=7 are large, 8..=11 small.
const FIRST_SMALL_PIXEL: u8 = 8;

/// Pixel order used by the summary spectrum slots within each module.
///
/// The flight software reports the slots by ASIC readout channel
/// `[26, 8, 18, 0, 21, 3]`; each slot's pixel index is the rank of its
/// channel among those six.
const SPECTRUM_SLOT_ORDER: [u8; 6] = [5, 2, 3, 0, 4, 1];

/// Physical size class of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelSize {
    Large,
    Small,
}

/// A physical pixel address.
///
/// Equality, hashing and ordering all follow the flat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u16", into = "u16"))]
pub struct Pixel(u16);

impl Pixel {
    /// Creates a pixel from its module and pixel index.
    pub fn new(module: u8, pixel: u8) -> Result<Self> {
        encode(module, pixel).map(Self)
    }

    /// Creates a pixel from a flat id.
    pub fn from_id(id: u16) -> Result<Self> {
        decode(id)?;
        Ok(Self(id))
    }

    /// Returns the flat id.
    #[inline]
    #[must_use]
    pub fn id(self) -> u16 {
        self.0
    }

    /// Returns the module (ASIC) index.
    #[inline]
    #[must_use]
    pub fn module(self) -> u8 {
        ((self.0 >> MODULE_SHIFT) & MODULE_MASK) as u8
    }

    /// Returns the pixel index within the module.
    #[inline]
    #[must_use]
    pub fn pixel(self) -> u8 {
        (self.0 & PIXEL_MASK) as u8
    }

    /// Returns the size class of the pixel.
    #[must_use]
    pub fn size(self) -> PixelSize {
        if self.pixel() < FIRST_SMALL_PIXEL {
            PixelSize::Large
        } else {
            PixelSize::Small
        }
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = match self.size() {
            PixelSize::Large => 'L',
            PixelSize::Small => 'S',
        };
        write!(f, "A{}P{}{}", self.module(), self.pixel(), size)
    }
}

impl TryFrom<u16> for Pixel {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self> {
        Self::from_id(id)
    }
}

impl From<Pixel> for u16 {
    fn from(pixel: Pixel) -> Self {
        pixel.0
    }
}

/// Encodes a `(module, pixel)` pair into a flat pixel id.
pub fn encode(module: u8, pixel: u8) -> Result<u16> {
    if module >= NUM_MODULES || pixel >= PIXELS_PER_MODULE {
        return Err(Error::InvalidAddress { module, pixel });
    }
    Ok(PIXEL_ID_BASE | (u16::from(module) << MODULE_SHIFT) | u16::from(pixel))
}

/// Decodes a flat pixel id into its `(module, pixel)` pair.
pub fn decode(id: u16) -> Result<(u8, u8)> {
    let base_mask = !((MODULE_MASK << MODULE_SHIFT) | PIXEL_MASK);
    if id & base_mask != PIXEL_ID_BASE {
        return Err(Error::InvalidPixelId(id));
    }
    let module = ((id >> MODULE_SHIFT) & MODULE_MASK) as u8;
    let pixel = (id & PIXEL_MASK) as u8;
    if pixel >= PIXELS_PER_MODULE {
        return Err(Error::InvalidPixelId(id));
    }
    Ok((module, pixel))
}

/// An ordered collection of distinct pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelList {
    pixels: Vec<Pixel>,
}

impl PixelList {
    /// Builds a list from pixels, dropping repeated entries after their first
    /// occurrence.
    pub fn new(pixels: impl IntoIterator<Item = Pixel>) -> Self {
        let mut list = Self::default();
        for pixel in pixels {
            if !list.contains(pixel) {
                list.pixels.push(pixel);
            }
        }
        list
    }

    /// Builds a list from flat pixel ids.
    pub fn from_ids(ids: &[u16]) -> Result<Self> {
        let pixels = ids
            .iter()
            .map(|&id| Pixel::from_id(id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(pixels))
    }

    /// Returns every physical pixel, module-major.
    #[must_use]
    pub fn all() -> Self {
        let pixels = (0..NUM_MODULES).flat_map(|module| {
            (0..PIXELS_PER_MODULE).map(move |pixel| {
                Pixel(PIXEL_ID_BASE | (u16::from(module) << MODULE_SHIFT) | u16::from(pixel))
            })
        });
        Self {
            pixels: pixels.collect(),
        }
    }

    /// Returns the default summary-spectrum pixel assignment.
    #[must_use]
    pub fn default_spectrum() -> &'static PixelList {
        &DEFAULT_SPECTRUM_PIXELS
    }

    /// Returns true if the pixel is part of the list.
    #[inline]
    #[must_use]
    pub fn contains(&self, pixel: Pixel) -> bool {
        self.pixels.iter().any(|p| p.id() == pixel.id())
    }

    /// Returns the position of the pixel in the list.
    #[must_use]
    pub fn position(&self, pixel: Pixel) -> Option<usize> {
        self.pixels.iter().position(|p| p.id() == pixel.id())
    }

    /// Returns the number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Returns an iterator over the pixels in order.
    pub fn iter(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.pixels.iter().copied()
    }

    /// Returns the flat ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<u16> {
        self.pixels.iter().map(|p| p.id()).collect()
    }

    /// Returns the pixels as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Pixel] {
        &self.pixels
    }
}

impl From<Pixel> for PixelList {
    fn from(pixel: Pixel) -> Self {
        Self {
            pixels: vec![pixel],
        }
    }
}

impl FromIterator<Pixel> for PixelList {
    fn from_iter<I: IntoIterator<Item = Pixel>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a PixelList {
    type Item = Pixel;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Pixel>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter().copied()
    }
}

static DEFAULT_SPECTRUM_PIXELS: std::sync::LazyLock<PixelList> = std::sync::LazyLock::new(|| {
    let pixels = (0..NUM_MODULES).flat_map(|module| {
        SPECTRUM_SLOT_ORDER.iter().map(move |&pixel| {
            Pixel(PIXEL_ID_BASE | (u16::from(module) << MODULE_SHIFT) | u16::from(pixel))
        })
    });
    PixelList {
        pixels: pixels.collect(),
    }
});
