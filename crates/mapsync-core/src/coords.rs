//! Map coordinates and the deterministic marker key derived from them

use crate::{Error, MarkerId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept by [`Coords::key`]
pub const KEY_PRECISION: usize = 4;

/// A position on the map canvas, stored in documents as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    /// Create coordinates without validation
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create coordinates, rejecting NaN and infinities
    pub fn checked(lat: f64, lng: f64) -> Result<Self> {
        let coords = Self::new(lat, lng);
        coords.validate()?;
        Ok(coords)
    }

    /// Fail if either component is not finite
    pub fn validate(&self) -> Result<()> {
        if self.lat.is_finite() && self.lng.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidCoords {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Deterministic key `"{lat:.4}_{lng:.4}"`
    ///
    /// Two clicks that round to the same position produce the same key, so
    /// creation by click becomes an upsert. Components are written the way
    /// ECMAScript `toFixed(4)` writes them, so keys stored by web clients
    /// match: exact halves round away from zero and a negative value that
    /// rounds to zero keeps its sign (`-0.0000`).
    pub fn key(&self) -> String {
        format!("{}_{}", fixed(self.lat), fixed(self.lng))
    }

    /// The coordinate key as a marker id
    pub fn marker_id(&self) -> MarkerId {
        MarkerId::new(self.key())
    }
}

fn fixed(component: f64) -> String {
    let magnitude = component.abs();
    let digits = if is_half_step(magnitude) {
        // Exact in f64: the magnitude is an odd multiple of 2^-(KEY_PRECISION + 1)
        let scale = 10u64.pow(KEY_PRECISION as u32);
        let n = (magnitude * scale as f64 + 0.5) as u64;
        format!("{}.{:0width$}", n / scale, n % scale, width = KEY_PRECISION)
    } else {
        format!("{:.*}", KEY_PRECISION, magnitude)
    };
    // `-0.0` is not below zero and prints unsigned
    if component < 0.0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Whether `x` lies exactly halfway between two key steps
///
/// `x * 10^p` ends in exactly `.5` iff `x * 2^(p+1)` is an odd integer, since
/// the `5^p` factor can never divide a binary fraction.
fn is_half_step(x: f64) -> bool {
    let scaled = x * f64::from(1u32 << (KEY_PRECISION + 1));
    scaled.fract() == 0.0 && scaled % 2.0 == 1.0
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(coords: Coords) -> Self {
        [coords.lat, coords.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lat, self.lng)
    }
}
