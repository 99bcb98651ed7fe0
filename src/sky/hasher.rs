//! Deterministic spatial hashing
//!
//! Coordinates come from the bytes of a path and nothing else, so a directory
//! lands on the same spot no matter when or in which run it is first seen.

use blake2::digest::consts::{U2, U4};
use blake2::{Blake2b, Digest};

/// Smallest scale a directory anchor can have
pub const BASE_SCALE: u32 = 3;

/// Multiplier applied to the squared distance byte of a file offset
const DISTANCE_FACTOR: f64 = 3.0;

/// Four pseudo-random bytes from a 4-byte BLAKE2b digest of `bytes`
pub fn hash16(bytes: &[u8]) -> [u8; 4] {
    let digest = Blake2b::<U4>::digest(bytes);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Two pseudo-random bytes from a 2-byte BLAKE2b digest of `bytes`
pub fn hash8(bytes: &[u8]) -> [u8; 2] {
    let digest = Blake2b::<U2>::digest(bytes);
    [digest[0], digest[1]]
}

/// Anchor position and scale for a directory path
///
/// `x` and `y` cover the full `0..=65535` plane; `scale` is 3, 4 or 5.
pub fn anchor_for(path: &str) -> (u16, u16, u32) {
    let [b0, b1, b2, b3] = hash16(path.as_bytes());
    let x = u16::from_be_bytes([b0, b1]);
    let y = u16::from_be_bytes([b2, b3]);
    let scale = BASE_SCALE + u32::from(b0) % 3;
    (x, y, scale)
}

/// Offset of a file from its directory anchor
///
/// The first hash byte picks the distance (squared, so files cluster near the
/// anchor), the second is used directly as an angle in radians.
pub fn offset_for(scale: u32, name: &str) -> (f64, f64) {
    let [d0, d1] = hash8(name.as_bytes());
    let d0 = f64::from(d0);
    let distance = d0 * d0 / 256.0 * f64::from(scale) * DISTANCE_FACTOR;
    let angle = f64::from(d1);
    (distance * angle.cos(), distance * angle.sin())
}
