//! Fixed-width payload codec.
//!
//! Multi-byte registers are stored low byte first, high byte behind, so every payload is
//! little-endian on the wire.

use crate::error::{DecodeError, EncodeError};
use core::ops::RangeInclusive;
use tinyvec::TinyVec;

/// The raw bytes carried by a command or reply, excluding framing and addressing.
pub type Payload = TinyVec<[u8; 4]>;

/// The wire width and signedness of a register.
#[derive(displaydoc::Display, Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PayloadType {
    /// u8
    U8,
    /// i16
    S16,
    /// u16
    U16,
}

impl PayloadType {
    /// Number of bytes this payload type occupies on the wire.
    pub const fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 | Self::U16 => 2,
        }
    }

    pub const fn min(self) -> i32 {
        match self {
            Self::U8 | Self::U16 => 0,
            Self::S16 => i16::MIN as i32,
        }
    }

    pub const fn max(self) -> i32 {
        match self {
            Self::U8 => u8::MAX as i32,
            Self::S16 => i16::MAX as i32,
            Self::U16 => u16::MAX as i32,
        }
    }

    pub fn range(self) -> RangeInclusive<i32> {
        self.min()..=self.max()
    }

    pub fn encode(self, value: i32) -> Result<Payload, EncodeError> {
        if !self.range().contains(&value) {
            return Err(EncodeError::OutOfRange {
                value,
                payload_type: self,
            });
        }
        let mut payload = Payload::new();
        match self {
            Self::U8 => payload.push(value as u8),
            Self::S16 => payload.extend_from_slice(&(value as i16).to_le_bytes()),
            Self::U16 => payload.extend_from_slice(&(value as u16).to_le_bytes()),
        }
        Ok(payload)
    }

    pub fn decode(self, payload: &[u8]) -> Result<i32, DecodeError> {
        match (self, payload) {
            (Self::U8, &[byte]) => Ok(byte.into()),
            (Self::S16, &[low, high]) => Ok(i16::from_le_bytes([low, high]).into()),
            (Self::U16, &[low, high]) => Ok(u16::from_le_bytes([low, high]).into()),
            _ => Err(DecodeError::LengthMismatch {
                expected: self.width(),
                actual: payload.len(),
            }),
        }
    }
}
