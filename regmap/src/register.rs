//! Register descriptors, typed register values and the register map.

use crate::error::{DecodeError, EncodeError};
use crate::payload::{Payload, PayloadType};
use log::debug;

/// Whether a register may be written.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// How the integer on the wire maps to the value the register means.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Semantic {
    /// A plain integer.
    Integer,
    /// An enumeration where only the listed values are valid.
    Enum(&'static [i32]),
    /// Independent flag bits. Bits outside `mask` are reserved.
    ///
    /// Reserved bits are masked away when decoding, and rejected when encoding.
    Flags { mask: u32 },
    /// A magnitude in the bits below `sign_bit`, with `sign_bit` set for negative values.
    /// Bits above `sign_bit` are reserved and ignored when decoding.
    SignMagnitude { sign_bit: u8 },
}

impl Semantic {
    /// Maps a semantic value to the integer that goes on the wire.
    pub fn to_wire(&self, value: i32) -> Result<i32, EncodeError> {
        match *self {
            Self::Integer => Ok(value),
            Self::Enum(valid) => {
                if valid.contains(&value) {
                    Ok(value)
                } else {
                    Err(EncodeError::InvalidEnumValue(value))
                }
            }
            Self::Flags { mask } => {
                if value < 0 || value as u32 & !mask != 0 {
                    Err(EncodeError::ReservedBits { value, mask })
                } else {
                    Ok(value)
                }
            }
            Self::SignMagnitude { sign_bit } => {
                let sign = 1i32 << sign_bit;
                let magnitude = value.unsigned_abs();
                if magnitude >= sign as u32 {
                    return Err(EncodeError::OutsideLimits {
                        value,
                        min: -(sign - 1),
                        max: sign - 1,
                    });
                }
                if value < 0 {
                    Ok(magnitude as i32 | sign)
                } else {
                    Ok(value)
                }
            }
        }
    }

    /// Maps an integer read off the wire to its semantic value.
    pub fn from_wire(&self, wire: i32) -> Result<i32, DecodeError> {
        match *self {
            Self::Integer => Ok(wire),
            Self::Enum(valid) => {
                if valid.contains(&wire) {
                    Ok(wire)
                } else {
                    Err(DecodeError::InvalidEnumValue(wire))
                }
            }
            Self::Flags { mask } => {
                let masked = (wire as u32 & mask) as i32;
                if masked != wire {
                    debug!("Masked reserved bits {:#x} to {:#x}", wire, masked);
                }
                Ok(masked)
            }
            Self::SignMagnitude { sign_bit } => {
                let sign = 1i32 << sign_bit;
                let magnitude = wire & (sign - 1);
                if wire & sign != 0 {
                    Ok(-magnitude)
                } else {
                    Ok(magnitude)
                }
            }
        }
    }
}

/// Everything needed to talk to one register: where it lives, how wide it is and what its
/// value means.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Descriptor {
    pub name: &'static str,
    pub address: u8,
    pub payload_type: PayloadType,
    pub semantic: Semantic,
    pub access: Access,
    /// Inclusive range of values the device accepts, if it documents one.
    pub limits: Option<(i32, i32)>,
    /// The value the register holds after power on.
    pub initial_value: i32,
}

impl Descriptor {
    pub fn is_writable(&self) -> bool {
        self.access == Access::ReadWrite
    }

    /// Encodes a semantic value into exactly `payload_type.width()` bytes.
    ///
    /// Semantic validity is checked first, then whether the wire integer fits the payload type,
    /// then the register limits.
    pub fn encode(&self, value: i32) -> Result<Payload, EncodeError> {
        let wire = self.semantic.to_wire(value)?;
        let payload = self.payload_type.encode(wire)?;
        if let Some((min, max)) = self.limits {
            if value < min || value > max {
                return Err(EncodeError::OutsideLimits { value, min, max });
            }
        }
        debug_assert_eq!(payload.len(), self.payload_type.width());
        Ok(payload)
    }

    pub fn decode(&self, payload: &[u8]) -> Result<i32, DecodeError> {
        let wire = self.payload_type.decode(payload)?;
        self.semantic.from_wire(wire)
    }
}

/// A type that a register's contents can be decoded into.
pub trait RegisterValue: Sized {
    const PAYLOAD_TYPE: PayloadType;
    const SEMANTIC: Semantic = Semantic::Integer;

    /// Builds a value from the semantic integer produced by [`Descriptor::decode`].
    fn from_raw(raw: i32) -> Result<Self, DecodeError>;

    /// The semantic integer to hand to [`Descriptor::encode`].
    fn to_raw(&self) -> i32;
}

impl RegisterValue for u8 {
    const PAYLOAD_TYPE: PayloadType = PayloadType::U8;

    fn from_raw(raw: i32) -> Result<Self, DecodeError> {
        Self::try_from(raw).map_err(|_| DecodeError::InvalidValue(raw))
    }

    fn to_raw(&self) -> i32 {
        (*self).into()
    }
}

impl RegisterValue for u16 {
    const PAYLOAD_TYPE: PayloadType = PayloadType::U16;

    fn from_raw(raw: i32) -> Result<Self, DecodeError> {
        Self::try_from(raw).map_err(|_| DecodeError::InvalidValue(raw))
    }

    fn to_raw(&self) -> i32 {
        (*self).into()
    }
}

impl RegisterValue for i16 {
    const PAYLOAD_TYPE: PayloadType = PayloadType::S16;

    fn from_raw(raw: i32) -> Result<Self, DecodeError> {
        Self::try_from(raw).map_err(|_| DecodeError::InvalidValue(raw))
    }

    fn to_raw(&self) -> i32 {
        (*self).into()
    }
}

impl RegisterValue for bool {
    const PAYLOAD_TYPE: PayloadType = PayloadType::U8;
    const SEMANTIC: Semantic = Semantic::Enum(&[0, 1]);

    fn from_raw(raw: i32) -> Result<Self, DecodeError> {
        match raw {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DecodeError::InvalidEnumValue(raw)),
        }
    }

    fn to_raw(&self) -> i32 {
        (*self).into()
    }
}

/// A register known at compile time.
///
/// Implementations are normally generated with [`register_map!`](crate::register_map).
pub trait Register {
    type Value: RegisterValue;

    const DESCRIPTOR: Descriptor;
}

/// An ordered table of register descriptors, looked up by name or address.
#[derive(Clone, Copy, Debug)]
pub struct RegisterMap {
    registers: &'static [Descriptor],
}

impl RegisterMap {
    /// Panics if two registers share an address. In a `static` this is a compile error.
    pub const fn new(registers: &'static [Descriptor]) -> Self {
        let mut i = 0;
        while i < registers.len() {
            let mut j = i + 1;
            while j < registers.len() {
                if registers[i].address == registers[j].address {
                    panic!("duplicate register address in register map");
                }
                j += 1;
            }
            i += 1;
        }
        Self { registers }
    }

    pub fn get(&self, name: &str) -> Option<&'static Descriptor> {
        self.registers.iter().find(|register| register.name == name)
    }

    pub fn by_address(&self, address: u8) -> Option<&'static Descriptor> {
        self.registers
            .iter()
            .find(|register| register.address == address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Descriptor> {
        self.registers.iter()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
