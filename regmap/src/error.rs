use crate::payload::PayloadType;
use crate::transport::TransportFault;

/// Everything that can go wrong while talking to a register.
///
/// Nothing here is retried locally. Callers that want retry or backoff can build it on top.
#[derive(displaydoc::Display, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// unexpected device identity on `{target}`: expected {expected}, got {actual}
    UnexpectedDeviceIdentity {
        target: String,
        expected: i32,
        actual: i32,
    },
    /// transport fault: {0}
    Transport(TransportFault),
    /// failed to encode register value: {0}
    Encode(EncodeError),
    /// failed to decode register value: {0}
    Decode(DecodeError),
    /// operation cancelled
    Cancelled,
}

impl Error {
    /// Cancellation is requested by the caller, so it usually isn't worth reporting.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl std::error::Error for Error {}

impl From<TransportFault> for Error {
    fn from(fault: TransportFault) -> Self {
        Self::Transport(fault)
    }
}

impl From<EncodeError> for Error {
    fn from(error: EncodeError) -> Self {
        Self::Encode(error)
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

/// A value was rejected before anything was sent to the device.
#[derive(displaydoc::Display, Debug, Copy, Clone, Eq, PartialEq)]
pub enum EncodeError {
    /// {value} does not fit in a {payload_type} payload
    OutOfRange {
        value: i32,
        payload_type: PayloadType,
    },
    /// {value:#x} sets reserved bits outside {mask:#x}
    ReservedBits { value: i32, mask: u32 },
    /// {0} is not a valid enum value
    InvalidEnumValue(i32),
    /// {value} is outside the register limits {min}..={max}
    OutsideLimits { value: i32, min: i32, max: i32 },
    /// register `{0}` is read-only
    ReadOnly(&'static str),
}

impl std::error::Error for EncodeError {}

/// A reply could not be turned into a register value.
#[derive(displaydoc::Display, Debug, Copy, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// expected a {expected} byte payload, got {actual} bytes
    LengthMismatch { expected: usize, actual: usize },
    /// {0} is not a valid enum value
    InvalidEnumValue(i32),
    /// {0} is not a valid value for this type
    InvalidValue(i32),
    /// reply did not carry a hardware timestamp
    MissingTimestamp,
}

impl std::error::Error for DecodeError {}
