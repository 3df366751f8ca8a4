//! The seam between a session and whatever actually moves bytes to the device.
//!
//! Framing, checksums, serial port handling and retry policy all live on the far side of these
//! traits.

use crate::payload::{Payload, PayloadType};
use crate::register::Descriptor;
use core::time::Duration;

/// A single-frame request for one register.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Read {
        address: u8,
        payload_type: PayloadType,
    },
    Write {
        address: u8,
        payload_type: PayloadType,
        payload: Payload,
    },
}

impl Command {
    pub fn read_register(register: &Descriptor) -> Self {
        Self::Read {
            address: register.address,
            payload_type: register.payload_type,
        }
    }

    pub fn write_register(register: &Descriptor, payload: Payload) -> Self {
        Self::Write {
            address: register.address,
            payload_type: register.payload_type,
            payload,
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            Self::Read { address, .. } | Self::Write { address, .. } => *address,
        }
    }

    pub fn payload_type(&self) -> PayloadType {
        match self {
            Self::Read { payload_type, .. } | Self::Write { payload_type, .. } => *payload_type,
        }
    }
}

/// The device's answer to a [`Command`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
    /// Register contents for reads. Writes are acknowledged with whatever the device echoes,
    /// which is ignored.
    pub payload: Payload,
    /// When the device emitted the reply, relative to the device or session epoch.
    pub timestamp: Option<Duration>,
}

/// A fault reported by the transport. These are never retried by the session.
#[derive(displaydoc::Display, Debug, Clone, Eq, PartialEq)]
pub enum TransportFault {
    /// timed out waiting for a reply
    Timeout,
    /// transport disconnected
    Disconnected,
    /// malformed frame: {0}
    MalformedFrame(String),
    /// device rejected the command for address {address}
    Rejected { address: u8 },
}

impl std::error::Error for TransportFault {}

/// Sends one command at a time and waits for its reply.
///
/// A transport is owned by exactly one session, and `&mut self` serializes access to it. If an
/// implementation is shared between sessions, it must do its own locking.
///
/// Dropping a `send_command` future before it completes must not leave a half-written frame
/// behind, so that the next command can go out cleanly.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send_command(&mut self, command: &Command) -> Result<Reply, TransportFault>;
}

/// Opens transports by connection target, e.g. a serial port path.
///
/// The returned transport is released when it is dropped.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Transport: Transport;

    async fn open(&self, target: &str) -> Result<Self::Transport, TransportFault>;
}
