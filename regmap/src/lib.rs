//! A typed client for devices that expose their state as a map of small integer registers.
//!
//! A device family declares its registers once with [`register_map!`]. A [`Session`] opened
//! through a [`Connector`] then reads and writes them as typed values, optionally with the
//! hardware timestamp the device attached to its reply, and optionally under a
//! [`CancellationToken`].

mod macros;

pub mod config;
mod error;
mod payload;
mod register;
mod session;
pub mod simulator;
mod transport;

pub use error::{DecodeError, EncodeError, Error};
pub use payload::{Payload, PayloadType};
pub use register::{Access, Descriptor, Register, RegisterMap, RegisterValue, Semantic};
pub use session::{Cancellable, DeviceFamily, Session, Timestamped};
pub use tokio_util::sync::CancellationToken;
pub use transport::{Command, Connector, Reply, Transport, TransportFault};
