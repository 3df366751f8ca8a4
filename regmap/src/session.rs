use crate::error::{DecodeError, EncodeError, Error};
use crate::register::{Descriptor, Register, RegisterMap, RegisterValue};
use crate::transport::{Command, Connector, Reply, Transport};
use core::future::Future;
use core::marker::PhantomData;
use core::time::Duration;
use futures::future::{select, Either};
use log::{debug, trace, warn};
use std::pin::pin;
use tokio_util::sync::CancellationToken;

/// A family of devices sharing one register map, recognised by the value of an identity
/// register.
pub trait DeviceFamily {
    const NAME: &'static str;

    /// The register read when a session is created.
    type Identity: Register;

    /// The semantic value `Identity` must hold for the device to be accepted.
    const EXPECTED_IDENTITY: i32;

    fn registers() -> &'static RegisterMap;
}

/// A register value together with the time the device sent it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Timestamped<T> {
    pub value: T,
    /// Time since the device or session epoch, as reported in the reply. This is when the
    /// reply was emitted, not when the value last changed.
    pub timestamp: Duration,
}

impl<T> Timestamped<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timestamped<U> {
        Timestamped {
            value: f(self.value),
            timestamp: self.timestamp,
        }
    }
}

/// One open, identity-verified connection to a device.
///
/// The session owns its transport. Dropping the session releases it.
pub struct Session<F, T> {
    transport: T,
    target: String,
    family: PhantomData<fn() -> F>,
}

impl<F: DeviceFamily, T: Transport> Session<F, T> {
    /// Opens a transport to `target` and checks that the device on the other end belongs to
    /// `F`.
    ///
    /// If anything goes wrong, the transport is released before returning. Dropping the
    /// returned future also releases it; use [`create_cancellable`](Self::create_cancellable)
    /// to give up on a device that never answers.
    pub async fn create<C>(connector: &C, target: &str) -> Result<Self, Error>
    where
        C: Connector<Transport = T>,
    {
        Self::open(connector, target, None).await
    }

    /// Like [`create`](Self::create), but fails with [`Error::Cancelled`] once `token` is
    /// cancelled, whether that happens while opening the transport or while reading the
    /// identity.
    pub async fn create_cancellable<C>(
        connector: &C,
        target: &str,
        token: &CancellationToken,
    ) -> Result<Self, Error>
    where
        C: Connector<Transport = T>,
    {
        Self::open(connector, target, Some(token)).await
    }

    async fn open<C>(
        connector: &C,
        target: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Self, Error>
    where
        C: Connector<Transport = T>,
    {
        debug!("Opening {} session on {}", F::NAME, target);
        let transport = until_cancelled(connector.open(target), cancel).await??;
        let mut session = Self {
            transport,
            target: target.to_owned(),
            family: PhantomData,
        };

        let identity = <F::Identity as Register>::DESCRIPTOR;
        let (actual, _) = session.read_raw(&identity, cancel).await?;
        if actual != F::EXPECTED_IDENTITY {
            warn!(
                "Device on {} reported {} {}, expected {} for {}",
                target,
                identity.name,
                actual,
                F::EXPECTED_IDENTITY,
                F::NAME
            );
            return Err(Error::UnexpectedDeviceIdentity {
                target: target.to_owned(),
                expected: F::EXPECTED_IDENTITY,
                actual,
            });
        }

        Ok(session)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn registers(&self) -> &'static RegisterMap {
        F::registers()
    }

    /// Releases the transport.
    pub fn close(self) {
        debug!("Closing {} session on {}", F::NAME, self.target);
    }

    pub async fn read<R: Register>(&mut self) -> Result<R::Value, Error> {
        self.read_typed::<R>(None).await.map(|(value, _)| value)
    }

    pub async fn read_timestamped<R: Register>(
        &mut self,
    ) -> Result<Timestamped<R::Value>, Error> {
        let (value, timestamp) = self.read_typed::<R>(None).await?;
        Ok(Timestamped {
            value,
            timestamp: timestamp.ok_or(DecodeError::MissingTimestamp)?,
        })
    }

    pub async fn write<R: Register>(&mut self, value: R::Value) -> Result<(), Error> {
        self.write_raw(&R::DESCRIPTOR, value.to_raw(), None).await
    }

    /// Reads a register chosen at runtime, e.g. from [`RegisterMap::get`].
    pub async fn read_descriptor(&mut self, register: &Descriptor) -> Result<i32, Error> {
        self.read_raw(register, None).await.map(|(value, _)| value)
    }

    pub async fn read_descriptor_timestamped(
        &mut self,
        register: &Descriptor,
    ) -> Result<Timestamped<i32>, Error> {
        let (value, timestamp) = self.read_raw(register, None).await?;
        Ok(Timestamped {
            value,
            timestamp: timestamp.ok_or(DecodeError::MissingTimestamp)?,
        })
    }

    /// Writes a register chosen at runtime. The value is range checked against the register
    /// before anything is sent.
    pub async fn write_descriptor(&mut self, register: &Descriptor, value: i32) -> Result<(), Error> {
        self.write_raw(register, value, None).await
    }

    /// Register operations that give up with [`Error::Cancelled`] once `token` is cancelled.
    pub fn cancellable<'a>(&'a mut self, token: &'a CancellationToken) -> Cancellable<'a, F, T> {
        Cancellable {
            session: self,
            token,
        }
    }

    async fn read_typed<R: Register>(
        &mut self,
        cancel: Option<&CancellationToken>,
    ) -> Result<(R::Value, Option<Duration>), Error> {
        let (raw, timestamp) = self.read_raw(&R::DESCRIPTOR, cancel).await?;
        Ok((R::Value::from_raw(raw)?, timestamp))
    }

    /// The one decode path shared by plain and timestamped reads.
    async fn read_raw(
        &mut self,
        register: &Descriptor,
        cancel: Option<&CancellationToken>,
    ) -> Result<(i32, Option<Duration>), Error> {
        let reply = self
            .exchange(Command::read_register(register), cancel)
            .await?;
        let value = register.decode(&reply.payload)?;
        trace!("{} is {} at {:?}", register.name, value, reply.timestamp);
        Ok((value, reply.timestamp))
    }

    async fn write_raw(
        &mut self,
        register: &Descriptor,
        value: i32,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), Error> {
        if !register.is_writable() {
            return Err(EncodeError::ReadOnly(register.name).into());
        }
        let payload = register.encode(value)?;
        self.exchange(Command::write_register(register, payload), cancel)
            .await?;
        trace!("{} set to {}", register.name, value);
        Ok(())
    }

    async fn exchange(
        &mut self,
        command: Command,
        cancel: Option<&CancellationToken>,
    ) -> Result<Reply, Error> {
        trace!("Sending {:?}", command);
        match until_cancelled(self.transport.send_command(&command), cancel).await {
            Ok(reply) => Ok(reply?),
            Err(e) => {
                debug!("Cancelled {:?} on {}", command, self.target);
                Err(e)
            }
        }
    }
}

/// Runs `future` to completion, unless `cancel` is cancelled first. A token that is already
/// cancelled doesn't poll `future` at all.
async fn until_cancelled<Fut: Future>(
    future: Fut,
    cancel: Option<&CancellationToken>,
) -> Result<Fut::Output, Error> {
    let Some(token) = cancel else {
        return Ok(future.await);
    };
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    match select(pin!(future), pin!(token.cancelled())).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(Error::Cancelled),
    }
}

/// A session borrowed together with a [`CancellationToken`].
pub struct Cancellable<'a, F, T> {
    session: &'a mut Session<F, T>,
    token: &'a CancellationToken,
}

impl<F: DeviceFamily, T: Transport> Cancellable<'_, F, T> {
    pub async fn read<R: Register>(&mut self) -> Result<R::Value, Error> {
        self.session
            .read_typed::<R>(Some(self.token))
            .await
            .map(|(value, _)| value)
    }

    pub async fn read_timestamped<R: Register>(
        &mut self,
    ) -> Result<Timestamped<R::Value>, Error> {
        let (value, timestamp) = self.session.read_typed::<R>(Some(self.token)).await?;
        Ok(Timestamped {
            value,
            timestamp: timestamp.ok_or(DecodeError::MissingTimestamp)?,
        })
    }

    pub async fn write<R: Register>(&mut self, value: R::Value) -> Result<(), Error> {
        self.session
            .write_raw(&R::DESCRIPTOR, value.to_raw(), Some(self.token))
            .await
    }

    pub async fn read_descriptor(&mut self, register: &Descriptor) -> Result<i32, Error> {
        self.session
            .read_raw(register, Some(self.token))
            .await
            .map(|(value, _)| value)
    }

    pub async fn read_descriptor_timestamped(
        &mut self,
        register: &Descriptor,
    ) -> Result<Timestamped<i32>, Error> {
        let (value, timestamp) = self.session.read_raw(register, Some(self.token)).await?;
        Ok(Timestamped {
            value,
            timestamp: timestamp.ok_or(DecodeError::MissingTimestamp)?,
        })
    }

    pub async fn write_descriptor(&mut self, register: &Descriptor, value: i32) -> Result<(), Error> {
        self.session
            .write_raw(register, value, Some(self.token))
            .await
    }
}
