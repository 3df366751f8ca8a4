//! An in-memory device that answers commands the way a register-mapped device would.
//!
//! Registers live in one little-endian memory, so a 2 byte register at address 9 occupies
//! addresses 9 and 10. Faults, corrupted replies and stalled replies can be injected to exercise
//! error paths.

use crate::config::{ConfigError, SimulatorConfig};
use crate::error::{DecodeError, EncodeError};
use crate::payload::Payload;
use crate::register::{Descriptor, Register};
use crate::session::DeviceFamily;
use crate::transport::{Command, Connector, Reply, Transport, TransportFault};
use core::time::Duration;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

const MEMORY_SIZE: usize = 256;
const DEFAULT_CLOCK_STEP: Duration = Duration::from_millis(1);

fn encode_entry(register: &Descriptor, value: i32) -> Result<(u8, Payload), ConfigError> {
    let payload = register
        .encode(value)
        .map_err(|error| ConfigError::InvalidValue {
            name: register.name.to_owned(),
            error,
        })?;
    Ok((register.address, payload))
}

enum Injection {
    Fault(TransportFault),
    Payload(Payload),
}

struct DeviceState {
    memory: [u8; MEMORY_SIZE],
    clock: Duration,
    clock_step: Duration,
    timestamps: bool,
    hold_replies: bool,
    injections: VecDeque<Injection>,
    refuse_connections: Option<TransportFault>,
    open_handles: usize,
    commands: Vec<Command>,
}

impl DeviceState {
    fn execute(&mut self, command: &Command) -> Result<Reply, TransportFault> {
        let injected = self.injections.pop_front();
        if let Some(Injection::Fault(fault)) = injected {
            trace!("Injecting {:?} for {:?}", fault, command);
            return Err(fault);
        }

        let address = command.address();
        let start = usize::from(address);
        let end = start + command.payload_type().width();
        if end > MEMORY_SIZE {
            return Err(TransportFault::Rejected { address });
        }

        let payload = match command {
            Command::Read { .. } => self.memory[start..end].iter().copied().collect(),
            Command::Write { payload, .. } => {
                if payload.len() != end - start {
                    return Err(TransportFault::MalformedFrame(format!(
                        "{} byte payload for a {} byte write",
                        payload.len(),
                        end - start
                    )));
                }
                self.memory[start..end].copy_from_slice(payload);
                Payload::new()
            }
        };
        let payload = match injected {
            Some(Injection::Payload(payload)) => payload,
            _ => payload,
        };

        self.clock += self.clock_step;
        Ok(Reply {
            payload,
            timestamp: self.timestamps.then_some(self.clock),
        })
    }
}

/// A handle to a simulated device. Clones share the same device.
#[derive(Clone)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    /// A device with all memory zeroed.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                memory: [0; MEMORY_SIZE],
                clock: Duration::ZERO,
                clock_step: DEFAULT_CLOCK_STEP,
                timestamps: true,
                hold_replies: false,
                injections: VecDeque::new(),
                refuse_connections: None,
                open_handles: 0,
                commands: Vec::new(),
            })),
        }
    }

    /// A device of family `F` holding its power-on register values.
    ///
    /// Fails without building anything if an initial value doesn't encode.
    pub fn for_family<F: DeviceFamily>() -> Result<Self, ConfigError> {
        let mut writes = F::registers()
            .iter()
            .map(|register| encode_entry(register, register.initial_value))
            .collect::<Result<Vec<_>, _>>()?;
        let identity = <F::Identity as Register>::DESCRIPTOR;
        writes.push(encode_entry(&identity, F::EXPECTED_IDENTITY)?);

        let device = Self::new();
        device.write_all(&writes);
        Ok(device)
    }

    /// Applies identity, clock, timestamp and register settings for a device of family `F`.
    ///
    /// Every entry is checked before anything is applied, so on error the device is unchanged.
    pub fn apply_config<F: DeviceFamily>(&self, config: &SimulatorConfig) -> Result<(), ConfigError> {
        let mut writes = Vec::new();
        if let Some(identity) = config.identity {
            writes.push(encode_entry(
                &<F::Identity as Register>::DESCRIPTOR,
                identity,
            )?);
        }
        for (name, &value) in &config.registers {
            let register = F::registers()
                .get(name)
                .ok_or_else(|| ConfigError::UnknownRegister(name.clone()))?;
            writes.push(encode_entry(register, value)?);
        }

        self.write_all(&writes);
        let mut state = self.state.lock();
        state.clock_step = Duration::from_micros(config.clock_step_us);
        state.timestamps = config.timestamps;
        Ok(())
    }

    fn write_all(&self, writes: &[(u8, Payload)]) {
        for (address, payload) in writes {
            self.write_memory(*address, payload);
        }
    }

    /// Stores `value` in `register`, even if the register is read-only.
    pub fn set_register(&self, register: &Descriptor, value: i32) -> Result<(), EncodeError> {
        let payload = register.encode(value)?;
        self.write_memory(register.address, &payload);
        Ok(())
    }

    pub fn register(&self, register: &Descriptor) -> Result<i32, DecodeError> {
        register.decode(&self.memory(register.address, register.payload_type.width()))
    }

    /// Writes raw bytes, bypassing any encoding. Bytes past the end of memory are dropped.
    pub fn write_memory(&self, address: u8, bytes: &[u8]) {
        let mut state = self.state.lock();
        let start = usize::from(address);
        let end = (start + bytes.len()).min(MEMORY_SIZE);
        state.memory[start..end].copy_from_slice(&bytes[..end - start]);
    }

    pub fn memory(&self, address: u8, length: usize) -> Vec<u8> {
        let state = self.state.lock();
        let start = usize::from(address);
        let end = (start + length).min(MEMORY_SIZE);
        state.memory[start..end].to_vec()
    }

    /// The next command fails with `fault` instead of being executed.
    pub fn inject_fault(&self, fault: TransportFault) {
        self.state.lock().injections.push_back(Injection::Fault(fault));
    }

    /// The next command is executed, but its reply carries `payload` instead.
    pub fn inject_payload(&self, payload: &[u8]) {
        self.state
            .lock()
            .injections
            .push_back(Injection::Payload(payload.iter().copied().collect()));
    }

    /// While held, commands are received but never answered.
    pub fn hold_replies(&self, hold: bool) {
        self.state.lock().hold_replies = hold;
    }

    pub fn set_timestamps(&self, timestamps: bool) {
        self.state.lock().timestamps = timestamps;
    }

    pub fn set_clock_step(&self, clock_step: Duration) {
        self.state.lock().clock_step = clock_step;
    }

    pub fn clock(&self) -> Duration {
        self.state.lock().clock
    }

    /// Makes [`Connector::open`] fail with `fault`, or succeed again with `None`.
    pub fn refuse_connections(&self, fault: Option<TransportFault>) {
        self.state.lock().refuse_connections = fault;
    }

    /// Number of transports opened and not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().commands.clone()
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SimulatedDevice {
    type Transport = SimulatedTransport;

    async fn open(&self, target: &str) -> Result<SimulatedTransport, TransportFault> {
        let mut state = self.state.lock();
        if let Some(fault) = &state.refuse_connections {
            debug!("Refusing connection to {}: {}", target, fault);
            return Err(fault.clone());
        }
        state.open_handles += 1;
        debug!("Opened {} ({} open)", target, state.open_handles);
        Ok(SimulatedTransport {
            state: self.state.clone(),
            target: target.to_owned(),
        })
    }
}

/// One open connection to a [`SimulatedDevice`].
pub struct SimulatedTransport {
    state: Arc<Mutex<DeviceState>>,
    target: String,
}

impl Transport for SimulatedTransport {
    async fn send_command(&mut self, command: &Command) -> Result<Reply, TransportFault> {
        let hold = {
            let mut state = self.state.lock();
            state.commands.push(command.clone());
            state.hold_replies
        };
        if hold {
            trace!("Holding reply to {:?} on {}", command, self.target);
            futures::future::pending::<()>().await;
        }
        let reply = self.state.lock().execute(command);
        trace!("{} replied {:?}", self.target, reply);
        reply
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_handles -= 1;
        debug!("Closed {} ({} open)", self.target, state.open_handles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadType;
    use futures::executor::block_on;

    crate::register_map! {
        static REGISTERS;

        Identity @ 0: u16 = 0, ReadOnly;
        Speed @ 4: i16 = -20, ReadWrite;
        Mode @ 6: bool = 1, ReadWrite;
    }

    struct TestFamily;

    impl DeviceFamily for TestFamily {
        const NAME: &'static str = "test";
        type Identity = Identity;
        const EXPECTED_IDENTITY: i32 = 0x1234;

        fn registers() -> &'static crate::RegisterMap {
            &REGISTERS
        }
    }

    mod overflowing {
        use crate::DeviceFamily;

        crate::register_map! {
            pub static REGISTERS;

            Level @ 0: u8 = 300, ReadWrite;
        }

        pub struct OverflowingFamily;

        impl DeviceFamily for OverflowingFamily {
            const NAME: &'static str = "overflowing";
            type Identity = Level;
            const EXPECTED_IDENTITY: i32 = 1;

            fn registers() -> &'static crate::RegisterMap {
                &REGISTERS
            }
        }
    }

    fn read(address: u8, payload_type: PayloadType) -> Command {
        Command::Read {
            address,
            payload_type,
        }
    }

    #[test]
    fn seeds_initial_values_and_identity() {
        let device = SimulatedDevice::for_family::<TestFamily>().unwrap();
        assert_eq!(device.memory(0, 2), [0x34, 0x12]);
        assert_eq!(device.register(&Speed::DESCRIPTOR), Ok(-20));
        assert_eq!(device.register(&Mode::DESCRIPTOR), Ok(1));
    }

    #[test]
    fn initial_value_that_does_not_encode() {
        assert!(matches!(
            SimulatedDevice::for_family::<overflowing::OverflowingFamily>(),
            Err(ConfigError::InvalidValue { name, .. }) if name == "Level"
        ));
    }

    #[test]
    fn counts_open_handles() {
        let device = SimulatedDevice::new();
        let first = block_on(device.open("a")).unwrap();
        let second = block_on(device.open("b")).unwrap();
        assert_eq!(device.open_handles(), 2);
        drop(first);
        assert_eq!(device.open_handles(), 1);
        drop(second);
        assert_eq!(device.open_handles(), 0);
    }

    #[test]
    fn refused_connection_opens_nothing() {
        let device = SimulatedDevice::new();
        device.refuse_connections(Some(TransportFault::Disconnected));
        assert!(matches!(
            block_on(device.open("a")),
            Err(TransportFault::Disconnected)
        ));
        assert_eq!(device.open_handles(), 0);
    }

    #[test]
    fn write_then_read_memory() {
        let device = SimulatedDevice::new();
        let mut transport = block_on(device.open("a")).unwrap();
        let write = Command::Write {
            address: 9,
            payload_type: PayloadType::U16,
            payload: [0xff, 0x0f].iter().copied().collect(),
        };
        let ack = block_on(transport.send_command(&write)).unwrap();
        assert!(ack.payload.is_empty());
        let reply = block_on(transport.send_command(&read(9, PayloadType::U16))).unwrap();
        assert_eq!(&reply.payload[..], [0xff, 0x0f]);
        assert_eq!(device.commands().len(), 2);
    }

    #[test]
    fn clock_advances_per_reply() {
        let device = SimulatedDevice::new();
        device.set_clock_step(Duration::from_micros(250));
        let mut transport = block_on(device.open("a")).unwrap();
        let first = block_on(transport.send_command(&read(0, PayloadType::U8))).unwrap();
        let second = block_on(transport.send_command(&read(0, PayloadType::U8))).unwrap();
        assert_eq!(first.timestamp, Some(Duration::from_micros(250)));
        assert_eq!(second.timestamp, Some(Duration::from_micros(500)));
    }

    #[test]
    fn injections_apply_in_order() {
        let device = SimulatedDevice::new();
        device.inject_fault(TransportFault::Timeout);
        device.inject_payload(&[1, 2, 3]);
        let mut transport = block_on(device.open("a")).unwrap();
        let command = read(0, PayloadType::U8);
        assert_eq!(
            block_on(transport.send_command(&command)),
            Err(TransportFault::Timeout)
        );
        let reply = block_on(transport.send_command(&command)).unwrap();
        assert_eq!(&reply.payload[..], [1, 2, 3]);
        let reply = block_on(transport.send_command(&command)).unwrap();
        assert_eq!(&reply.payload[..], [0]);
    }

    #[test]
    fn rejects_reads_past_end_of_memory() {
        let device = SimulatedDevice::new();
        let mut transport = block_on(device.open("a")).unwrap();
        assert_eq!(
            block_on(transport.send_command(&read(255, PayloadType::U16))),
            Err(TransportFault::Rejected { address: 255 })
        );
    }

    #[test]
    fn apply_config() {
        let device = SimulatedDevice::for_family::<TestFamily>().unwrap();
        let config: SimulatorConfig = toml::from_str(
            r#"
            identity = 7
            clock_step_us = 10
            timestamps = false
            [registers]
            Speed = -300
            "#,
        )
        .unwrap();
        device.apply_config::<TestFamily>(&config).unwrap();
        assert_eq!(device.register(&Identity::DESCRIPTOR), Ok(7));
        assert_eq!(device.register(&Speed::DESCRIPTOR), Ok(-300));
        let mut transport = block_on(device.open("a")).unwrap();
        let reply = block_on(transport.send_command(&read(0, PayloadType::U8))).unwrap();
        assert_eq!(reply.timestamp, None);
    }

    #[test]
    fn apply_config_unknown_register() {
        let device = SimulatedDevice::new();
        let mut config = SimulatorConfig::default();
        config.registers.insert("Nope".to_owned(), 1);
        assert!(matches!(
            device.apply_config::<TestFamily>(&config),
            Err(ConfigError::UnknownRegister(name)) if name == "Nope"
        ));
    }

    #[test]
    fn apply_config_invalid_value() {
        let device = SimulatedDevice::new();
        let mut config = SimulatorConfig::default();
        config.registers.insert("Mode".to_owned(), 2);
        assert!(matches!(
            device.apply_config::<TestFamily>(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn apply_config_is_all_or_nothing() {
        let device = SimulatedDevice::for_family::<TestFamily>().unwrap();
        let config: SimulatorConfig = toml::from_str(
            r#"
            identity = 7
            clock_step_us = 10
            timestamps = false
            [registers]
            Mode = 0
            Speed = 40000
            "#,
        )
        .unwrap();
        assert!(matches!(
            device.apply_config::<TestFamily>(&config),
            Err(ConfigError::InvalidValue { name, .. }) if name == "Speed"
        ));
        assert_eq!(device.register(&Identity::DESCRIPTOR), Ok(0x1234));
        assert_eq!(device.register(&Mode::DESCRIPTOR), Ok(1));
        let mut transport = block_on(device.open("a")).unwrap();
        let reply = block_on(transport.send_command(&read(0, PayloadType::U8))).unwrap();
        assert_eq!(reply.timestamp, Some(DEFAULT_CLOCK_STEP));
    }
}
