//! Register map for Feetech/Waveshare ST3215 serial bus servos.
//!
//! ```
//! use futures::executor::block_on;
//! use regmap::{simulator::SimulatedDevice, Session};
//! use st3215_regs::{registers::TargetLocation, St3215};
//!
//! let servo = SimulatedDevice::for_family::<St3215>().unwrap();
//! let mut session = block_on(Session::<St3215, _>::create(&servo, "sim0")).unwrap();
//! block_on(session.write::<TargetLocation>(2048)).unwrap();
//! assert_eq!(block_on(session.read::<TargetLocation>()).unwrap(), 2048);
//! ```

pub mod registers;
pub mod values;

use regmap::{DeviceFamily, RegisterMap};

/// The ST3215 family, recognised by its model number.
pub struct St3215;

impl DeviceFamily for St3215 {
    const NAME: &'static str = "ST3215";
    type Identity = registers::ModelNumber;
    /// Servo main version 9 in the low byte, sub version 3 in the high byte.
    const EXPECTED_IDENTITY: i32 = 0x0309;

    fn registers() -> &'static RegisterMap {
        &registers::REGISTERS
    }
}
