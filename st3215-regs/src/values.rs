//! Semantic types for the registers that aren't plain integers.

use bitflags::bitflags;
use regmap::{register_enum, DecodeError, PayloadType, RegisterValue, Semantic};

register_enum! {
    /// Serial baud rate, as an index into a fixed table.
    pub enum BaudRate: U8 {
        Baud1000000 = 0,
        Baud500000 = 1,
        Baud250000 = 2,
        Baud128000 = 3,
        Baud115200 = 4,
        Baud76800 = 5,
        Baud57600 = 6,
        Baud38400 = 7,
    }
}

impl BaudRate {
    pub fn bits_per_second(self) -> u32 {
        match self {
            Self::Baud1000000 => 1_000_000,
            Self::Baud500000 => 500_000,
            Self::Baud250000 => 250_000,
            Self::Baud128000 => 128_000,
            Self::Baud115200 => 115_200,
            Self::Baud76800 => 76_800,
            Self::Baud57600 => 57_600,
            Self::Baud38400 => 38_400,
        }
    }
}

register_enum! {
    pub enum ResponseStatusLevel: U8 {
        /// Only read and ping instructions get a reply packet.
        ReadAndPingOnly = 0,
        All = 1,
    }
}

register_enum! {
    pub enum OperationMode: U8 {
        Position = 0,
        /// Speed set by `RunningSpeed`, bit 15 is the direction.
        ConstantSpeed = 1,
        /// Open loop, duty cycle set by `RunningTime`, bit 11 is the direction.
        Pwm = 2,
        /// Step count set by `TargetLocation`, bit 15 is the direction.
        Step = 3,
    }
}

register_enum! {
    pub enum TorqueSwitch: U8 {
        Off = 0,
        On = 1,
        /// Sets the position correction so that the current position reads as 2048.
        RecenterPosition = 128,
    }
}

register_enum! {
    /// Whether writes to EPROM addresses survive a power cycle.
    pub enum EpromLock: U8 {
        /// Writes are saved.
        Closed = 0,
        /// Writes are lost at power off.
        Open = 1,
    }
}

bitflags! {
    /// Protection conditions, used for unloading, LED alarms and the servo status. Bits 6 and 7
    /// are reserved.
    #[derive(Default)]
    pub struct ProtectionFlags: u8 {
        const VOLTAGE = 0x01;
        const SENSOR = 0x02;
        const TEMPERATURE = 0x04;
        const CURRENT = 0x08;
        const ANGLE = 0x10;
        const OVERLOAD = 0x20;
    }
}

impl RegisterValue for ProtectionFlags {
    const PAYLOAD_TYPE: PayloadType = PayloadType::U8;
    const SEMANTIC: Semantic = Semantic::Flags {
        mask: Self::all().bits() as u32,
    };

    fn from_raw(raw: i32) -> Result<Self, DecodeError> {
        let bits = u8::try_from(raw).map_err(|_| DecodeError::InvalidValue(raw))?;
        Ok(Self::from_bits_truncate(bits))
    }

    fn to_raw(&self) -> i32 {
        self.bits().into()
    }
}

/// Offset applied to the measured position, in steps. Stored as sign and magnitude with the
/// sign in bit 11.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PositionCorrection(pub i16);

impl RegisterValue for PositionCorrection {
    const PAYLOAD_TYPE: PayloadType = PayloadType::U16;
    const SEMANTIC: Semantic = Semantic::SignMagnitude { sign_bit: 11 };

    fn from_raw(raw: i32) -> Result<Self, DecodeError> {
        i16::try_from(raw)
            .map(Self)
            .map_err(|_| DecodeError::InvalidValue(raw))
    }

    fn to_raw(&self) -> i32 {
        self.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(BaudRate::Baud1000000, 1_000_000)]
    #[test_case(BaudRate::Baud115200, 115_200)]
    #[test_case(BaudRate::Baud38400, 38_400)]
    fn baud_rate(baud_rate: BaudRate, bits_per_second: u32) {
        assert_eq!(baud_rate.bits_per_second(), bits_per_second);
    }

    #[test]
    fn torque_switch_values() {
        assert_eq!(TorqueSwitch::from_raw(128), Ok(TorqueSwitch::RecenterPosition));
        assert_eq!(TorqueSwitch::from_raw(2), Err(DecodeError::InvalidEnumValue(2)));
        assert_eq!(TorqueSwitch::On.to_raw(), 1);
    }

    #[test]
    fn protection_flags_mask() {
        assert_eq!(
            ProtectionFlags::SEMANTIC,
            Semantic::Flags { mask: 0x3f }
        );
    }

    #[test]
    fn protection_flags_from_raw() {
        assert_eq!(
            ProtectionFlags::from_raw(0x23),
            Ok(ProtectionFlags::VOLTAGE | ProtectionFlags::SENSOR | ProtectionFlags::OVERLOAD)
        );
    }

    #[test_case(-100, 0x0864)]
    #[test_case(2047, 0x07ff)]
    fn position_correction_wire(correction: i16, wire: i32) {
        assert_eq!(
            PositionCorrection::SEMANTIC.to_wire(PositionCorrection(correction).to_raw()),
            Ok(wire)
        );
        assert_eq!(
            PositionCorrection::SEMANTIC
                .from_wire(wire)
                .and_then(PositionCorrection::from_raw),
            Ok(PositionCorrection(correction))
        );
    }
}
