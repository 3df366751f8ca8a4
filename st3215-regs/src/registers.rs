//! The ST3215 memory table.
//!
//! Registers below address 40 live in EPROM and keep their value across power cycles while the
//! [`LockMark`] is closed. Everything from 40 up is SRAM. Two byte registers are stored low byte
//! first.

use crate::values::{self, ProtectionFlags};

regmap::register_map! {
    /// Every ST3215 register, in address order.
    pub static REGISTERS;

    /// Firmware major version number.
    FirmwareMajorVersion @ 0: u8 = 3, ReadOnly;
    /// Firmware sub version number.
    FirmwareMinorVersion @ 1: u8 = 6, ReadOnly;
    /// Servo main version number in the low byte, sub version number in the high byte.
    ///
    /// Used to recognise the device when a session is created.
    ModelNumber @ 3: u16 = 0x0309, ReadOnly;
    /// Unique identification code on the bus. 254 is the broadcast ID, so it can't be assigned.
    Id @ 5: u8 = 1, ReadWrite, limits(0, 253);
    BaudRate @ 6: values::BaudRate = 0, ReadWrite;
    /// Delay before replying, in units of 2us.
    ReturnDelay @ 7: u8 = 0, ReadWrite, limits(0, 254);
    ResponseStatusLevel @ 8: values::ResponseStatusLevel = 1, ReadWrite;
    /// Minimum limit of the motion stroke, in steps. 0 for multi-turn absolute position control.
    MinimumAngleLimit @ 9: u16 = 0, ReadWrite, limits(0, 4094);
    /// Maximum limit of the motion stroke, in steps. 0 for multi-turn absolute position control.
    MaximumAngleLimit @ 11: u16 = 4095, ReadWrite, limits(1, 4095);
    /// Maximum operating temperature, in °C.
    MaximumTemperatureLimit @ 13: u8 = 70, ReadWrite, limits(0, 100);
    /// Maximum input voltage, in units of 0.1V.
    MaximumInputVoltage @ 14: u8 = 80, ReadWrite, limits(0, 254);
    /// Minimum input voltage, in units of 0.1V.
    MinimumInputVoltage @ 15: u8 = 40, ReadWrite, limits(0, 254);
    /// Maximum output torque, where 1000 is 100% of the locked torque. Copied to
    /// [`TorqueLimit`] at power on.
    MaximumTorque @ 16: u16 = 1000, ReadWrite, limits(0, 1000);
    /// Special function byte. Don't modify without a good reason.
    Phase @ 18: u8 = 12, ReadWrite, limits(0, 254);
    /// Conditions that unload the servo.
    UnloadingCondition @ 19: ProtectionFlags = 44, ReadWrite;
    /// Conditions that flash the LED.
    LedAlarmCondition @ 20: ProtectionFlags = 47, ReadWrite;
    ProportionalCoefficient @ 21: u8 = 32, ReadWrite, limits(0, 254);
    DifferentialCoefficient @ 22: u8 = 32, ReadWrite, limits(0, 254);
    IntegralCoefficient @ 23: u8 = 0, ReadWrite, limits(0, 254);
    /// Minimum output starting torque, where 1000 is 100% of the locked torque.
    MinimumStartupForce @ 24: u16 = 16, ReadWrite, limits(0, 1000);
    /// In units of the minimum resolution angle.
    ClockwiseDeadZone @ 26: u8 = 1, ReadWrite, limits(0, 32);
    /// In units of the minimum resolution angle.
    CounterclockwiseDeadZone @ 27: u8 = 1, ReadWrite, limits(0, 32);
    /// In units of 6.5mA.
    ProtectionCurrent @ 28: u16 = 500, ReadWrite, limits(0, 511);
    /// Amplification factor of the minimum resolution angle. Raising it extends the number of
    /// control turns.
    AngularResolution @ 30: u8 = 1, ReadWrite, limits(1, 100);
    PositionCorrection @ 31: values::PositionCorrection = 0, ReadWrite, limits(-2047, 2047);
    OperationMode @ 33: values::OperationMode = 0, ReadWrite;
    /// Output torque once overload protection kicks in, in percent of the maximum torque.
    ProtectiveTorque @ 34: u8 = 20, ReadWrite, limits(0, 254);
    /// How long the load may exceed [`OverloadTorque`] before protection kicks in, in units of
    /// 10ms.
    ProtectionTime @ 35: u8 = 200, ReadWrite, limits(0, 254);
    /// In percent of the maximum torque.
    OverloadTorque @ 36: u8 = 80, ReadWrite, limits(0, 254);
    /// Speed loop proportional coefficient, in constant speed mode.
    SpeedProportionalCoefficient @ 37: u8 = 10, ReadWrite, limits(0, 254);
    /// In units of 10ms.
    OvercurrentProtectionTime @ 38: u8 = 200, ReadWrite, limits(0, 254);
    /// Speed loop integral coefficient, in constant speed mode.
    SpeedIntegralCoefficient @ 39: u8 = 10, ReadWrite, limits(0, 254);

    TorqueSwitch @ 40: values::TorqueSwitch = 0, ReadWrite;
    /// In units of 100 steps/s^2.
    Acceleration @ 41: u8 = 0, ReadWrite, limits(0, 254);
    /// Goal position in steps, in absolute position control mode.
    TargetLocation @ 42: i16 = 0, ReadWrite, limits(-32766, 32766);
    RunningTime @ 44: u16 = 0, ReadWrite, limits(0, 1000);
    /// In steps/s. 50 steps/s is 0.732 RPM.
    RunningSpeed @ 46: u16 = 0, ReadWrite, limits(0, 254);
    /// Output torque limit, in units of 0.1%. Initialised from [`MaximumTorque`].
    TorqueLimit @ 48: u16 = 1000, ReadWrite, limits(0, 1000);
    LockMark @ 55: values::EpromLock = 0, ReadWrite;
    /// In steps.
    CurrentLocation @ 56: i16 = 0, ReadOnly;
    /// In steps/s.
    CurrentSpeed @ 58: i16 = 0, ReadOnly;
    /// Duty cycle driving the motor, in units of 0.1%.
    CurrentLoad @ 60: i16 = 0, ReadOnly;
    /// In units of 0.1V.
    CurrentVoltage @ 62: u8 = 0, ReadOnly;
    /// In °C.
    CurrentTemperature @ 63: u8 = 0, ReadOnly;
    AsynchronousWriteFlag @ 64: bool = 0, ReadOnly;
    /// Protection conditions currently tripped.
    ServoStatus @ 65: ProtectionFlags = 0, ReadOnly;
    Moving @ 66: bool = 0, ReadOnly;
    /// In units of 6.5mA.
    CurrentCurrent @ 69: u16 = 0, ReadOnly;
}
