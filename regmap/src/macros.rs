/// Declares a device's registers: one zero-sized type per register implementing
/// [`Register`](crate::Register), plus an ordered [`RegisterMap`](crate::RegisterMap) static
/// listing them all.
///
/// ```
/// regmap::register_map! {
///     pub static REGISTERS;
///
///     /// Firmware version
///     FirmwareVersion @ 0: u8 = 3, ReadOnly;
///     /// Goal position in steps
///     TargetLocation @ 42: i16 = 0, ReadWrite, limits(-32766, 32766);
/// }
///
/// assert_eq!(REGISTERS.len(), 2);
/// ```
///
/// Each entry is `Name @ address: ValueType = initial_value, Access` with an optional
/// `limits(min, max)`. The payload type and semantic come from the value type, so the
/// register's width always matches its codec.
#[macro_export]
macro_rules! register_map {
    (@limits $min:expr, $max:expr) => {
        ::core::option::Option::Some(($min, $max))
    };
    (@limits) => {
        ::core::option::Option::None
    };
    (
        $(#[$map_meta:meta])*
        $map_vis:vis static $map:ident;

        $(
            $(#[$meta:meta])*
            $name:ident @ $address:literal : $value:ty = $initial:expr, $access:ident
                $(, limits($min:expr, $max:expr))? ;
        )+
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
            pub struct $name;

            impl $crate::Register for $name {
                type Value = $value;

                const DESCRIPTOR: $crate::Descriptor = $crate::Descriptor {
                    name: stringify!($name),
                    address: $address,
                    payload_type: <$value as $crate::RegisterValue>::PAYLOAD_TYPE,
                    semantic: <$value as $crate::RegisterValue>::SEMANTIC,
                    access: $crate::Access::$access,
                    limits: $crate::register_map!(@limits $($min, $max)?),
                    initial_value: $initial,
                };
            }
        )+

        $(#[$map_meta])*
        $map_vis static $map: $crate::RegisterMap = $crate::RegisterMap::new(&[
            $(<$name as $crate::Register>::DESCRIPTOR),+
        ]);
    };
}

/// Declares a C-like enum stored in a register, with its
/// [`RegisterValue`](crate::RegisterValue) impl.
///
/// Values not listed are rejected both when decoding and when encoding.
#[macro_export]
macro_rules! register_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $payload:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant = $value,
            )+
        }

        impl $crate::RegisterValue for $name {
            const PAYLOAD_TYPE: $crate::PayloadType = $crate::PayloadType::$payload;
            const SEMANTIC: $crate::Semantic = $crate::Semantic::Enum(&[$($value),+]);

            fn from_raw(raw: i32) -> ::core::result::Result<Self, $crate::DecodeError> {
                match raw {
                    $($value => ::core::result::Result::Ok(Self::$variant),)+
                    _ => ::core::result::Result::Err($crate::DecodeError::InvalidEnumValue(raw)),
                }
            }

            fn to_raw(&self) -> i32 {
                *self as i32
            }
        }
    };
}
