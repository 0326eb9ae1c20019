//! Representación intermedia: ítems de configuración.
//!
//! Cada directiva de datos del programa fuente se reduce a exactamente
//! un [`ConfigItem`]. Cada variante lleva únicamente los campos que
//! tienen sentido para su tipo de registro, de manera que no existe un
//! campo "valor" cuyo significado dependa de una etiqueta de tipo.

use std::fmt::{self, Display};
use thiserror::Error;

/// Cota exclusiva para la cuenta de un llenado constante.
pub const FILL_LIMIT: u32 = 65536;

/// Cota exclusiva para la longitud de un arreglo de datos.
pub const ARRAY_LIMIT: u32 = 256;

/// Cota exclusiva para la cuenta de una copia entre direcciones.
pub const COPY_LIMIT: u32 = 256;

/// Máximo de entradas en un grupo desplazamiento/valor.
pub const GROUP_LIMIT: usize = 255;

/// Etiqueta de tipo de un registro en la tabla binaria.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordType {
    /// Marcador de fin de tabla.
    End = 0,
    ConstantFill = 1,
    OffsetValue = 2,
    DataArray = 3,
    AddressCopy = 4,
}

impl RecordType {
    /// Interpreta el primer byte de un registro.
    pub fn from_tag(tag: u8) -> Option<Self> {
        use RecordType::*;

        match tag {
            0 => Some(End),
            1 => Some(ConstantFill),
            2 => Some(OffsetValue),
            3 => Some(DataArray),
            4 => Some(AddressCopy),
            _ => None,
        }
    }
}

/// Un ítem de configuración.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigItem {
    /// Marcador de secuencia. Nunca se codifica como registro.
    Label { name: String, address: u32 },

    /// Repite `value` `count` veces a partir de `address`.
    ConstantFill { address: u32, value: u8, count: u32 },

    /// Secuencia literal de bytes. Un solo byte es la forma canónica
    /// de una escritura aislada.
    DataArray { address: u32, bytes: Vec<u8> },

    /// Copia `count` bytes desde `source` hacia `address`.
    AddressCopy { address: u32, source: u32, count: u32 },

    /// Escrituras dispersas relativas a `base`. Solo las produce el
    /// optimizador.
    OffsetValue { base: u32, entries: Vec<(u8, u8)> },
}

impl ConfigItem {
    /// Dirección destino, o dirección base en el caso de un grupo.
    pub fn address(&self) -> u32 {
        use ConfigItem::*;

        match self {
            Label { address, .. }
            | ConstantFill { address, .. }
            | DataArray { address, .. }
            | AddressCopy { address, .. } => *address,

            OffsetValue { base, .. } => *base,
        }
    }

    /// Tipo de registro con el cual se codifica este ítem, si alguno.
    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            ConfigItem::Label { .. } => None,
            ConfigItem::ConstantFill { .. } => Some(RecordType::ConstantFill),
            ConfigItem::DataArray { .. } => Some(RecordType::DataArray),
            ConfigItem::AddressCopy { .. } => Some(RecordType::AddressCopy),
            ConfigItem::OffsetValue { .. } => Some(RecordType::OffsetValue),
        }
    }

    /// Determina si se trata de una escritura de un solo byte, la cual
    /// puede agruparse con otras durante optimización.
    pub fn is_single_byte(&self) -> bool {
        matches!(self, ConfigItem::DataArray { bytes, .. } if bytes.len() == 1)
    }
}

impl Display for ConfigItem {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConfigItem::*;

        match self {
            Label { name, address } => write!(fmt, "label {} @ {:#010x}", name, address),

            ConstantFill {
                address,
                value,
                count,
            } => write!(fmt, "CF   {:#010x} = {:#04x} * {}", address, value, count),

            DataArray { address, bytes } => {
                write!(fmt, "DA   {:#010x} =", address)?;
                for byte in bytes {
                    write!(fmt, " {:02x}", byte)?;
                }

                Ok(())
            }

            AddressCopy {
                address,
                source,
                count,
            } => write!(fmt, "COPY {:#010x} = [{:#010x}] * {}", address, source, count),

            OffsetValue { base, entries } => {
                write!(fmt, "OV   {:#010x} =", base)?;
                for (offset, value) in entries {
                    write!(fmt, " +{}:{:02x}", offset, value)?;
                }

                Ok(())
            }
        }
    }
}

/// Un valor o una cuenta fuera del rango permitido.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Negative {0} not allowed: {1}")]
    Negative(&'static str, i128),

    #[error("The {0} {1:#x} does not fit in 32 bits")]
    AddressTooWide(&'static str, i128),

    #[error("Count must be positive, found {0}")]
    NonPositiveCount(i128),

    #[error("A {kind} count must be below {limit}, found {count}")]
    CountTooLarge {
        kind: &'static str,
        count: i128,
        limit: u32,
    },

    #[error("Multi-byte data `{0}` must be written in hex with a `0x` prefix")]
    MissingHexPrefix(String),

    #[error("Multi-byte data `{0}` has an odd number of hex digits")]
    OddHexDigits(String),

    #[error("A data array must be shorter than {} bytes, found {0}", ARRAY_LIMIT)]
    TooManyBytes(usize),

    #[error("Multi-byte data cannot be repeated (count {0})")]
    RepeatedArray(i128),

    #[error("Address {address:#010x} is written twice (first on line {first})")]
    DuplicateAddress { address: u32, first: u32 },
}
