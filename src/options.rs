//! Opciones de compilación.
//!
//! Todo el comportamiento configurable del compilador se describe
//! mediante un único valor [`Options`] que recibe [`crate::compile`].

use std::{path::PathBuf, str::FromStr};

use bitflags::bitflags;
use unicase::Ascii;

bitflags! {
    /// Opciones a aplicar durante la emisión de la tabla.
    pub struct EmitOptions: u32 {
        /// Emitir en orden de código fuente, sin optimización.
        ///
        /// Útil cuando el firmware depende del orden de escritura de
        /// ciertos registros, a costa de una tabla más grande.
        const PRESERVE_ORDER = 0x01;

        /// Registrar el listado de ítems antes de emitir.
        const DUMP = 0x02;
    }
}

/// Orden de bytes de las direcciones codificadas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Descompone una dirección en bytes, en orden de memoria.
    pub fn bytes(self, address: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => address.to_le_bytes(),
            ByteOrder::Big => address.to_be_bytes(),
        }
    }

    /// Reconstruye una dirección a partir de bytes en orden de memoria.
    pub fn read(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::Little
    }
}

impl FromStr for ByteOrder {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let string = Ascii::new(string);
        if string == Ascii::new("little") {
            Ok(ByteOrder::Little)
        } else if string == Ascii::new("big") {
            Ok(ByteOrder::Big)
        } else {
            Err(())
        }
    }
}

/// Configuración completa de una compilación.
#[derive(Clone, Debug)]
pub struct Options {
    pub flags: EmitOptions,
    pub byte_order: ByteOrder,

    /// Directorios adicionales de búsqueda para `#include`.
    pub include_dirs: Vec<PathBuf>,

    /// Macros predefinidas, en orden; la última definición prevalece.
    pub defines: Vec<(String, String)>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            flags: EmitOptions::empty(),
            byte_order: ByteOrder::default(),
            include_dirs: Vec::new(),
            defines: Vec::new(),
        }
    }
}
