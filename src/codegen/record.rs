//! Codificación de registros individuales.
//!
//! Las cuentas se codifican con un sesgo de uno: una cuenta `n` se
//! escribe como `n - 1`, de manera que el byte bajo cubre de 1 a 256.
//! Los llenados constantes llevan el byte alto de la cuenta sesgada al
//! inicio de su carga útil.

use std::{
    io::{self, Write},
    ops::RangeInclusive,
};

use super::EmitError;
use crate::{
    ir::{ConfigItem, RecordType, ARRAY_LIMIT, COPY_LIMIT, FILL_LIMIT, GROUP_LIMIT},
    options::ByteOrder,
    source::{Located, Location},
};

/// Escritor de registros sobre un flujo de texto.
pub struct Encoder<'a, W> {
    output: &'a mut W,
    byte_order: ByteOrder,
}

impl<'a, W: Write> Encoder<'a, W> {
    pub fn new(output: &'a mut W, byte_order: ByteOrder) -> Self {
        Encoder { output, byte_order }
    }

    /// Emite un ítem completo. Cada registro lleva su propio encabezado.
    pub fn item(&mut self, item: &Located<ConfigItem>) -> Result<(), EmitError> {
        let location = item.location();

        match item.val() {
            ConfigItem::Label { name, address } => {
                writeln!(self.output, "# @{} {:#010x}", name, address)?;
            }

            ConfigItem::ConstantFill {
                address,
                value,
                count,
            } => {
                let count = biased(*count, 1..=FILL_LIMIT - 1, "constant fill count", location)?;
                self.header(RecordType::ConstantFill, count, *address)?;
                writeln!(self.output, " {:02x} {:02x}", count >> 8, value)?;
            }

            ConfigItem::DataArray { address, bytes } => {
                let length = bytes.len() as u32;
                let count = biased(length, 1..=ARRAY_LIMIT - 1, "data array length", location)?;
                self.header(RecordType::DataArray, count, *address)?;

                for byte in bytes {
                    write!(self.output, " {:02x}", byte)?;
                }

                writeln!(self.output)?;
            }

            ConfigItem::AddressCopy {
                address,
                source,
                count,
            } => {
                let count = biased(*count, 1..=COPY_LIMIT - 1, "address copy count", location)?;
                self.header(RecordType::AddressCopy, count, *address)?;

                write!(self.output, " ")?;
                self.address(*source)?;
                writeln!(self.output)?;
            }

            ConfigItem::OffsetValue { base, entries } => {
                let length = entries.len() as u32;
                let count = biased(length, 2..=GROUP_LIMIT as u32, "offset group length", location)?;

                if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 >= pair[1].0) {
                    return Err(EmitError::Invariant {
                        location: location.clone(),
                        reason: format!(
                            "offset {:#04x} does not follow {:#04x}",
                            pair[1].0, pair[0].0
                        ),
                    });
                }

                self.header(RecordType::OffsetValue, count, *base)?;
                writeln!(self.output)?;

                for (offset, value) in entries {
                    writeln!(self.output, "  {:02x} {:02x}", offset, value)?;
                }
            }
        }

        Ok(())
    }

    /// Emite el marcador de fin de tabla.
    pub fn end(self) -> io::Result<()> {
        writeln!(self.output, "{:02x} {:02x}", RecordType::End as u8, 0)
    }

    /// `tt cc aaaaaaaa`, sin espacio final.
    fn header(&mut self, tag: RecordType, count: u32, address: u32) -> io::Result<()> {
        write!(self.output, "{:02x} {:02x} ", tag as u8, count & 0xff)?;
        self.address(address)
    }

    /// Bytes de una dirección en orden de memoria.
    fn address(&mut self, address: u32) -> io::Result<()> {
        for byte in self.byte_order.bytes(address) {
            write!(self.output, "{:02x}", byte)?;
        }

        Ok(())
    }
}

/// Verifica una cuenta y retorna su forma sesgada.
fn biased(
    count: u32,
    range: RangeInclusive<u32>,
    what: &str,
    location: &Location,
) -> Result<u32, EmitError> {
    if range.contains(&count) {
        Ok(count - 1)
    } else {
        Err(EmitError::Invariant {
            location: location.clone(),
            reason: format!(
                "{} {} outside of {}..={}",
                what,
                count,
                range.start(),
                range.end()
            ),
        })
    }
}
