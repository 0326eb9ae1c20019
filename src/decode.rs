//! Lectura de tablas binarias.
//!
//! Recorre una tabla ya convertida a bytes de la misma forma en que lo
//! hace el firmware: tipo, cuenta, dirección y carga útil, hasta
//! encontrar un registro de tipo 0. Sirve para inspeccionar tablas y
//! para verificar que ambos órdenes de emisión producen la misma
//! imagen de memoria.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    ir::{ConfigItem, RecordType},
    options::ByteOrder,
};

/// Error de lectura de una tabla.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Table ends unexpectedly at byte {0}")]
    Truncated(usize),

    #[error("Unknown record type {tag:#04x} at byte {offset}")]
    UnknownType { tag: u8, offset: usize },
}

/// Decodifica todos los registros anteriores al marcador de fin.
///
/// Los registros se retornan como [`ConfigItem`]; una tabla nunca
/// contiene etiquetas.
pub fn decode(table: &[u8], byte_order: ByteOrder) -> Result<Vec<ConfigItem>, DecodeError> {
    let mut reader = Reader {
        table,
        position: 0,
        byte_order,
    };

    let mut records = Vec::new();
    loop {
        let offset = reader.position;
        let tag = reader.byte()?;
        let low = reader.byte()?;

        let tag = RecordType::from_tag(tag).ok_or(DecodeError::UnknownType { tag, offset })?;
        let address = match tag {
            RecordType::End => break,
            _ => reader.address()?,
        };

        let count = u32::from(low) + 1;

        let record = match tag {
            RecordType::ConstantFill => {
                let high = reader.byte()?;
                let value = reader.byte()?;

                ConfigItem::ConstantFill {
                    address,
                    value,
                    count: (u32::from(high) << 8 | u32::from(low)) + 1,
                }
            }

            RecordType::OffsetValue => {
                let entries = (0..count)
                    .map(|_| Ok((reader.byte()?, reader.byte()?)))
                    .collect::<Result<Vec<_>, DecodeError>>()?;

                ConfigItem::OffsetValue {
                    base: address,
                    entries,
                }
            }

            RecordType::DataArray => ConfigItem::DataArray {
                address,
                bytes: reader.take(count as usize)?.to_vec(),
            },

            RecordType::AddressCopy => ConfigItem::AddressCopy {
                address,
                source: reader.address()?,
                count,
            },

            RecordType::End => break,
        };

        records.push(record);
    }

    Ok(records)
}

/// Aplica registros sobre una imagen dispersa de memoria.
///
/// Las copias leen de la imagen misma. Un byte cuyo origen ningún
/// registro anterior escribió no se copia; su dirección de origen se
/// agrega al resultado y el resto de la tabla se aplica igualmente.
pub fn apply(records: &[ConfigItem], image: &mut BTreeMap<u32, u8>) -> Vec<u32> {
    let mut unmapped = Vec::new();
    for record in records {
        match record {
            ConfigItem::Label { .. } => (),

            ConfigItem::ConstantFill {
                address,
                value,
                count,
            } => {
                for i in 0..*count {
                    image.insert(address.wrapping_add(i), *value);
                }
            }

            ConfigItem::DataArray { address, bytes } => {
                for (i, byte) in bytes.iter().enumerate() {
                    image.insert(address.wrapping_add(i as u32), *byte);
                }
            }

            ConfigItem::OffsetValue { base, entries } => {
                for (offset, value) in entries {
                    image.insert(base.wrapping_add(u32::from(*offset)), *value);
                }
            }

            ConfigItem::AddressCopy {
                address,
                source,
                count,
            } => {
                for i in 0..*count {
                    let from = source.wrapping_add(i);
                    match image.get(&from).copied() {
                        Some(value) => {
                            image.insert(address.wrapping_add(i), value);
                        }

                        None => unmapped.push(from),
                    }
                }
            }
        }
    }

    unmapped
}

struct Reader<'a> {
    table: &'a [u8],
    position: usize,
    byte_order: ByteOrder,
}

impl<'a> Reader<'a> {
    fn take(&mut self, length: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self
            .table
            .get(self.position..self.position + length)
            .ok_or(DecodeError::Truncated(self.table.len()))?;

        self.position += length;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn address(&mut self) -> Result<u32, DecodeError> {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(self.take(4)?);

        Ok(self.byte_order.read(bytes))
    }
}
