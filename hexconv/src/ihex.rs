//! Salida Intel HEX.
//!
//! Los datos se ubican a partir de la dirección 0. Cada registro de
//! datos lleva una dirección de 16 bits; al cruzar un límite de 64 KiB
//! se emite un registro de dirección lineal extendida (tipo 04) con
//! los 16 bits superiores.

use std::io::{self, Write};

/// Longitud predeterminada de un registro de datos, en bytes.
pub const DEFAULT_LINE_LENGTH: usize = 32;

const DATA: u8 = 0x00;
const END_OF_FILE: u8 = 0x01;
const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;

/// Escribe `data` como registros Intel HEX, terminando con `:00000001FF`.
///
/// Ningún registro de datos cruza un límite de 64 KiB, independientemente
/// de `line_length`.
pub fn write<W: Write>(data: &[u8], line_length: usize, output: &mut W) -> io::Result<()> {
    let line_length = line_length.clamp(1, 255);

    let mut offset = 0;
    let mut upper = 0;

    while offset < data.len() {
        let segment = (offset >> 16) as u16;
        if segment != upper {
            record(output, EXTENDED_LINEAR_ADDRESS, 0, &segment.to_be_bytes())?;
            upper = segment;
        }

        let boundary = 0x10000 - (offset & 0xffff);
        let length = line_length.min(boundary).min(data.len() - offset);

        record(output, DATA, offset as u16, &data[offset..offset + length])?;
        offset += length;
    }

    record(output, END_OF_FILE, 0, &[])
}

/// `:LLAAAATT[DD...]CC`, con `CC` el complemento a dos de la suma de
/// todos los bytes anteriores.
fn record<W: Write>(output: &mut W, kind: u8, address: u16, data: &[u8]) -> io::Result<()> {
    let [high, low] = address.to_be_bytes();
    let header = [data.len() as u8, high, low, kind];

    let sum = header
        .iter()
        .chain(data)
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte));

    write!(output, ":")?;
    for byte in header.iter().chain(data) {
        write!(output, "{:02X}", byte)?;
    }

    writeln!(output, "{:02X}", sum.wrapping_neg())
}
