//! Hexadecimal de formato libre.
//!
//! Cada línea contiene pares de dígitos hexadecimales, opcionalmente
//! separados por espacios en blanco. Todo lo que sigue a un `#` es
//! comentario, lo cual incluye las etiquetas `# @NOMBRE` que emite el
//! compilador de tablas.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::debug;

/// Error de lectura de texto hexadecimal.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FreeHexError {
    #[error("Failed to parse input line {line}: {text}")]
    BadLine { line: usize, text: String },

    #[error("I/O error")]
    Io(#[from] io::Error),
}

/// Lee un flujo completo.
pub fn read<R: BufRead>(reader: R) -> Result<Vec<u8>, FreeHexError> {
    let mut data = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let code = line.split_once('#').map_or(line.as_str(), |(code, _)| code);

        decode_line(code, &mut data).ok_or_else(|| FreeHexError::BadLine {
            line: index + 1,
            text: line.trim().to_owned(),
        })?;
    }

    debug!(bytes = data.len(), "read free-form hex");
    Ok(data)
}

/// Interpreta texto en memoria.
pub fn parse(text: &str) -> Result<Vec<u8>, FreeHexError> {
    read(text.as_bytes())
}

/// Escribe dígitos en mayúscula, sin separadores ni salto de línea final.
pub fn write<W: Write>(data: &[u8], output: &mut W) -> io::Result<()> {
    for byte in data {
        write!(output, "{:02X}", byte)?;
    }

    Ok(())
}

/// Agrega los bytes de una línea a `data`.
///
/// Los espacios en blanco solo se admiten entre pares completos. En
/// caso de error, `data` queda sin cambios.
pub(crate) fn decode_line(line: &str, data: &mut Vec<u8>) -> Option<()> {
    let start = data.len();
    for chunk in line.split_whitespace() {
        if chunk.len() % 2 != 0 {
            data.truncate(start);
            return None;
        }

        for pair in chunk.as_bytes().chunks(2) {
            match (nibble(pair[0]), nibble(pair[1])) {
                (Some(high), Some(low)) => data.push(high << 4 | low),
                _ => {
                    data.truncate(start);
                    return None;
                }
            }
        }
    }

    Some(())
}

fn nibble(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|value| value as u8)
}
