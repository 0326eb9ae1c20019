//! Conversión directa de líneas hexadecimales a binario.
//!
//! A diferencia de [`crate::freehex`], aquí los comentarios solo se
//! admiten como líneas completas que inician con `#`.

use std::io::{BufRead, Write};

use crate::freehex::{self, FreeHexError};

/// Convierte cada línea no vacía y retorna la cantidad de bytes escritos.
pub fn convert<R, W>(input: R, output: &mut W) -> Result<usize, FreeHexError>
where
    R: BufRead,
    W: Write,
{
    let mut written = 0;
    let mut bytes = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        bytes.clear();
        freehex::decode_line(line, &mut bytes).ok_or_else(|| FreeHexError::BadLine {
            line: index + 1,
            text: line.to_owned(),
        })?;

        output.write_all(&bytes)?;
        written += bytes.len();
    }

    Ok(written)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn skips_comment_lines() {
        let input = "# @boot 0x20000000\n03 00 00900000 01\n\n  # indented\n00 00\n";
        let mut output = Vec::new();

        assert_eq!(convert(input.as_bytes(), &mut output).unwrap(), 9);
        assert_eq!(output, [0x03, 0x00, 0x00, 0x90, 0x00, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn trailing_comment_is_an_error() {
        let mut output = Vec::new();
        match convert("00 00 # end\n".as_bytes(), &mut output) {
            Err(FreeHexError::BadLine { line: 1, .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
