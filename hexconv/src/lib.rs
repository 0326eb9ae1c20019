//! Conversión de texto hexadecimal libre.
//!
//! Las tablas de inicialización se generan como texto hexadecimal
//! legible. Para programarlas en un dispositivo se requiere alguno
//! de los formatos de [`Format`]. La entrada se interpreta en
//! [`freehex`]; la salida Intel HEX se construye en [`ihex`].
//! [`hexbytes`] cubre el caso más simple de una conversión línea por
//! línea directamente a binario.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
    str::FromStr,
};

use unicase::Ascii;

pub mod freehex;
pub mod hexbytes;
pub mod ihex;

/// Formato de salida.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// Dígitos hexadecimales en mayúscula, sin separadores.
    Hex,

    /// Registros Intel HEX.
    IntelHex,

    /// Bytes crudos.
    Binary,
}

impl Format {
    pub const NAMES: [&'static str; 3] = ["hex", "intelhex", "binary"];

    /// Determina si la salida contiene bytes no imprimibles.
    pub fn is_binary(self) -> bool {
        matches!(self, Format::Binary)
    }

    /// Escribe `data` en este formato.
    ///
    /// `line_length` solo afecta a [`Format::IntelHex`].
    pub fn write<W: Write>(self, data: &[u8], line_length: usize, output: &mut W) -> io::Result<()> {
        match self {
            Format::Hex => freehex::write(data, output),
            Format::IntelHex => ihex::write(data, line_length, output),
            Format::Binary => output.write_all(data),
        }
    }
}

impl FromStr for Format {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let string = Ascii::new(string);
        let formats = [Format::Hex, Format::IntelHex, Format::Binary];

        Self::NAMES
            .iter()
            .zip(formats)
            .find(|(name, _)| Ascii::new(**name) == string)
            .map(|(_, format)| format)
            .ok_or(())
    }
}

/// Escribe `data` como contenido completo de `path`.
///
/// Si la escritura falla, el archivo se elimina.
pub fn write_file<P: AsRef<Path>>(path: P, data: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;

    if let Err(error) = file.write_all(data).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);

        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!("hex".parse(), Ok(Format::Hex));
        assert_eq!("IntelHex".parse(), Ok(Format::IntelHex));
        assert_eq!("BINARY".parse(), Ok(Format::Binary));
        assert_eq!("srec".parse::<Format>(), Err(()));
    }

    #[test]
    fn binary_is_verbatim() {
        let mut output = Vec::new();
        Format::Binary.write(&[0, 0xff, 0x10], 32, &mut output).unwrap();
        assert_eq!(output, [0, 0xff, 0x10]);
    }

    #[test]
    fn write_file_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");

        fs::write(&path, b"stale contents").unwrap();
        write_file(&path, &[1, 2, 3]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), [1, 2, 3]);

        let missing = dir.path().join("absent").join("table.bin");
        assert!(write_file(&missing, &[1]).is_err());
        assert!(!missing.exists());
    }
}
