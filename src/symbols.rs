//! Tabla de símbolos y resolución de valores.
//!
//! Las macros se almacenan como texto crudo, sin evaluar. Un token
//! se resuelve sustituyéndolo repetidamente mientras sea el nombre
//! de una macro conocida y luego interpretando el texto final como
//! un literal entero al estilo de C.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, trace};

use crate::lex;

/// Máximo de sustituciones encadenadas antes de declarar un ciclo.
pub const MAX_SUBSTITUTIONS: usize = 64;

/// Entero resuelto. Es suficientemente ancho para detectar valores
/// negativos y direcciones fuera de rango sin desbordarse.
pub type Int = i128;

/// Un token no pudo reducirse a un entero.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Cannot resolve `{token}` to an integer (substituted text: `{text}`)")]
    NotANumber { token: String, text: String },

    #[error(
        "Macro chain for `{token}` exceeds {} substitutions (stopped at `{text}`)",
        MAX_SUBSTITUTIONS
    )]
    TooDeep { token: String, text: String },
}

/// Falla al interpretar un literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LiteralError {
    /// El texto no es un literal entero.
    Invalid,

    /// El literal es válido pero excede el rango de [`Int`].
    Overflow,
}

/// Macros definidas por `#define`, incluidas o predefinidas.
#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Define o redefine una macro. La última definición prevalece.
    pub fn define<N, V>(&mut self, name: N, value: V) -> Option<String>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        let previous = self.symbols.insert(name.clone(), value.clone());
        if let Some(previous) = &previous {
            debug!(%name, %previous, %value, "macro redefined");
        }

        previous
    }

    /// Obtiene el texto crudo de una macro.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.symbols.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Extrae las líneas `#define` de un archivo de definiciones.
    ///
    /// Cualquier otra línea se ignora, lo cual permite incluir
    /// encabezados de C ordinarios. Retorna la cantidad de macros
    /// encontradas.
    pub fn read_definitions(&mut self, text: &str) -> usize {
        let mut count = 0;
        for line in text.lines() {
            if let Some((name, value)) = lex::define(line) {
                self.define(name, value);
                count += 1;
            }
        }

        count
    }

    /// Sigue la cadena de macros a partir de `token` y retorna el
    /// texto final, que ya no es el nombre de ninguna macro.
    pub fn substitute<'a>(&'a self, token: &'a str) -> Result<&'a str, ResolutionError> {
        let mut text = token;
        let mut depth = 0;

        while let Some(value) = self.symbols.get(text) {
            if depth == MAX_SUBSTITUTIONS {
                return Err(ResolutionError::TooDeep {
                    token: token.to_owned(),
                    text: text.to_owned(),
                });
            }

            trace!("Converting {} to {}", text, value);
            text = value;
            depth += 1;
        }

        Ok(text)
    }

    /// Resuelve un token a un entero.
    pub fn resolve(&self, token: &str) -> Result<Int, ResolutionError> {
        let text = self.substitute(token)?;
        parse_literal(text).map_err(|_| ResolutionError::NotANumber {
            token: token.to_owned(),
            text: text.to_owned(),
        })
    }
}

/// Descarta un sufijo `u` de literal sin signo.
pub fn strip_suffix(text: &str) -> &str {
    text.strip_suffix(|c: char| c == 'u' || c == 'U')
        .unwrap_or(text)
}

/// Interpreta un literal entero con prefijos de base convencionales.
///
/// Se reconocen `0x` (hexadecimal), `0o` o un cero inicial (octal),
/// `0b` (binario) y decimal en cualquier otro caso. Se admite un signo
/// `-` inicial para que los valores negativos lleguen a las
/// verificaciones de rango en vez de fallar como texto inválido.
pub fn parse_literal(text: &str) -> Result<Int, LiteralError> {
    let literal = strip_suffix(text);
    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };

    let (radix, digits) = split_radix(unsigned);

    // `from_str_radix()` aceptaría un `+` propio
    if !digits.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(LiteralError::Invalid);
    }

    let magnitude = u128::from_str_radix(digits, radix).map_err(|error| {
        use std::num::IntErrorKind;

        match error.kind() {
            IntErrorKind::PosOverflow => LiteralError::Overflow,
            _ => LiteralError::Invalid,
        }
    })?;

    let magnitude = Int::try_from(magnitude).map_err(|_| LiteralError::Overflow)?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn split_radix(text: &str) -> (u32, &str) {
    match text.as_bytes() {
        [b'0', b'x' | b'X', ..] => (16, &text[2..]),
        [b'0', b'o' | b'O', ..] => (8, &text[2..]),
        [b'0', b'b' | b'B', ..] => (2, &text[2..]),
        [b'0', _, ..] => (8, &text[1..]),
        _ => (10, text),
    }
}
