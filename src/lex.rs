//! Análisis léxico por línea.
//!
//! # Forma de una línea
//! El lenguaje es orientado a líneas y no requiere backtracking. Cada
//! línea se reconoce, en orden de prioridad, como:
//! - `#include "archivo"`
//! - `#define NOMBRE VALOR`
//! - `#label NOMBRE [@DIRECCIÓN]`
//! - una directiva de datos `DIRECCIÓN : VALOR [* CUENTA]`, o bien
//!   `DIRECCIÓN : [FUENTE] [* CUENTA]` para copias.
//!
//! # Comentarios y espacios
//! Fuera de las tres directivas con `#`, todo lo que sigue a un `#` es
//! comentario. Las directivas de datos no son sensibles a espacios en
//! blanco: estos se eliminan por completo antes de reconocerlas. Como
//! consecuencia, una directiva `#` desconocida (p. ej. `#pragma once`)
//! es simplemente un comentario.
//!
//! # Tokens
//! Un token es una secuencia de caracteres de palabra (`[A-Za-z0-9_]`),
//! opcionalmente precedida por `-`. Este módulo no interpreta tokens;
//! eso corresponde a [`crate::symbols`].

use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// La línea no tiene ninguna de las formas reconocidas.
    #[error("Expected `ADDR : VALUE [* COUNT]` or `ADDR : [SRC_ADDR] [* COUNT]`")]
    Syntax,

    /// `#include` sin un nombre de archivo entre comillas.
    #[error("Expected a quoted file name after `#include`")]
    BadInclude,

    /// `#label` sin un nombre válido.
    #[error("Expected a label name after `#label`")]
    BadLabel,
}

/// Una línea reconocida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `#include "archivo"`
    Include(&'a str),

    /// `#define NOMBRE VALOR`
    Define { name: &'a str, value: &'a str },

    /// `#label NOMBRE [@DIRECCIÓN]`
    Label {
        name: &'a str,
        address: Option<&'a str>,
    },

    /// `DIRECCIÓN : VALOR [* CUENTA]`
    Data(Data),

    /// Línea vacía o de solo comentarios.
    Blank,
}

/// Partes de una directiva de datos, aún sin resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub address: String,
    pub operand: Operand,
    pub count: Option<String>,
}

/// Lado derecho de una directiva de datos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Valor literal o macro.
    Value(String),

    /// `[FUENTE]`: dirección de origen de una copia.
    Source(String),
}

/// Reconoce una línea.
pub fn scan(line: &str) -> Result<Directive<'_>, LexerError> {
    let trimmed = line.trim_start();

    if let Some(rest) = keyword(trimmed, "#include") {
        return include(rest);
    }

    if let Some((name, value)) = define(trimmed) {
        return Ok(Directive::Define { name, value });
    }

    if let Some(rest) = keyword(trimmed, "#label") {
        return label(rest);
    }

    data(line)
}

/// Reconoce una línea `#define NOMBRE VALOR`.
///
/// Las macros con parámetros y las definiciones sin valor no se
/// consideran definiciones.
pub fn define(line: &str) -> Option<(&str, &str)> {
    let rest = keyword(line.trim_start(), "#define")?;
    let (name, rest) = word(rest)?;

    let value = rest.trim_start();
    if value.len() == rest.len() {
        return None;
    }

    let (value, _) = token(value)?;
    Some((name, value))
}

fn include(rest: &str) -> Result<Directive<'_>, LexerError> {
    let quoted = rest.strip_prefix('"').ok_or(LexerError::BadInclude)?;
    match quoted.split_once('"') {
        Some((name, _)) if !name.is_empty() => Ok(Directive::Include(name)),
        _ => Err(LexerError::BadInclude),
    }
}

fn label(rest: &str) -> Result<Directive<'_>, LexerError> {
    let (name, rest) = word(rest).ok_or(LexerError::BadLabel)?;

    let rest = rest.trim_start();
    let rest = rest.strip_prefix('@').unwrap_or(rest);
    let address = strip_comment(rest).trim();

    Ok(Directive::Label {
        name,
        address: (!address.is_empty()).then(|| address),
    })
}

fn data(line: &str) -> Result<Directive<'_>, LexerError> {
    let compact: String = strip_comment(line)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if compact.is_empty() {
        return Ok(Directive::Blank);
    }

    let (address, rest) = token(&compact).ok_or(LexerError::Syntax)?;
    let rest = rest.strip_prefix(':').ok_or(LexerError::Syntax)?;

    let (operand, rest) = match rest.strip_prefix('[') {
        Some(inner) => {
            let (source, rest) = word(inner).ok_or(LexerError::Syntax)?;
            let rest = rest.strip_prefix(']').ok_or(LexerError::Syntax)?;
            (Operand::Source(source.to_owned()), rest)
        }

        None => {
            let (value, rest) = token(rest).ok_or(LexerError::Syntax)?;
            (Operand::Value(value.to_owned()), rest)
        }
    };

    let count = match rest.strip_prefix('*') {
        None if rest.is_empty() => None,
        None => return Err(LexerError::Syntax),

        Some(rest) => match token(rest) {
            Some((count, "")) => Some(count.to_owned()),
            _ => return Err(LexerError::Syntax),
        },
    };

    Ok(Directive::Data(Data {
        address: address.to_owned(),
        operand,
        count,
    }))
}

/// Reconoce `keyword` como palabra completa. `#labels` no es `#label`,
/// pero `#label` al final de la línea sí lo es.
fn keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.starts_with(is_word_char) {
        None
    } else {
        Some(rest.trim_start())
    }
}

/// Separa una palabra no vacía del resto del texto.
fn word(text: &str) -> Option<(&str, &str)> {
    let end = text.find(|c| !is_word_char(c)).unwrap_or(text.len());
    (end > 0).then(|| text.split_at(end))
}

/// Separa un token (palabra con `-` opcional) del resto del texto.
fn token(text: &str) -> Option<(&str, &str)> {
    let sign = usize::from(text.starts_with('-'));
    let (word, _) = word(&text[sign..])?;

    Some(text.split_at(sign + word.len()))
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code)
}

/// Determina si un carácter puede pertenecer a una palabra.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod test {
    use super::*;

    fn data(address: &str, operand: Operand, count: Option<&str>) -> Directive<'static> {
        Directive::Data(Data {
            address: address.into(),
            operand,
            count: count.map(String::from),
        })
    }

    #[test]
    fn directives() {
        assert_eq!(
            scan("#include \"regs.h\"  // registers"),
            Ok(Directive::Include("regs.h"))
        );

        assert_eq!(
            scan("  #define   CLK_DIV  0x04u"),
            Ok(Directive::Define {
                name: "CLK_DIV",
                value: "0x04u"
            })
        );

        assert_eq!(
            scan("#label boot @ 0x20000000 # start of SRAM"),
            Ok(Directive::Label {
                name: "boot",
                address: Some("0x20000000")
            })
        );

        assert_eq!(
            scan("#label boot"),
            Ok(Directive::Label {
                name: "boot",
                address: None
            })
        );
    }

    #[test]
    fn data_lines() {
        assert_eq!(
            scan("0x1000 : 0x05"),
            Ok(data("0x1000", Operand::Value("0x05".into()), None))
        );

        assert_eq!(
            scan("\tREG_A : VAL * 3   # fill"),
            Ok(data("REG_A", Operand::Value("VAL".into()), Some("3")))
        );

        assert_eq!(
            scan("0x2000:[ 0x3000 ]*16"),
            Ok(data("0x2000", Operand::Source("0x3000".into()), Some("16")))
        );

        assert_eq!(
            scan("0x10 : -1"),
            Ok(data("0x10", Operand::Value("-1".into()), None))
        );
    }

    #[test]
    fn blank_and_comments() {
        assert_eq!(scan(""), Ok(Directive::Blank));
        assert_eq!(scan("   \t "), Ok(Directive::Blank));
        assert_eq!(scan("# just a comment"), Ok(Directive::Blank));
        assert_eq!(scan("#pragma once"), Ok(Directive::Blank));
        assert_eq!(scan("#define ONLY_A_GUARD"), Ok(Directive::Blank));
    }

    #[test]
    fn syntax_errors() {
        for line in [
            "0x1000 = 5",
            "0x1000 :",
            ": 5",
            "0x1000 : 5 * ",
            "0x1000 : [0x10",
            "0x1000 : [] ",
            "0x1000 : 5 * 2 * 3",
            "0x1000 : (5)",
        ] {
            assert_eq!(scan(line), Err(LexerError::Syntax), "{:?}", line);
        }

        assert_eq!(scan("#include regs.h"), Err(LexerError::BadInclude));
        assert_eq!(scan("#include \"\""), Err(LexerError::BadInclude));
        assert_eq!(scan("#label @0x10"), Err(LexerError::BadLabel));
    }

    #[test]
    fn label_without_name() {
        assert_eq!(scan("#label"), Err(LexerError::BadLabel));
        assert_eq!(scan("  #label   "), Err(LexerError::BadLabel));
        assert_eq!(scan("#label # note"), Err(LexerError::BadLabel));
        assert_eq!(scan("#include"), Err(LexerError::BadInclude));

        assert_eq!(scan("#labels are comments"), Ok(Directive::Blank));
    }
}
