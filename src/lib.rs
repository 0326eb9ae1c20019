//! Compilador de tablas de inicialización de registros.
//!
//! Un programa de configuración describe escrituras a memoria que el
//! firmware de un microcontrolador aplica durante su arranque. Este
//! crate traduce ese programa a una tabla binaria compacta, expresada
//! como texto hexadecimal.
//!
//! # Front end
//! Cada tabla deriva de un único archivo de código fuente, que se
//! recorre línea por línea. El escaneo de cada línea ocurre en [`lex`]
//! y su interpretación en [`parse`], el cual mantiene una tabla de
//! macros ([`symbols`]) alimentada por `#define` e `#include`. Cada
//! directiva de datos se clasifica en un ítem de [`ir`].
//!
//! # Back end
//! Salvo que se solicite preservar el orden original, [`optimize`]
//! agrupa escrituras dispersas de un byte. Finalmente, [`codegen`]
//! dispone los ítems en un orden determinista y codifica cada uno
//! como un registro de la tabla. [`decode`] realiza el proceso
//! inverso, tal como lo haría el firmware.

use std::{io::Write, rc::Rc};

use tracing::info;

pub mod codegen;
pub mod decode;
pub mod error;
pub mod ir;
pub mod lex;
pub mod optimize;
pub mod options;
pub mod parse;
pub mod source;
pub mod symbols;

use crate::{
    codegen::Order,
    error::{CompileError, Diagnostics},
    ir::ConfigItem,
    options::{EmitOptions, Options},
    parse::{Includes, Parser},
    source::{Located, Source},
    symbols::SymbolTable,
};

/// Compila un programa fuente completo y escribe la tabla resultante.
///
/// Nada se escribe a `output` si alguna fase delantera falla.
pub fn compile<I, W>(
    source: &Rc<Source>,
    includes: &mut I,
    options: &Options,
    output: &mut W,
) -> Result<(), CompileError>
where
    I: Includes,
    W: Write,
{
    let mut symbols = SymbolTable::new();
    for (name, value) in &options.defines {
        symbols.define(name.as_str(), value.as_str());
    }

    let items = Parser::new(symbols, includes).parse(source).map_err(|error| {
        let kind = error.val().kind();
        Diagnostics::from(error).kind(kind)
    })?;

    let preserve = options.flags.contains(EmitOptions::PRESERVE_ORDER);
    let (items, order) = if preserve {
        (items, Order::Source)
    } else {
        let items = optimize::optimize(items)
            .map_err(|error| Diagnostics::from(error).kind("range error"))?;

        (items, Order::Kind)
    };

    if options.flags.contains(EmitOptions::DUMP) {
        dump(&items);
    }

    codegen::emit(&items, order, options.byte_order, output)?;
    Ok(())
}

fn dump(items: &[Located<ConfigItem>]) {
    for item in items {
        info!("{}: {}", item.location(), item.val());
    }
}
