//! Emisión de la tabla de inicialización.
//!
//! La tabla se compone de registros `tt cc aaaaaaaa` seguidos por su
//! carga útil y termina con `00 00`. Las etiquetas no son registros,
//! sino comentarios. La codificación de cada registro corresponde a
//! [`record`]; este módulo decide el orden en que se emiten.

use std::io::{self, Write};

use thiserror::Error;

use crate::{
    ir::ConfigItem,
    options::ByteOrder,
    source::{Located, Location},
};

mod record;

use record::Encoder;

/// Error de emisión.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("I/O error")]
    Io(#[from] io::Error),

    /// Un ítem viola los límites de su tipo de registro. Esto indica
    /// un defecto en una fase anterior.
    #[error("Internal error at {location}: {reason}")]
    Invariant { location: Location, reason: String },
}

/// Orden de emisión.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Order {
    /// Cada ítem en el orden en que aparece en el listado.
    Source,

    /// Agrupado por tipo, en un orden fijo. Dentro de cada tipo los
    /// ítems se ordenan por dirección y luego por contenido, de manera
    /// que el resultado no depende del orden del código fuente.
    Kind,
}

/// Clase de un ítem para propósitos de ordenamiento. El orden de las
/// variantes es el orden de emisión.
#[derive(Copy, Clone)]
enum Bucket {
    Label,
    ConstantFill,
    AddressCopy,
    DataArray,
    OffsetValue,
    SingleByte,
}

const BUCKETS: usize = Bucket::SingleByte as usize + 1;

impl Bucket {
    fn of(item: &ConfigItem) -> Self {
        match item {
            ConfigItem::Label { .. } => Bucket::Label,
            ConfigItem::ConstantFill { .. } => Bucket::ConstantFill,
            ConfigItem::AddressCopy { .. } => Bucket::AddressCopy,
            ConfigItem::OffsetValue { .. } => Bucket::OffsetValue,
            item if item.is_single_byte() => Bucket::SingleByte,
            ConfigItem::DataArray { .. } => Bucket::DataArray,
        }
    }
}

/// Emite una tabla completa, incluyendo su marcador de fin.
pub fn emit<W: Write>(
    items: &[Located<ConfigItem>],
    order: Order,
    byte_order: ByteOrder,
    output: &mut W,
) -> Result<(), EmitError> {
    let mut encoder = Encoder::new(output, byte_order);

    match order {
        Order::Source => {
            for item in items {
                encoder.item(item)?;
            }
        }

        Order::Kind => {
            for item in partition(items).iter().flatten() {
                encoder.item(item)?;
            }
        }
    }

    encoder.end()?;
    Ok(())
}

/// Distribuye los ítems en sus clases con una sola pasada.
fn partition(items: &[Located<ConfigItem>]) -> [Vec<&Located<ConfigItem>>; BUCKETS] {
    let mut buckets: [Vec<&Located<ConfigItem>>; BUCKETS] = Default::default();
    for item in items {
        buckets[Bucket::of(item.val()) as usize].push(item);
    }

    for bucket in &mut buckets {
        bucket.sort_by(|a, b| {
            let (a, b) = (a.val(), b.val());
            a.address().cmp(&b.address()).then_with(|| a.cmp(b))
        });
    }

    buckets
}
