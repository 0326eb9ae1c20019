//! Agrupación de escrituras dispersas.
//!
//! Las escrituras de un solo byte cercanas entre sí en el espacio de
//! direcciones se reempaquetan en grupos desplazamiento/valor. Todos
//! los demás ítems se preservan intactos y en su orden relativo.
//!
//! # Algoritmo
//! 1. Se separan las escrituras de un byte en un mapa dirección → valor.
//!    Una misma dirección escrita dos veces es un error: no existe una
//!    forma determinista de fusionarlas.
//! 2. Se recorren las direcciones en orden ascendente. Un grupo comienza
//!    en su primera dirección y acepta las siguientes mientras su
//!    desplazamiento sea menor a 256 y el grupo tenga menos de
//!    [`GROUP_LIMIT`] entradas.
//! 3. Un grupo de una sola entrada vuelve a ser un arreglo de un byte;
//!    los demás se emiten como [`ConfigItem::OffsetValue`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    ir::{ConfigItem, RangeError, GROUP_LIMIT},
    source::{Located, Location},
};

/// Optimiza un listado de ítems.
///
/// El resultado consiste en los ítems no afectados seguidos por los
/// grupos producidos, en orden ascendente de dirección.
pub fn optimize(
    items: Vec<Located<ConfigItem>>,
) -> Result<Vec<Located<ConfigItem>>, Located<RangeError>> {
    let mut singles: BTreeMap<u32, (u8, Location)> = BTreeMap::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        let (location, item) = item.split();
        match item {
            ConfigItem::DataArray { address, bytes } if bytes.len() == 1 => {
                if let Some((_, first)) = singles.get(&address) {
                    let error = RangeError::DuplicateAddress {
                        address,
                        first: first.line(),
                    };

                    return Err(Located::at(error, location));
                }

                singles.insert(address, (bytes[0], location));
            }

            item => kept.push(Located::at(item, location)),
        }
    }

    let writes = singles.len();

    let mut groups: Vec<Group> = Vec::new();
    for (address, (value, location)) in singles {
        match groups.last_mut() {
            Some(group) if group.accepts(address) => group.push(address, value),
            _ => groups.push(Group::start(address, value, location)),
        }
    }

    debug!(writes, groups = groups.len(), "coalesced single-byte writes");

    kept.extend(groups.into_iter().map(Group::finish));
    Ok(kept)
}

/// Grupo abierto de escrituras.
struct Group {
    base: u32,
    entries: Vec<(u8, u8)>,
    location: Location,
}

impl Group {
    fn start(base: u32, value: u8, location: Location) -> Self {
        Group {
            base,
            entries: vec![(0, value)],
            location,
        }
    }

    fn accepts(&self, address: u32) -> bool {
        address - self.base < 256 && self.entries.len() < GROUP_LIMIT
    }

    fn push(&mut self, address: u32, value: u8) {
        self.entries.push(((address - self.base) as u8, value));
    }

    fn finish(self) -> Located<ConfigItem> {
        let item = if self.entries.len() == 1 {
            let (_, value) = self.entries[0];
            ConfigItem::DataArray {
                address: self.base,
                bytes: vec![value],
            }
        } else {
            ConfigItem::OffsetValue {
                base: self.base,
                entries: self.entries,
            }
        };

        Located::at(item, self.location)
    }
}
