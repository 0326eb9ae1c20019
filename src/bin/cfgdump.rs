//! Muestra el contenido de una tabla de inicialización ya generada.

use anyhow::{self, bail, Context};
use cfgtable::{decode, options::ByteOrder};
use clap::{crate_version, Arg, Command};
use hexconv::freehex;

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader},
    str::FromStr,
};

use tracing::{warn, Level};

fn main() -> anyhow::Result<()> {
    let args = Command::new("cfgdump")
        .version(crate_version!())
        .about("Decodes a register initialization table")
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("TABLE")
                .help("Table in hex text form ('-' for stdin)"),
        )
        .arg(
            Arg::new("byte-order")
                .short('e')
                .long("byte-order")
                .takes_value(true)
                .value_name("ORDER")
                .default_value("little")
                .possible_values(["little", "big"])
                .ignore_case(true)
                .help("Byte order of encoded addresses"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .help("Print the resulting memory image instead of the records"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .takes_value(true)
                .value_name("LEVEL")
                .default_value("WARN")
                .help("One of TRACE, DEBUG, INFO, WARN or ERROR"),
        )
        .get_matches();

    let level = args.value_of("log-level").unwrap_or("WARN");
    let level = Level::from_str(level).with_context(|| format!("Bad log level: {}", level))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let byte_order = args.value_of("byte-order").unwrap_or("little");
    let byte_order = match ByteOrder::from_str(byte_order) {
        Ok(byte_order) => byte_order,
        Err(()) => bail!("Bad byte order: {}", byte_order),
    };

    let table = match args.value_of("input").context("Missing table file")? {
        "-" => freehex::read(io::stdin().lock()).context("Failed to read stdin")?,
        path => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open for reading: {}", path))?;

            freehex::read(BufReader::new(file))
                .with_context(|| format!("Failed to read table: {}", path))?
        }
    };

    let records = decode::decode(&table, byte_order).context("Malformed table")?;

    if !args.is_present("image") {
        for record in &records {
            println!("{}", record);
        }

        return Ok(());
    }

    // La fuente de una copia puede residir fuera de la tabla
    let mut image = BTreeMap::new();
    for address in decode::apply(&records, &mut image) {
        warn!("copy source {:#010x} is not written by the table", address);
    }

    for (address, value) in image {
        println!("{:#010x}: {:02x}", address, value);
    }

    Ok(())
}
