//! Punto de entrada ("driver").
//!
//! Este módulo expone una CLI sobre [`cfgtable::compile`]. La tabla
//! se genera por completo en memoria antes de abrir el destino, de
//! manera que una compilación fallida nunca trunca un archivo previo.

use anyhow::{self, bail, Context};
use clap::{crate_version, Arg, ArgMatches, Command};
use cfgtable::{
    options::{ByteOrder, EmitOptions, Options},
    parse::SearchPath,
    source::Source,
};

use std::{
    io::{self, Write},
    path::PathBuf,
    process,
    str::FromStr,
};

use tracing::{info, Level};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("cfgtable")
        .version(crate_version!())
        .about("Compiles register initialization tables")
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Configuration source file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("-")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("preserve-order")
                .short('p')
                .long("preserve-order")
                .help("Emit in source order, without optimization"),
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
            Arg::new("include")
                .short('I')
                .long("include")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("DIR")
                .help("Additional include search directory"),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .long("define")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("NAME=VALUE")
                .help("Predefine a macro"),
        )
        .arg(
            Arg::new("dump")
                .short('d')
                .long("dump")
                .help("Log the item list before encoding"),
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

    let options = options(&args)?;
    let input = args.value_of("input").context("Missing input file")?;
    let output = args.value_of("output").unwrap_or("-");

    let source =
        Source::open(input).with_context(|| format!("Failed to read source file: {}", input))?;

    let mut includes = SearchPath::new(options.include_dirs.clone());
    let mut table = Vec::new();

    if let Err(error) = cfgtable::compile(&source, &mut includes, &options, &mut table) {
        eprint!("{}", error);
        process::exit(1);
    }

    match output {
        "-" => io::stdout()
            .write_all(&table)
            .context("Failed to write to stdout")?,

        path => write_table(path, &table)?,
    }

    info!(bytes = table.len(), "wrote table to {}", output);
    Ok(())
}

/// Traduce argumentos de CLI a opciones de compilación.
fn options(args: &ArgMatches) -> anyhow::Result<Options> {
    let mut flags = EmitOptions::empty();
    if args.is_present("preserve-order") {
        flags |= EmitOptions::PRESERVE_ORDER;
    }

    if args.is_present("dump") {
        flags |= EmitOptions::DUMP;
    }

    let byte_order = args.value_of("byte-order").unwrap_or("little");
    let byte_order = match ByteOrder::from_str(byte_order) {
        Ok(byte_order) => byte_order,
        Err(()) => bail!("Bad byte order: {}", byte_order),
    };

    let include_dirs = args
        .values_of("include")
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect();

    // `-D NAME` equivale a `-D NAME=1`, como en un compilador de C
    let defines = args
        .values_of("define")
        .into_iter()
        .flatten()
        .map(|define| match define.split_once('=') {
            Some((name, value)) => (name.to_owned(), value.to_owned()),
            None => (define.to_owned(), String::from("1")),
        })
        .collect();

    Ok(Options {
        flags,
        byte_order,
        include_dirs,
        defines,
    })
}

/// Escribe la tabla a un archivo, eliminándolo si la escritura falla.
fn write_table(path: &str, table: &[u8]) -> anyhow::Result<()> {
    hexconv::write_file(path, table)
        .with_context(|| format!("Failed to write table to file: {}", path))
}
