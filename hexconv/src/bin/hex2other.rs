//! Convierte hexadecimal libre a otros formatos.

use anyhow::{self, bail, Context};
use clap::{crate_version, Arg, Command};
use hexconv::{freehex, ihex, Format};

use std::{
    fs::File,
    io::{self, BufReader, IsTerminal, Write},
    str::FromStr,
};

use tracing::{info, Level};

fn main() -> anyhow::Result<()> {
    let args = Command::new("hex2other")
        .version(crate_version!())
        .about("Converts free-form ASCII hex to other formats")
        .arg(
            Arg::new("format")
                .short('f')
                .takes_value(true)
                .required(true)
                .value_name("FORMAT")
                .possible_values(Format::NAMES)
                .ignore_case(true)
                .help("Output format"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .takes_value(true)
                .value_name("FILE")
                .help("Input file (default: stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .takes_value(true)
                .value_name("FILE")
                .default_value("-")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("line-length")
                .long("line-length")
                .takes_value(true)
                .value_name("BYTES")
                .default_value("32")
                .possible_values(["16", "32"])
                .help("Data bytes per Intel HEX record"),
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

    let format = args.value_of("format").context("Missing output format")?;
    let format = match Format::from_str(format) {
        Ok(format) => format,
        Err(()) => bail!("Output format must be one of: {}", Format::NAMES.join(",")),
    };

    let line_length = match args.value_of("line-length") {
        Some(length) => length.parse().context("Bad line length")?,
        None => ihex::DEFAULT_LINE_LENGTH,
    };

    let data = match args.value_of("input") {
        None | Some("-") => freehex::read(io::stdin().lock()).context("Failed to read stdin")?,
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open for reading: {}", path))?;

            freehex::read(BufReader::new(file))
                .with_context(|| format!("Failed to read input file: {}", path))?
        }
    };

    let output = args.value_of("output").unwrap_or("-");
    if format.is_binary() && output == "-" && io::stdout().is_terminal() {
        bail!("Refusing to write binary output to a terminal");
    }

    let mut converted = Vec::new();
    format
        .write(&data, line_length, &mut converted)
        .context("Conversion failed")?;

    match output {
        "-" => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();

            stdout
                .write_all(&converted)
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }

        path => hexconv::write_file(path, &converted)
            .with_context(|| format!("Failed to write to file: {}", path))?,
    }

    info!(bytes = data.len(), "converted to {:?}", format);
    Ok(())
}
