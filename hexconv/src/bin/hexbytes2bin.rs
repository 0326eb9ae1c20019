//! Convierte líneas de pares hexadecimales a un archivo binario.

use anyhow::{self, bail, Context};
use clap::{crate_version, Arg, Command};
use hexconv::hexbytes;

use std::{
    fs::File,
    io::{self, BufRead, BufReader, IsTerminal, Write},
    str::FromStr,
};

use tracing::{info, Level};

fn main() -> anyhow::Result<()> {
    let args = Command::new("hexbytes2bin")
        .version(crate_version!())
        .about("Converts lines of hex byte pairs to a binary file")
        .arg(
            Arg::new("input")
                .value_name("INFILE")
                .default_value("-")
                .help("Input file ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTFILE")
                .default_value("-")
                .help("Output file ('-' for stdout, unless it is a terminal)"),
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

    let input = args.value_of("input").unwrap_or("-");
    let output = args.value_of("output").unwrap_or("-");

    let reader: Box<dyn BufRead> = match input {
        "-" => Box::new(io::stdin().lock()),
        path => File::open(path)
            .map(|file| Box::new(BufReader::new(file)) as Box<dyn BufRead>)
            .with_context(|| format!("Failed to open for reading: {}", path))?,
    };

    if output == "-" && io::stdout().is_terminal() {
        bail!("Refusing to write binary output to a terminal");
    }

    // Un error de conversión no debe dejar un archivo a medias
    let mut data = Vec::new();
    let written = hexbytes::convert(reader, &mut data)
        .with_context(|| format!("Failed to convert {}", input))?;

    match output {
        "-" => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&data)
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }

        path => hexconv::write_file(path, &data)
            .with_context(|| format!("Failed to write to {}", path))?,
    }

    info!(bytes = written, "wrote {}", output);
    Ok(())
}
