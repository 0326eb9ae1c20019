//! Análisis sintáctico y clasificación de directivas.
//!
//! El parser recorre el programa fuente una sola vez, línea por línea.
//! Las directivas `#include` y `#define` alimentan la tabla de símbolos;
//! `#label` y las directivas de datos producen ítems. Cada directiva de
//! datos se clasifica en un tipo de registro a partir de la magnitud de
//! su valor, la presencia de corchetes y su cuenta de repetición.
//!
//! El primer error aborta el análisis; nunca se retorna un listado
//! parcial de ítems.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    ir::{ConfigItem, RangeError, ARRAY_LIMIT, COPY_LIMIT, FILL_LIMIT},
    lex::{self, Data, Directive, LexerError, Operand},
    source::{Located, Location, Source},
    symbols::{self, Int, LiteralError, ResolutionError, SymbolTable},
};

/// Error de análisis sintáctico.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error(transparent)]
    Syntax(#[from] LexerError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("Failed to read include file `{0}`: {1}")]
    Include(String, #[source] io::Error),
}

impl ParserError {
    /// Categoría del error, para diagnósticos.
    pub fn kind(&self) -> &'static str {
        match self {
            ParserError::Syntax(_) => "syntax error",
            ParserError::Resolution(_) => "resolution error",
            ParserError::Range(_) => "range error",
            ParserError::Include(..) => "I/O error",
        }
    }
}

/// Proveedor de archivos para `#include`.
pub trait Includes {
    /// Obtiene el contenido del archivo `name`, incluido desde `from`.
    fn load(&mut self, name: &str, from: &Source) -> io::Result<String>;
}

/// Búsqueda de includes en el sistema de archivos.
///
/// Se intenta primero el directorio del archivo que incluye, luego
/// cada directorio adicional en orden y finalmente el directorio
/// de trabajo.
#[derive(Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        SearchPath { dirs }
    }
}

impl Includes for SearchPath {
    fn load(&mut self, name: &str, from: &Source) -> io::Result<String> {
        let candidates = from
            .directory()
            .into_iter()
            .chain(self.dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(name));

        for path in candidates {
            if path.is_file() {
                debug!(path = %path.display(), "include found");
                return fs::read_to_string(path);
            }
        }

        fs::read_to_string(Path::new(name))
    }
}

/// Includes en memoria, indexados por nombre.
impl Includes for HashMap<String, String> {
    fn load(&mut self, name: &str, _from: &Source) -> io::Result<String> {
        self.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such include: {}", name))
        })
    }
}

/// Analiza un programa fuente completo con una tabla de símbolos vacía.
pub fn parse<I: Includes>(
    source: &Rc<Source>,
    includes: &mut I,
) -> Result<Vec<Located<ConfigItem>>, Located<ParserError>> {
    Parser::new(SymbolTable::new(), includes).parse(source)
}

/// Estado del análisis: tabla de símbolos e ítems acumulados.
pub struct Parser<'i, I: Includes> {
    symbols: SymbolTable,
    includes: &'i mut I,
    items: Vec<Located<ConfigItem>>,
}

impl<'i, I: Includes> Parser<'i, I> {
    /// Crea un parser a partir de una tabla de símbolos posiblemente
    /// precargada.
    pub fn new(symbols: SymbolTable, includes: &'i mut I) -> Self {
        Parser {
            symbols,
            includes,
            items: Vec::new(),
        }
    }

    /// Consume el programa fuente y retorna sus ítems en orden.
    pub fn parse(
        mut self,
        source: &Rc<Source>,
    ) -> Result<Vec<Located<ConfigItem>>, Located<ParserError>> {
        for location in Source::locations(source) {
            self.line(&location)
                .map_err(|error| Located::at(error, location.clone()))?;
        }

        debug!(
            items = self.items.len(),
            symbols = self.symbols.len(),
            "parsed {}",
            source.name()
        );

        Ok(self.items)
    }

    fn line(&mut self, location: &Location) -> Result<(), ParserError> {
        match lex::scan(location.text())? {
            Directive::Include(name) => self.include(name, location.source()),

            Directive::Define { name, value } => {
                self.symbols.define(name, value);
                Ok(())
            }

            Directive::Label { name, address } => {
                let address = match address {
                    Some(address) => self.address(address, "label address")?,
                    None => 0,
                };

                self.push(
                    ConfigItem::Label {
                        name: name.to_owned(),
                        address,
                    },
                    location,
                );

                Ok(())
            }

            Directive::Data(data) => {
                let item = self.classify(&data)?;
                self.push(item, location);

                Ok(())
            }

            Directive::Blank => Ok(()),
        }
    }

    fn include(&mut self, name: &str, from: &Source) -> Result<(), ParserError> {
        let text = self
            .includes
            .load(name, from)
            .map_err(|error| ParserError::Include(name.to_owned(), error))?;

        let count = self.symbols.read_definitions(&text);
        debug!(include = name, definitions = count, "read definitions");

        Ok(())
    }

    fn push(&mut self, item: ConfigItem, location: &Location) {
        self.items.push(Located::at(item, location.clone()));
    }

    /// Decide el tipo de registro de una directiva de datos.
    fn classify(&self, data: &Data) -> Result<ConfigItem, ParserError> {
        let address = self.address(&data.address, "address")?;
        let count = match &data.count {
            Some(count) => Some(self.count(count)?),
            None => None,
        };

        let token = match &data.operand {
            Operand::Source(token) => {
                let source = self.address(token, "source address")?;
                let count = limit("address copy", count.unwrap_or(1), COPY_LIMIT)?;

                return Ok(ConfigItem::AddressCopy {
                    address,
                    source,
                    count,
                });
            }

            Operand::Value(token) => token,
        };

        let text = self.symbols.substitute(token)?;
        match symbols::parse_literal(text) {
            Ok(value) if value < 0 => Err(RangeError::Negative("value", value).into()),

            Ok(value) if value < 256 => {
                let value = value as u8;
                match count.unwrap_or(1) {
                    1 => Ok(ConfigItem::DataArray {
                        address,
                        bytes: vec![value],
                    }),

                    count => Ok(ConfigItem::ConstantFill {
                        address,
                        value,
                        count: limit("constant fill", count, FILL_LIMIT)?,
                    }),
                }
            }

            Ok(_) | Err(LiteralError::Overflow) => {
                if let Some(count) = count.filter(|&count| count != 1) {
                    return Err(RangeError::RepeatedArray(count).into());
                }

                let bytes = hex_bytes(token, text)?;
                Ok(ConfigItem::DataArray { address, bytes })
            }

            Err(LiteralError::Invalid) => Err(ResolutionError::NotANumber {
                token: token.clone(),
                text: text.to_owned(),
            }
            .into()),
        }
    }

    /// Resuelve una dirección de 32 bits.
    fn address(&self, token: &str, what: &'static str) -> Result<u32, ParserError> {
        let value = self.symbols.resolve(token)?;
        if value < 0 {
            return Err(RangeError::Negative(what, value).into());
        }

        u32::try_from(value).map_err(|_| RangeError::AddressTooWide(what, value).into())
    }

    /// Resuelve una cuenta, que debe ser positiva.
    fn count(&self, token: &str) -> Result<Int, ParserError> {
        match self.symbols.resolve(token)? {
            count if count <= 0 => Err(RangeError::NonPositiveCount(count).into()),
            count => Ok(count),
        }
    }
}

/// Verifica una cuenta contra la cota exclusiva de su tipo.
fn limit(kind: &'static str, count: Int, bound: u32) -> Result<u32, RangeError> {
    if count < Int::from(bound) {
        Ok(count as u32)
    } else {
        Err(RangeError::CountTooLarge {
            kind,
            count,
            limit: bound,
        })
    }
}

/// Toma los dígitos de un literal hexadecimal como secuencia de bytes.
fn hex_bytes(token: &str, text: &str) -> Result<Vec<u8>, ParserError> {
    let literal = symbols::strip_suffix(text);
    let digits = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
        .ok_or_else(|| RangeError::MissingHexPrefix(literal.to_owned()))?;

    if digits.len() % 2 != 0 {
        return Err(RangeError::OddHexDigits(literal.to_owned()).into());
    }

    let length = digits.len() / 2;
    if length >= ARRAY_LIMIT as usize {
        return Err(RangeError::TooManyBytes(length).into());
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| match pair {
            [high, low] if high.is_ascii_hexdigit() && low.is_ascii_hexdigit() => {
                Some(hex_value(*high) << 4 | hex_value(*low))
            }

            _ => None,
        })
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| {
            ResolutionError::NotANumber {
                token: token.to_owned(),
                text: text.to_owned(),
            }
            .into()
        })
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse_text(text: &str) -> Result<Vec<ConfigItem>, Located<ParserError>> {
        let source = Source::from_text(text, "test.cfg");
        let items = parse(&source, &mut HashMap::<String, String>::new())?;

        Ok(items.into_iter().map(Located::into_inner).collect())
    }

    fn single(text: &str) -> ConfigItem {
        let mut items = parse_text(text).expect("parse failed");
        assert_eq!(items.len(), 1);
        items.remove(0)
    }

    fn range_error(text: &str) -> RangeError {
        match parse_text(text).map_err(Located::into_inner) {
            Err(ParserError::Range(error)) => error,
            other => panic!("expected range error for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn classification() {
        assert_eq!(
            single("0x1000 : 5"),
            ConfigItem::DataArray {
                address: 0x1000,
                bytes: vec![5]
            }
        );

        assert_eq!(
            single("0x1000 : 5 * 3"),
            ConfigItem::ConstantFill {
                address: 0x1000,
                value: 5,
                count: 3
            }
        );

        assert_eq!(
            single("0x1000 : 0x1234"),
            ConfigItem::DataArray {
                address: 0x1000,
                bytes: vec![0x12, 0x34]
            }
        );

        assert_eq!(
            single("0x1000 : [0x2000]"),
            ConfigItem::AddressCopy {
                address: 0x1000,
                source: 0x2000,
                count: 1
            }
        );

        assert_eq!(
            single("0x1000 : [0x2000] * 255"),
            ConfigItem::AddressCopy {
                address: 0x1000,
                source: 0x2000,
                count: 255
            }
        );
    }

    #[test]
    fn leading_zeros_stay_single_byte() {
        assert_eq!(
            single("0x10 : 0x00ff"),
            ConfigItem::DataArray {
                address: 0x10,
                bytes: vec![0xff]
            }
        );
    }

    #[test]
    fn macro_indirection() {
        assert_eq!(
            single("#define A B\n#define B 0x10\n#define X 4\nX : A\n"),
            ConfigItem::DataArray {
                address: 4,
                bytes: vec![16]
            }
        );
    }

    #[test]
    fn wide_data_through_macro() {
        let key = format!("0x{}", "a5".repeat(40));
        let text = format!("#define KEY {}\n0x100 : KEY\n", key);

        assert_eq!(
            single(&text),
            ConfigItem::DataArray {
                address: 0x100,
                bytes: vec![0xa5; 40]
            }
        );
    }

    #[test]
    fn labels() {
        let items = parse_text("#define SRAM 0x20000000\n#label boot @SRAM\n#label tail\n").unwrap();
        assert_eq!(
            items,
            vec![
                ConfigItem::Label {
                    name: "boot".into(),
                    address: 0x2000_0000
                },
                ConfigItem::Label {
                    name: "tail".into(),
                    address: 0
                },
            ]
        );
    }

    #[test]
    fn includes() {
        let mut includes = HashMap::new();
        includes.insert(
            String::from("regs.h"),
            String::from("#define UART_CR 0x40011000\nvoid ignored(void);\n#define UART_EN 0x01\n"),
        );

        let source = Source::from_text("#include \"regs.h\"\nUART_CR : UART_EN\n", "main.cfg");
        let items = parse(&source, &mut includes).unwrap();

        assert_eq!(
            items[0].val(),
            &ConfigItem::DataArray {
                address: 0x4001_1000,
                bytes: vec![1]
            }
        );
        assert_eq!(items[0].location().line(), 2);
    }

    #[test]
    fn missing_include() {
        let error = parse_text("#include \"nope.h\"\n").unwrap_err();
        assert_eq!(error.location().line(), 1);
        assert!(matches!(error.val(), ParserError::Include(name, _) if name == "nope.h"));
    }

    #[test]
    fn range_enforcement() {
        assert_eq!(range_error("0x10 : -1"), RangeError::Negative("value", -1));
        assert_eq!(range_error("-4 : 1"), RangeError::Negative("address", -4));
        assert_eq!(range_error("0x10 : 1 * 0"), RangeError::NonPositiveCount(0));
        assert_eq!(range_error("0x10 : 1 * -2"), RangeError::NonPositiveCount(-2));

        assert_eq!(
            range_error("0x10 : 1 * 65536"),
            RangeError::CountTooLarge {
                kind: "constant fill",
                count: 65536,
                limit: FILL_LIMIT
            }
        );

        assert_eq!(
            range_error("0x10 : [0x20] * 256"),
            RangeError::CountTooLarge {
                kind: "address copy",
                count: 256,
                limit: COPY_LIMIT
            }
        );

        assert_eq!(
            range_error("0x10 : 4660"),
            RangeError::MissingHexPrefix("4660".into())
        );
        assert_eq!(
            range_error("0x10 : 0x123"),
            RangeError::OddHexDigits("0x123".into())
        );
        assert_eq!(
            range_error(&format!("0x10 : 0x{}", "01".repeat(256))),
            RangeError::TooManyBytes(256)
        );
        assert_eq!(range_error("0x10 : 0x1234 * 2"), RangeError::RepeatedArray(2));
        assert_eq!(
            range_error("0x100000000 : 1"),
            RangeError::AddressTooWide("address", 0x1_0000_0000)
        );
    }

    #[test]
    fn fill_limit_boundary() {
        assert_eq!(
            single("0x10 : 0xff * 65535"),
            ConfigItem::ConstantFill {
                address: 0x10,
                value: 0xff,
                count: 65535
            }
        );
    }

    #[test]
    fn errors_point_at_line() {
        let error = parse_text("0x10 : 1\n\n0x10 = 1\n0x20 : 2\n").unwrap_err();
        assert_eq!(error.location().line(), 3);
        assert_eq!(error.location().text(), "0x10 = 1");
        assert_eq!(error.val().kind(), "syntax error");

        let error = parse_text("0x10 : UNDEFINED\n").unwrap_err();
        assert_eq!(error.val().kind(), "resolution error");
    }

    mod search_path {
        use super::*;
        use std::path::Path;
        use tempfile::TempDir;

        fn write(dir: &Path, name: &str, text: &str) {
            fs::write(dir.join(name), text).expect("failed to write fixture");
        }

        /// Programa principal dentro de su propio directorio.
        fn main_file(text: &str) -> (TempDir, Rc<Source>) {
            let dir = tempfile::tempdir().expect("failed to create directory");
            write(dir.path(), "main.cfg", text);

            let source = Source::open(dir.path().join("main.cfg")).expect("failed to open");
            (dir, source)
        }

        #[test]
        fn including_directory_comes_first() {
            let (home, source) = main_file("#include \"regs.h\"\nVALUE : 1\n");
            let extra = tempfile::tempdir().unwrap();

            write(home.path(), "regs.h", "#define VALUE 0x10\n");
            write(extra.path(), "regs.h", "#define VALUE 0x20\n");

            let mut includes = SearchPath::new(vec![extra.path().to_path_buf()]);
            let items = parse(&source, &mut includes).unwrap();

            assert_eq!(items.len(), 1);
            assert_eq!(items[0].val().address(), 0x10);
        }

        #[test]
        fn extra_directories_in_order() {
            let (_home, source) = main_file("");
            let first = tempfile::tempdir().unwrap();
            let second = tempfile::tempdir().unwrap();

            write(first.path(), "a.h", "first");
            write(second.path(), "a.h", "second");
            write(second.path(), "b.h", "only second");

            let mut includes = SearchPath::new(vec![
                first.path().to_path_buf(),
                second.path().to_path_buf(),
            ]);

            assert_eq!(includes.load("a.h", &source).unwrap(), "first");
            assert_eq!(includes.load("b.h", &source).unwrap(), "only second");
        }

        #[test]
        fn working_directory_is_last() {
            // Las pruebas corren desde la raíz del paquete
            let source = Source::from_text("", "stdin");
            let manifest = SearchPath::default()
                .load("Cargo.toml", &source)
                .unwrap();

            assert!(manifest.contains("[package]"));
        }

        #[test]
        fn missing_include_is_not_found() {
            let (_home, source) = main_file("#include \"absent.h\"\n");
            let extra = tempfile::tempdir().unwrap();

            let mut includes = SearchPath::new(vec![extra.path().to_path_buf()]);
            let error = includes.load("absent.h", &source).unwrap_err();
            assert_eq!(error.kind(), io::ErrorKind::NotFound);

            let error = parse(&source, &mut includes).unwrap_err();
            match error.val() {
                ParserError::Include(name, error) => {
                    assert_eq!(name, "absent.h");
                    assert_eq!(error.kind(), io::ErrorKind::NotFound);
                }

                other => panic!("unexpected {:?}", other),
            }
        }
    }
}
