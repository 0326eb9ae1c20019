//! Rastreo de ubicaciones originales en código fuente.
//!
//! El lenguaje de definición es orientado a líneas, por lo cual
//! una ubicación es simplemente un origen y un número de línea.
//! Cada ítem que el compilador construye lleva cuenta de la línea
//! que lo originó, de manera que cualquier error posterior (incluso
//! durante optimización o emisión) pueda señalar el texto original.

use std::{
    fmt::{self, Debug, Display, Formatter},
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    rc::Rc,
};

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Una ubicación está conformada por un origen y una línea.
#[derive(Clone)]
pub struct Location {
    from: Rc<Source>,
    line: u32,
}

impl Location {
    /// Obtiene el número de línea, comenzando en 1.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el texto original de la línea, sin el salto de línea.
    pub fn text(&self) -> &str {
        self.from.line(self.line).unwrap_or("")
    }

    /// Obtiene el origen.
    pub fn source(&self) -> &Rc<Source> {
        &self.from
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.from.name, self.line)
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Nombre de origen y sus líneas.
pub struct Source {
    name: String,
    path: Option<PathBuf>,
    lines: Vec<String>,
}

impl Source {
    /// Lee un archivo. Su directorio se vuelve la primera ruta de
    /// búsqueda para `#include`.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Rc<Source>> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let lines = file.lines().collect::<io::Result<Vec<_>>>()?;

        Ok(Rc::new(Source {
            name: path.display().to_string(),
            path: Some(path.to_path_buf()),
            lines,
        }))
    }

    /// Construye a partir de texto en memoria.
    pub fn from_text<S: Into<String>>(text: &str, name: S) -> Rc<Source> {
        Rc::new(Source {
            name: name.into(),
            path: None,
            lines: text.lines().map(String::from).collect(),
        })
    }

    /// Nombre con el cual se reportan errores.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directorio que contiene al archivo, si proviene de uno.
    pub fn directory(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Obtiene una línea por número, comenzando en 1.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }

    /// Itera sobre las ubicaciones de todas las líneas, en orden.
    pub fn locations(this: &Rc<Self>) -> impl Iterator<Item = Location> {
        let from = Rc::clone(this);
        let count = from.lines.len() as u32;

        (1..=count).map(move |line| Location {
            from: Rc::clone(&from),
            line,
        })
    }
}
