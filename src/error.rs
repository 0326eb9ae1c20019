//! Reporte de errores.
//!
//! Los errores de las fases delanteras se anclan a una línea del
//! programa fuente mediante [`Located`]. [`Diagnostics`] los reúne y
//! los presenta junto con el texto original de cada línea.

use crate::{
    codegen::EmitError,
    source::{Located, Location},
};

use std::{
    error::Error,
    fmt::{self, Debug, Display},
};

use thiserror::Error;

mod sealed {
    pub trait Sealed {}
}

pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn location(&self) -> &Location;
}

/// Falla de una compilación completa.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Diagnostics(Diagnostics),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl From<Diagnostics> for CompileError {
    fn from(diagnostics: Diagnostics) -> Self {
        CompileError::Diagnostics(diagnostics)
    }
}

pub struct Diagnostics {
    kind: &'static str,
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            errors: Default::default(),
        }
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { kind, errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error.source())?;

            let location = error.location();
            writeln!(fmt, " --> {}", location)?;

            let digits = location.line().to_string().len();
            writeln!(fmt, "{:digits$} |", "", digits = digits)?;

            let text = location.text();
            writeln!(fmt, "{} | {}", location.line(), text)?;

            // Se subraya la línea sin sus espacios periféricos
            let code = text.trim();
            if !code.is_empty() {
                let skip = text.len() - text.trim_start().len();
                writeln!(
                    fmt,
                    "{:digits$} | {:skip$}{:^<highlight$}",
                    "",
                    "",
                    "",
                    digits = digits,
                    skip = skip,
                    highlight = code.chars().count()
                )?;
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

impl Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, fmt)
    }
}

impl<E: Error> sealed::Sealed for Located<E> {}

impl<E: Error> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn location(&self) -> &Location {
        Located::location(self)
    }
}
