//! Non-fatal conditions reported alongside a successful result.

use std::fmt;

/// A condition the caller should know about that did not stop processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Too many distinct pixel ids in the spectrum telemetry; the default
    /// pixel assignment was used instead.
    PixelAssignmentFallback { distinct: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::PixelAssignmentFallback { distinct } => write!(
                f,
                "found {distinct} distinct pixel ids, using default pixel assignment"
            ),
        }
    }
}

/// A value together with the diagnostics raised while building it.
#[derive(Debug, Clone)]
pub struct Diagnosed<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Diagnosed<T> {
    /// Wraps a value with no diagnostics.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Returns true if no diagnostics were raised.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drops the diagnostics and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }
}
