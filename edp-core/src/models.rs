mod generator;
mod load;
mod map;
mod program;

pub use generator::{Generator, GeneratorRecord};
pub use load::{Load, LoadRecord, TimeStep};
pub use map::Map;
pub use program::{Equality, QuadraticProgram};

use thiserror::Error;

// Records are keyed by their row position in the input, so a plain integer
// is all we need. The newtypes keep generator and load ids from mixing.
macro_rules! id_wrapper {
    ($struct:ident) => {
        #[doc = concat!("A row-position identifier for a ", stringify!($struct))]
        #[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
        #[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        #[repr(transparent)]
        pub struct $struct(usize);

        impl From<usize> for $struct {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for usize {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_wrapper!(GeneratorId);
id_wrapper!(LoadId);

/// The ways in which a generator or load record can be malformed.
///
/// Records are rejected as a whole; nothing attempts a partial correction.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A numeric field was NaN
    #[error("{field} is NaN")]
    NaN {
        /// The offending field
        field: &'static str,
    },
    /// A numeric field was infinite
    #[error("{field} is infinite")]
    Infinite {
        /// The offending field
        field: &'static str,
    },
    /// A capacity (generation or demand) was negative
    #[error("capacity must be non-negative, got {0}")]
    NegativeCapacity(f64),
    /// The quadratic cost coefficient was negative, making the cost non-convex
    #[error("quadratic cost coefficient c2 must be non-negative, got {0}")]
    NegativeQuadratic(f64),
}

/// Checks that a numeric field is a finite real number
pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_nan() {
        Err(ValidationError::NaN { field })
    } else if value.is_infinite() {
        Err(ValidationError::Infinite { field })
    } else {
        Ok(value)
    }
}
