use super::{LoadId, ValidationError, finite};

/// A time step groups loads into one single-period balance constraint.
///
/// Loads supplied without a time step belong to `TimeStep::default()`, so a
/// problem where no load carries a time step has exactly one period.
#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[repr(transparent)]
pub struct TimeStep(i64);

impl From<i64> for TimeStep {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<TimeStep> for i64 {
    fn from(value: TimeStep) -> Self {
        value.0
    }
}

impl std::fmt::Display for TimeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A demand quantity tied to a time step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Load {
    /// The unique identifier (the row position in the input)
    pub id: LoadId,
    /// The period this demand must be served in
    pub time_step: TimeStep,
    /// The demand quantity (≥ 0)
    pub capacity: f64,
}

impl Load {
    /// Creates a new load, validating the demand quantity.
    pub fn new(id: LoadId, time_step: TimeStep, capacity: f64) -> Result<Self, ValidationError> {
        let load = Self {
            id,
            time_step,
            capacity,
        };
        load.validate()?;
        Ok(load)
    }

    /// Creates a load from an input row, using the row position as its id.
    pub fn from_record(id: LoadId, record: LoadRecord) -> Result<Self, ValidationError> {
        Self::new(id, record.time.unwrap_or_default(), record.capacity)
    }

    /// Checks the record invariants: a finite, non-negative demand.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let capacity = finite("capacity", self.capacity)?;
        if capacity < 0.0 {
            Err(ValidationError::NegativeCapacity(capacity))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Display for Load {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Load[{},{}]", self.id, self.capacity)
    }
}

/// One load row as supplied by a data loader (`Time`, `Capacity`).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadRecord {
    /// The time step; omitted in single-period inputs
    #[cfg_attr(
        feature = "serde",
        serde(rename = "Time", default, skip_serializing_if = "Option::is_none")
    )]
    pub time: Option<TimeStep>,
    /// The demand quantity
    #[cfg_attr(feature = "serde", serde(rename = "Capacity"))]
    pub capacity: f64,
}
