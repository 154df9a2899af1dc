use super::{GeneratorId, ValidationError, finite};

/// The cost and capacity description of a single generator.
///
/// The cost of producing a quantity `q` is `c2·q² + c1·q + c0`. Only the
/// variable part (`c2`, `c1`) enters the dispatch objective; `c0` is a fixed
/// offset that does not depend on the dispatch and is reported alongside it.
///
/// A generator is constructed once and never mutated by a solve. Dispatch
/// results live in [`DispatchOutcome`](crate::DispatchOutcome).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Generator {
    /// The unique identifier (the row position in the input)
    pub id: GeneratorId,
    /// The market zone, normalized to uppercase
    pub market_zone: String,
    /// The upper bound on production at every time step
    pub capacity: f64,
    /// The quadratic cost coefficient (c2 ≥ 0)
    pub c2: f64,
    /// The linear cost coefficient
    pub c1: f64,
    /// The constant (start-up) cost coefficient
    pub c0: f64,
}

impl Generator {
    /// Creates a new generator, validating the capacity and cost coefficients.
    ///
    /// The market zone is normalized to uppercase.
    pub fn new(
        id: GeneratorId,
        market_zone: impl AsRef<str>,
        capacity: f64,
        c2: f64,
        c1: f64,
        c0: f64,
    ) -> Result<Self, ValidationError> {
        let generator = Self {
            id,
            market_zone: market_zone.as_ref().to_uppercase(),
            capacity,
            c2,
            c1,
            c0,
        };
        generator.validate()?;
        Ok(generator)
    }

    /// Creates a generator from an input row, using the row position as its id.
    pub fn from_record(id: GeneratorId, record: GeneratorRecord) -> Result<Self, ValidationError> {
        let GeneratorRecord {
            market_zone,
            capacity,
            c2,
            c1,
            c0,
        } = record;
        Self::new(id, market_zone, capacity, c2, c1, c0)
    }

    /// Checks the record invariants: finite fields, `capacity ≥ 0` and `c2 ≥ 0`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let capacity = finite("capacity", self.capacity)?;
        let c2 = finite("c2", self.c2)?;
        finite("c1", self.c1)?;
        finite("c0", self.c0)?;

        if capacity < 0.0 {
            Err(ValidationError::NegativeCapacity(capacity))
        } else if c2 < 0.0 {
            Err(ValidationError::NegativeQuadratic(c2))
        } else {
            Ok(())
        }
    }

    /// The derivative of the cost at `quantity`: `2·c2·q + c1`
    pub fn marginal_cost(&self, quantity: f64) -> f64 {
        2.0 * self.c2 * quantity + self.c1
    }

    /// The dispatch-dependent cost at `quantity`: `c2·q² + c1·q`
    pub fn variable_cost(&self, quantity: f64) -> f64 {
        (self.c2 * quantity + self.c1) * quantity
    }

    /// The full cost at `quantity`, including the fixed offset `c0`
    pub fn cost(&self, quantity: f64) -> f64 {
        self.variable_cost(quantity) + self.c0
    }
}

impl std::fmt::Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Generator[{},{}]", self.id, self.capacity)
    }
}

/// One generator row as supplied by a data loader.
///
/// The field names follow the tabular source (`MarketZone`, `Capacity`,
/// `c2`, `c1`, `c0`). A row carries no id; the loader assigns its position.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorRecord {
    /// The market zone the generator bids into
    #[cfg_attr(feature = "serde", serde(rename = "MarketZone"))]
    pub market_zone: String,
    /// The maximum production
    #[cfg_attr(feature = "serde", serde(rename = "Capacity"))]
    pub capacity: f64,
    /// The quadratic cost coefficient
    pub c2: f64,
    /// The linear cost coefficient
    pub c1: f64,
    /// The constant cost coefficient
    #[cfg_attr(feature = "serde", serde(default))]
    pub c0: f64,
}
