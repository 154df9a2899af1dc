/// A separable convex quadratic program over non-negative variables.
///
/// ```text
/// minimize    Σᵢ quadratic[i]·xᵢ² + linear[i]·xᵢ
/// subject to  0 ≤ xᵢ ≤ upper[i]              for every variable i
///             Σ_{(i, a) ∈ row} a·xᵢ = rhs    for every equality row
/// ```
///
/// Note the objective carries no ½ factor: `quadratic[i]` is the coefficient
/// of `xᵢ²` itself. Libraries that expect `½xᵀPx` must use `P = 2·diag(quadratic)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadraticProgram {
    /// The coefficient of xᵢ² (≥ 0)
    pub quadratic: Vec<f64>,
    /// The coefficient of xᵢ
    pub linear: Vec<f64>,
    /// The upper bound of xᵢ (possibly +∞)
    pub upper: Vec<f64>,
    /// The equality rows, each of which has a dual value in a solution
    pub equalities: Vec<Equality>,
}

/// A single linear equality row.
#[derive(Clone, Debug, PartialEq)]
pub struct Equality {
    /// A label for the row, used by exporters and diagnostics
    pub name: String,
    /// The sparse (variable index, coefficient) terms, sorted by variable index
    pub terms: Vec<(usize, f64)>,
    /// The right-hand side
    pub rhs: f64,
}

impl QuadraticProgram {
    /// The number of decision variables
    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    /// Appends a variable and returns its index
    pub fn add_variable(&mut self, quadratic: f64, linear: f64, upper: f64) -> usize {
        self.quadratic.push(quadratic);
        self.linear.push(linear);
        self.upper.push(upper);
        self.linear.len() - 1
    }

    /// Appends an equality row and returns its index
    pub fn add_equality(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (usize, f64)>,
        rhs: f64,
    ) -> usize {
        let mut terms = terms.into_iter().collect::<Vec<_>>();
        terms.sort_unstable_by_key(|(idx, _)| *idx);
        self.equalities.push(Equality {
            name: name.into(),
            terms,
            rhs,
        });
        self.equalities.len() - 1
    }

    /// Evaluates the objective at `x`
    pub fn objective(&self, x: &[f64]) -> f64 {
        self.quadratic
            .iter()
            .zip(self.linear.iter())
            .zip(x.iter())
            .map(|((a, b), x)| (a * x + b) * x)
            .sum()
    }

    /// Transposes the equality rows into per-variable columns.
    ///
    /// Column `i` lists the (row, coefficient) pairs in which variable `i`
    /// appears, in ascending row order. Sparse-matrix solver interfaces
    /// consume their constraint matrix column by column, so this is the
    /// natural starting point for building one.
    pub fn equality_columns(&self) -> Vec<Vec<(usize, f64)>> {
        let mut columns = vec![Vec::new(); self.num_variables()];
        for (row, equality) in self.equalities.iter().enumerate() {
            for &(idx, coef) in equality.terms.iter() {
                if coef != 0.0 {
                    columns[idx].push((row, coef));
                }
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_follow_rows() {
        let mut program = QuadraticProgram::default();
        let x = program.add_variable(1.0, 0.0, 10.0);
        let y = program.add_variable(0.0, 2.0, f64::INFINITY);
        program.add_equality("a", [(y, 1.0), (x, 1.0)], 3.0);
        program.add_equality("b", [(y, -1.0), (x, 0.0)], 0.0);

        assert_eq!(program.equalities[0].terms, vec![(0, 1.0), (1, 1.0)]);
        assert_eq!(
            program.equality_columns(),
            vec![vec![(0, 1.0)], vec![(0, 1.0), (1, -1.0)]]
        );
        assert_eq!(program.objective(&[2.0, 1.0]), 4.0 + 2.0);
    }
}
