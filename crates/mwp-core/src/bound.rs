//! Bound reconstruction from a chosen scalar matrix
//!
//! Once a choice vector is applied, every output variable's column lists a
//! scalar per input variable. The bound collects those inputs by class:
//! `m` inputs appear inside a max, `w` inputs inside the max with a `°`
//! marker (honest polynomial dependence), and `p` inputs are added on top,
//! giving expressions of the shape `max(x, y°) + z`.

use crate::relation::ScalarRelation;
use crate::semiring::Scalar;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Symbolic bound of one output variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MwpBound {
    /// Inputs contributing with scalar `m`.
    pub maximum: Vec<String>,
    /// Inputs contributing with scalar `w`.
    pub weak: Vec<String>,
    /// Inputs contributing with scalar `p`.
    pub poly: Vec<String>,
}

impl MwpBound {
    /// Record one input's contribution; zero contributions are dropped.
    fn append(&mut self, scalar: Scalar, variable: &str) {
        match scalar {
            Scalar::Zero => {}
            Scalar::Unit => self.maximum.push(variable.to_string()),
            Scalar::Weak => self.weak.push(variable.to_string()),
            Scalar::Poly => self.poly.push(variable.to_string()),
            Scalar::Infty => {
                debug_assert!(false, "bounds are only built from ∞-free matrices")
            }
        }
    }

    /// Strongest dependency class appearing in this bound.
    pub fn mwp_class(&self) -> Scalar {
        if !self.poly.is_empty() {
            Scalar::Poly
        } else if !self.weak.is_empty() {
            Scalar::Weak
        } else if !self.maximum.is_empty() {
            Scalar::Unit
        } else {
            Scalar::Zero
        }
    }

    /// True when some input variable appears in the bound.
    pub fn mentions(&self, variable: &str) -> bool {
        let var = |v: &String| v == variable;
        self.maximum.iter().any(var) || self.weak.iter().any(var) || self.poly.iter().any(var)
    }
}

impl fmt::Display for MwpBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner: Vec<String> = self
            .maximum
            .iter()
            .cloned()
            .chain(self.weak.iter().map(|v| format!("{v}°")))
            .collect();
        let max_part = match inner.len() {
            0 => String::new(),
            1 => inner[0].clone(),
            _ => format!("max({})", inner.join(",")),
        };
        let add_part = self.poly.join("+");
        match (max_part.is_empty(), add_part.is_empty()) {
            (true, true) => write!(f, "0"),
            (false, true) => write!(f, "{max_part}"),
            (true, false) => write!(f, "{add_part}"),
            (false, false) => write!(f, "{max_part}+{add_part}"),
        }
    }
}

/// Bounds for every output variable of a function.
#[derive(Clone, Debug, Default)]
pub struct Bound {
    pub bound_dict: BTreeMap<String, MwpBound>,
}

impl Bound {
    /// Read the per-variable bounds off a scalar matrix.
    pub fn calculate(relation: &ScalarRelation) -> Bound {
        let mut bound_dict = BTreeMap::new();
        for (j, output) in relation.variables.iter().enumerate() {
            let mut bound = MwpBound::default();
            for (i, input) in relation.variables.iter().enumerate() {
                bound.append(relation.matrix[i][j], input);
            }
            bound_dict.insert(output.clone(), bound);
        }
        Bound { bound_dict }
    }

    pub fn get(&self, variable: &str) -> Option<&MwpBound> {
        self.bound_dict.get(variable)
    }

    pub fn is_empty(&self) -> bool {
        self.bound_dict.is_empty()
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .bound_dict
            .iter()
            .map(|(var, bound)| format!("{var}' ≤ {bound}"))
            .collect();
        write!(f, "{}", parts.join(" ∧ "))
    }
}

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.bound_dict.len()))?;
        for (var, bound) in &self.bound_dict {
            map.serialize_entry(var, &bound.to_string())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::Scalar::*;

    fn relation() -> ScalarRelation {
        // axis [x, y, z]; column z depends on x (m), y (p); column y on x (w)
        ScalarRelation {
            variables: vec!["x".into(), "y".into(), "z".into()],
            matrix: vec![
                vec![Unit, Weak, Unit],
                vec![Zero, Zero, Poly],
                vec![Zero, Zero, Zero],
            ],
        }
    }

    #[test]
    fn test_calculate_collects_columns() {
        let bound = Bound::calculate(&relation());
        let z = bound.get("z").expect("z is bounded");
        assert_eq!(z.maximum, vec!["x".to_string()]);
        assert_eq!(z.poly, vec!["y".to_string()]);
        assert_eq!(z.mwp_class(), Poly);

        let y = bound.get("y").expect("y is bounded");
        assert_eq!(y.weak, vec!["x".to_string()]);
        assert_eq!(y.mwp_class(), Weak);
    }

    #[test]
    fn test_bound_rendering() {
        let bound = Bound::calculate(&relation());
        assert_eq!(bound.get("z").map(|b| b.to_string()), Some("x+y".into()));
        assert_eq!(bound.get("y").map(|b| b.to_string()), Some("x°".into()));
        assert_eq!(bound.get("x").map(|b| b.to_string()), Some("x".into()));
    }

    #[test]
    fn test_empty_column_is_zero_bound() {
        let rel = ScalarRelation {
            variables: vec!["x".into()],
            matrix: vec![vec![Zero]],
        };
        let bound = Bound::calculate(&rel);
        assert_eq!(bound.get("x").map(|b| b.to_string()), Some("0".into()));
        assert_eq!(bound.get("x").map(|b| b.mwp_class()), Some(Zero));
    }
}
