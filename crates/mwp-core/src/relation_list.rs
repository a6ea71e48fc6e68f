//! Non-deterministic bags of relations
//!
//! Each member represents one branch of the derivation. Matrix operations
//! lift pointwise across the bag; results are deduplicated by comparing
//! axes and matrices so equal branches merge.

use crate::delta_graph::DeltaGraph;
use crate::polynomial::Polynomial;
use crate::relation::Relation;
use std::fmt;

#[derive(Clone, Debug)]
pub struct RelationList {
    pub relations: Vec<Relation>,
}

impl RelationList {
    /// Bag holding the empty relation, the unit of composition.
    pub fn new() -> Self {
        RelationList { relations: vec![Relation::identity(&[])] }
    }

    /// Bag holding one identity relation over the given variables.
    pub fn identity(variables: &[String]) -> Self {
        RelationList { relations: vec![Relation::identity(variables)] }
    }

    pub fn from_relations(relations: Vec<Relation>) -> Self {
        RelationList { relations }
    }

    /// The first (and typically only) relation of the bag.
    pub fn first(&self) -> &Relation {
        &self.relations[0]
    }

    /// Replace the column of `variable` in every member.
    pub fn replace_column(&mut self, vector: &[Polynomial], variable: &str) {
        self.relations = self
            .relations
            .iter()
            .map(|r| r.replace_column(vector, variable))
            .collect();
    }

    /// Compose every member with every member of the other bag,
    /// deduplicating equal results.
    pub fn composition(&mut self, other: &RelationList) {
        let mut composed: Vec<Relation> = Vec::new();
        for r1 in &self.relations {
            for r2 in &other.relations {
                let out = r1.composition(r2);
                if !composed.iter().any(|r| r.equal(&out)) {
                    composed.push(out);
                }
            }
        }
        self.relations = composed;
    }

    /// Pairwise sum of the two bags, deduplicated.
    pub fn sum(&self, other: &RelationList) -> RelationList {
        let mut sums: Vec<Relation> = Vec::new();
        for r1 in &self.relations {
            for r2 in &other.relations {
                let out = r1.sum(r2);
                if !sums.iter().any(|r| r.equal(&out)) {
                    sums.push(out);
                }
            }
        }
        RelationList { relations: sums }
    }

    /// Fixpoint of every member.
    pub fn fixpoint(&mut self) {
        self.relations = self.relations.iter().map(Relation::fixpoint).collect();
    }

    pub fn while_correction(&mut self, dg: &mut DeltaGraph) {
        for rel in &mut self.relations {
            rel.while_correction(dg);
        }
    }

    pub fn loop_correction(&mut self, controller: &str, dg: &mut DeltaGraph) {
        for rel in &mut self.relations {
            rel.loop_correction(controller, dg);
        }
    }
}

impl Default for RelationList {
    fn default() -> Self {
        RelationList::new()
    }
}

impl fmt::Display for RelationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rel) in self.relations.iter().enumerate() {
            writeln!(f, "{}:", i + 1)?;
            writeln!(f, "{rel}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::Scalar;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_list_is_composition_unit() {
        let mut acc = RelationList::new();
        let rel = RelationList::identity(&vars(&["x", "y"]));
        acc.composition(&rel);
        assert_eq!(acc.relations.len(), 1);
        assert!(acc.first().equal(rel.first()));
    }

    #[test]
    fn test_composition_deduplicates() {
        let mut acc = RelationList::new();
        let id = Relation::identity(&vars(&["x"]));
        let two = RelationList::from_relations(vec![id.clone(), id.clone()]);
        acc.composition(&two);
        assert_eq!(acc.relations.len(), 1);
    }

    #[test]
    fn test_sum_joins_branches() {
        let column = [
            Polynomial::zero(),
            Polynomial::from_scalar(Scalar::Unit),
        ];
        let branch_a = RelationList::from_relations(vec![
            Relation::identity(&vars(&["x", "y"])).replace_column(&column, "x"),
        ]);
        let branch_b = RelationList::identity(&vars(&["x", "y"]));
        let joined = branch_a.sum(&branch_b);
        assert_eq!(joined.relations.len(), 1);
        // x keeps its identity from one branch and gains y from the other
        assert_eq!(joined.first().matrix[0][0], Polynomial::unit());
        assert_eq!(joined.first().matrix[1][0], Polynomial::unit());
    }
}
