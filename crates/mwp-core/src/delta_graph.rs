//! Infinity witnesses accumulated during derivation
//!
//! Each clause is a conjunction of deltas that, if all selected by the
//! choice vector, forces an ∞ coefficient. The store keeps clauses minimal
//! under subsumption: a smaller clause fires in strictly more situations,
//! so supersets of a stored clause are never kept.
//!
//! Fusion additionally collapses covering families: clauses identical up to
//! one index whose values exhaust the whole choice domain fuse into the
//! clause without that delta. Deriving the empty clause this way means no
//! choice vector avoids ∞.

use crate::monomial::Delta;
use log::debug;
use std::collections::BTreeSet;

/// A conjunction of deltas, sorted by index.
pub type Clause = Vec<Delta>;

#[derive(Clone, Debug)]
pub struct DeltaGraph {
    clauses: BTreeSet<Clause>,
    domain: Vec<usize>,
}

impl DeltaGraph {
    pub fn new(domain: &[usize]) -> Self {
        DeltaGraph { clauses: BTreeSet::new(), domain: domain.to_vec() }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// ∞ cannot be avoided by any choice: the empty clause was derived.
    pub fn unavoidable(&self) -> bool {
        self.clauses.contains(&Vec::new())
    }

    /// Insert a clause unless an equal or smaller clause already covers it;
    /// stored supersets of the new clause are dropped.
    pub fn insert(&mut self, deltas: &[Delta]) {
        let clause: Clause = deltas.to_vec();
        if self.clauses.iter().any(|c| is_subset(c, &clause)) {
            return;
        }
        self.clauses.retain(|c| !is_subset(&clause, c));
        self.clauses.insert(clause);
    }

    /// Close the store under covering-family collapse.
    pub fn fusion(&mut self) {
        loop {
            let Some(base) = self.find_covered_family() else { break };
            debug!("delta graph fusion -> {base:?}");
            // inserting the base drops every member of the family, all of
            // which are supersets of it
            self.insert(&base);
        }
    }

    /// Find a clause set `{base ∪ {(v, i)} : v ∈ domain}` fully present in
    /// the store and return the base.
    fn find_covered_family(&self) -> Option<Clause> {
        for clause in &self.clauses {
            for (k, &(_, index)) in clause.iter().enumerate() {
                let mut base = clause.clone();
                base.remove(k);
                let covered = self.domain.iter().all(|&value| {
                    let mut member = base.clone();
                    let pos = member.partition_point(|&(_, i)| i < index);
                    member.insert(pos, (value, index));
                    self.clauses.contains(&member)
                });
                if covered {
                    return Some(base);
                }
            }
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }
}

fn is_subset(small: &[Delta], large: &[Delta]) -> bool {
    small.iter().all(|d| large.contains(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_skips_subsumed_clauses() {
        let mut dg = DeltaGraph::new(&[0, 1, 2]);
        dg.insert(&[(0, 0)]);
        dg.insert(&[(0, 0), (1, 1)]); // superset, ignored
        assert_eq!(dg.len(), 1);
    }

    #[test]
    fn test_insert_drops_larger_clauses() {
        let mut dg = DeltaGraph::new(&[0, 1, 2]);
        dg.insert(&[(0, 0), (1, 1)]);
        dg.insert(&[(0, 0)]);
        assert_eq!(dg.len(), 1);
        assert!(dg.iter().next().map(Vec::as_slice) == Some(&[(0, 0)][..]));
    }

    #[test]
    fn test_fusion_collapses_covering_family() {
        let mut dg = DeltaGraph::new(&[0, 1, 2]);
        dg.insert(&[(0, 2), (1, 5)]);
        dg.insert(&[(1, 2), (1, 5)]);
        dg.insert(&[(2, 2), (1, 5)]);
        dg.fusion();
        assert_eq!(dg.len(), 1);
        assert!(dg.iter().next().map(Vec::as_slice) == Some(&[(1, 5)][..]));
    }

    #[test]
    fn test_fusion_derives_the_empty_clause() {
        let mut dg = DeltaGraph::new(&[0, 1, 2]);
        dg.insert(&[(0, 0)]);
        dg.insert(&[(1, 0)]);
        dg.insert(&[(2, 0)]);
        assert!(!dg.unavoidable());
        dg.fusion();
        assert!(dg.unavoidable());
        assert_eq!(dg.len(), 1);
    }

    #[test]
    fn test_fusion_cascades() {
        let mut dg = DeltaGraph::new(&[0, 1]);
        dg.insert(&[(0, 0), (0, 1)]);
        dg.insert(&[(1, 0), (0, 1)]);
        dg.insert(&[(0, 1)]); // already subsumes the two above
        dg.insert(&[(1, 1)]);
        dg.fusion();
        assert!(dg.unavoidable());
    }
}
