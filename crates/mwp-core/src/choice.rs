//! Choice-space search
//!
//! A derivation leaves one choice per delta index. [`Choices`] is a compact
//! description of every choice vector that avoids all accumulated infinity
//! clauses: a union of branches, each branch listing the allowed values per
//! index. The union is kept minimal — no branch is pointwise contained in
//! another — and an empty union means no polynomial bound exists.

use crate::delta_graph::{Clause, DeltaGraph};
use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

/// Allowed values per index, one set for each index in `0..index`.
pub type Branch = Vec<Vec<usize>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choices {
    /// Minimal union of branches avoiding every infinity clause.
    pub valid: Vec<Branch>,
    /// Number of delta indices the vectors range over.
    pub index: usize,
}

impl Choices {
    /// Build the choice representation for `index` deltas over `domain`,
    /// avoiding every clause in `infinities`.
    pub fn generate(domain: &[usize], index: usize, infinities: &BTreeSet<Clause>) -> Choices {
        let clauses = simplify(domain, infinities);
        if clauses.contains(&Vec::new()) {
            debug!("empty infinity clause: no valid choice exists");
            return Choices { valid: Vec::new(), index };
        }

        // to avoid a clause, at least one of its deltas must be excluded;
        // every way of picking one exclusion per clause yields a branch
        let mut exclusions: BTreeSet<BTreeSet<(usize, usize)>> = BTreeSet::new();
        exclusions.insert(BTreeSet::new());
        for clause in &clauses {
            let mut next = BTreeSet::new();
            for picked in &exclusions {
                for &delta in clause {
                    let mut extended = picked.clone();
                    extended.insert(delta);
                    next.insert(extended);
                }
            }
            exclusions = next;
        }

        let mut branches: BTreeSet<Branch> = BTreeSet::new();
        'next: for blocked in &exclusions {
            let mut branch: Branch = Vec::with_capacity(index);
            for i in 0..index {
                let allowed: Vec<usize> = domain
                    .iter()
                    .copied()
                    .filter(|&v| !blocked.contains(&(v, i)))
                    .collect();
                if allowed.is_empty() {
                    continue 'next;
                }
                branch.push(allowed);
            }
            branches.insert(branch);
        }

        Choices { valid: minimize(branches), index }
    }

    /// True when no choice vector avoids infinity.
    pub fn infinite(&self) -> bool {
        self.valid.is_empty()
    }

    /// A canonical witness vector: the least value at each index of the
    /// first branch. `None` when infinite.
    pub fn first(&self) -> Option<Vec<usize>> {
        self.valid
            .first()
            .map(|branch| branch.iter().map(|allowed| allowed[0]).collect())
    }

    /// True when some branch permits the given vector (or vector prefix).
    pub fn is_valid(&self, choices: &[usize]) -> bool {
        self.valid.iter().any(|branch| {
            choices.len() <= branch.len()
                && choices
                    .iter()
                    .enumerate()
                    .all(|(i, v)| branch[i].contains(v))
        })
    }

    /// Choices valid under both representations: pairwise branch
    /// intersection, re-minimized.
    pub fn intersect(&self, other: &Choices) -> Choices {
        debug_assert_eq!(self.index, other.index);
        let mut branches: BTreeSet<Branch> = BTreeSet::new();
        for b1 in &self.valid {
            'pair: for b2 in &other.valid {
                let mut branch: Branch = Vec::with_capacity(self.index);
                for (a1, a2) in b1.iter().zip(b2.iter()) {
                    let common: Vec<usize> =
                        a1.iter().copied().filter(|v| a2.contains(v)).collect();
                    if common.is_empty() {
                        continue 'pair;
                    }
                    branch.push(common);
                }
                branches.insert(branch);
            }
        }
        Choices { valid: minimize(branches), index: self.index }
    }
}

/// Reduce clauses before the search: drop supersets and collapse families
/// whose values cover the domain at one index. Reuses the delta-graph
/// closure, which performs exactly these two reductions.
fn simplify(domain: &[usize], infinities: &BTreeSet<Clause>) -> BTreeSet<Clause> {
    let mut dg = DeltaGraph::new(domain);
    for clause in infinities {
        dg.insert(clause);
    }
    dg.fusion();
    dg.iter().cloned().collect()
}

/// Deduplicate and drop every branch pointwise contained in another.
fn minimize(branches: BTreeSet<Branch>) -> Vec<Branch> {
    let all: Vec<Branch> = branches.into_iter().collect();
    all.iter()
        .filter(|b| {
            !all.iter()
                .any(|other| *b != other && contained(b, other))
        })
        .cloned()
        .collect()
}

/// Pointwise set containment of branches.
fn contained(small: &Branch, large: &Branch) -> bool {
    small
        .iter()
        .zip(large.iter())
        .all(|(a, b)| a.iter().all(|v| b.contains(v)))
}

impl Serialize for Choices {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Choices", 3)?;
        st.serialize_field("infinite", &self.infinite())?;
        st.serialize_field("index", &self.index)?;
        st.serialize_field("valid", &self.valid)?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clauses(raw: &[&[(usize, usize)]]) -> BTreeSet<Clause> {
        raw.iter().map(|c| c.to_vec()).collect()
    }

    #[test]
    fn test_no_clauses_allows_everything() {
        let result = Choices::generate(&[0, 1, 2], 2, &BTreeSet::new());
        assert!(!result.infinite());
        assert_eq!(result.valid, vec![vec![vec![0, 1, 2], vec![0, 1, 2]]]);
        assert_eq!(result.first(), Some(vec![0, 0]));
    }

    #[test]
    fn test_zero_indices_is_finite() {
        let result = Choices::generate(&[0, 1, 2], 0, &BTreeSet::new());
        assert!(!result.infinite());
        assert_eq!(result.first(), Some(Vec::new()));
    }

    #[test]
    fn test_choices_can_be_parameterized() {
        let inf = clauses(&[
            &[(0, 0), (0, 1)],
            &[(0, 0), (1, 1), (3, 2)],
            &[(1, 0), (1, 1), (3, 2)],
            &[(2, 0), (1, 1), (3, 2)],
            &[(3, 0), (1, 1), (3, 2)],
        ]);
        let result = Choices::generate(&[0, 1, 2, 3], 3, &inf);

        assert!(!result.infinite());
        assert_eq!(result.valid.len(), 4);
        let expect = |b: &[&[usize]]| {
            let b: Branch = b.iter().map(|s| s.to_vec()).collect();
            assert!(result.valid.contains(&b), "missing branch {b:?}");
        };
        expect(&[&[1, 2, 3], &[0, 2, 3], &[0, 1, 2, 3]]); // !(0,0) !(1,1)
        expect(&[&[1, 2, 3], &[0, 1, 2, 3], &[0, 1, 2]]); // !(0,0) !(3,2)
        expect(&[&[0, 1, 2, 3], &[2, 3], &[0, 1, 2, 3]]); // !(0,1) !(1,1)
        expect(&[&[0, 1, 2, 3], &[1, 2, 3], &[0, 1, 2]]); // !(0,1) !(3,2)
    }

    #[test]
    fn test_covered_domain_is_infinite() {
        let inf = clauses(&[&[(0, 3)], &[(1, 3)], &[(2, 3)]]);
        let result = Choices::generate(&[0, 1, 2], 4, &inf);
        assert!(result.infinite());
        assert_eq!(result.first(), None);
    }

    #[test]
    fn test_is_valid_respects_clauses() {
        let inf = clauses(&[&[(0, 1)], &[(1, 0), (2, 1)]]);
        let obj = Choices::generate(&[0, 1, 2], 2, &inf);

        // (0,1) forbids value 0 at index 1
        assert!(!obj.is_valid(&[0, 0]));
        assert!(!obj.is_valid(&[1, 0]));
        assert!(!obj.is_valid(&[2, 0]));

        // (1,0),(2,1) forbids the vector (1, 2)
        assert!(!obj.is_valid(&[1, 2]));

        // everything else is fine
        assert!(obj.is_valid(&[0, 1]));
        assert!(obj.is_valid(&[1, 1]));
        assert!(obj.is_valid(&[2, 1]));
        assert!(obj.is_valid(&[0, 2]));
        assert!(obj.is_valid(&[2, 2]));
    }

    #[test]
    fn test_result_is_minimal() {
        let inf = clauses(&[
            &[(0, 0)],
            &[(1, 0)],
            &[(2, 1), (1, 2)],
            &[(2, 0), (1, 1), (1, 2)],
        ]);
        let result = Choices::generate(&[0, 1, 2], 3, &inf);

        let branch = |b: &[&[usize]]| -> Branch { b.iter().map(|s| s.to_vec()).collect() };
        assert!(result.valid.contains(&branch(&[&[2], &[0, 1, 2], &[0, 2]])));
        assert!(!result.valid.contains(&branch(&[&[2], &[0, 1], &[0, 2]])));
        assert!(!result.valid.contains(&branch(&[&[2], &[0, 2], &[0, 2]])));
        assert!(result.valid.contains(&branch(&[&[2], &[0], &[0, 1, 2]])));
    }

    #[test]
    fn test_intersect_narrows_branches() {
        let a = Choices::generate(&[0, 1, 2], 1, &clauses(&[&[(0, 0)]]));
        let b = Choices::generate(&[0, 1, 2], 1, &clauses(&[&[(2, 0)]]));
        let both = a.intersect(&b);
        assert_eq!(both.valid, vec![vec![vec![1]]]);

        let c = Choices::generate(&[0, 1, 2], 1, &clauses(&[&[(1, 0)]]));
        let none = both.intersect(&c);
        assert!(none.infinite());
    }

    #[test]
    fn test_every_branch_avoids_every_clause() {
        let inf = clauses(&[
            &[(0, 0)],
            &[(1, 0)],
            &[(2, 1), (1, 2)],
            &[(2, 0), (1, 1), (1, 2)],
        ]);
        let result = Choices::generate(&[0, 1, 2], 3, &inf);
        for branch in &result.valid {
            for clause in &inf {
                // some delta of the clause must be excluded by the branch
                assert!(
                    clause.iter().any(|(v, i)| !branch[*i].contains(v)),
                    "branch {branch:?} admits clause {clause:?}"
                );
            }
        }
    }
}
