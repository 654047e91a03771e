//! Which options of one host can be applied together.
//!
//! Two options conflict when they consume a common host element. Compatibility is symmetric
//! but not transitive, so the largest simultaneously applicable groups are the maximal cliques
//! of the compatibility graph. Options recognized in different hosts must not be compared.

use crate::option::{Consumed, RuleOption};
use petgraph::graphmap::UnGraphMap;
use std::cmp::Reverse;
use std::collections::BTreeSet;

pub fn are_confluent(a: &RuleOption, b: &RuleOption) -> bool {
    a.consumed().is_disjoint(&b.consumed())
}

/// Fills every option's `confluence` with the option numbers it is compatible with.
pub fn assign_local_confluence(options: &mut [RuleOption]) {
    let consumed: Vec<Consumed> = options.iter().map(RuleOption::consumed).collect();
    let numbers: Vec<usize> = options.iter().map(|o| o.option_number).collect();
    for (i, option) in options.iter_mut().enumerate() {
        option.confluence = (0..consumed.len())
            .filter(|&j| j != i && consumed[i].is_disjoint(&consumed[j]))
            .map(|j| numbers[j])
            .collect();
    }
}

/// Every maximal set of pairwise compatible options, as option numbers, largest first.
pub fn maximal_confluent_sets(options: &[RuleOption]) -> Vec<BTreeSet<usize>> {
    if options.is_empty() {
        return Vec::new();
    }
    let consumed: Vec<Consumed> = options.iter().map(RuleOption::consumed).collect();
    let mut compatible = UnGraphMap::<usize, ()>::new();
    for i in 0..options.len() {
        compatible.add_node(i);
        for j in 0..i {
            if consumed[i].is_disjoint(&consumed[j]) {
                compatible.add_edge(i, j, ());
            }
        }
    }

    let mut cliques = Vec::new();
    bron_kerbosch(
        &compatible,
        BTreeSet::new(),
        (0..options.len()).collect(),
        BTreeSet::new(),
        &mut cliques,
    );

    let mut sets: Vec<BTreeSet<usize>> = cliques
        .into_iter()
        .map(|clique| clique.into_iter().map(|i| options[i].option_number).collect())
        .collect();
    sets.sort_by(|a, b| (Reverse(a.len()), a).cmp(&(Reverse(b.len()), b)));
    sets
}

/// Bron–Kerbosch with pivoting.
fn bron_kerbosch(
    graph: &UnGraphMap<usize, ()>,
    clique: BTreeSet<usize>,
    mut candidates: BTreeSet<usize>,
    mut excluded: BTreeSet<usize>,
    out: &mut Vec<BTreeSet<usize>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            out.push(clique);
        }
        return;
    }
    let pivot = candidates
        .union(&excluded)
        .copied()
        .max_by_key(|&u| graph.neighbors(u).filter(|v| candidates.contains(v)).count());
    let branches: Vec<usize> = match pivot {
        Some(u) => candidates
            .iter()
            .copied()
            .filter(|&v| !graph.contains_edge(u, v))
            .collect(),
        None => candidates.iter().copied().collect(),
    };
    for v in branches {
        let neighbors: BTreeSet<usize> = graph.neighbors(v).collect();
        let mut grown = clique.clone();
        grown.insert(v);
        bron_kerbosch(
            graph,
            grown,
            candidates.intersection(&neighbors).copied().collect(),
            excluded.intersection(&neighbors).copied().collect(),
            out,
        );
        candidates.remove(&v);
        excluded.insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::Transform;
    use crate::graph::NodeKey;

    fn option(number: usize, nodes: &[u32]) -> RuleOption {
        RuleOption {
            rule_set_index: 0,
            rule_number: 0,
            option_number: number,
            nodes: nodes.iter().map(|&n| Some(NodeKey(n))).collect(),
            arcs: Vec::new(),
            hyperarcs: Vec::new(),
            confluence: BTreeSet::new(),
            global_label_start: None,
            position_transform: Transform::IDENTITY,
        }
    }

    #[test]
    fn local_confluence_is_disjointness() {
        let mut options = vec![option(0, &[1, 2]), option(1, &[2, 3]), option(2, &[4])];
        assign_local_confluence(&mut options);
        assert_eq!(options[0].confluence, BTreeSet::from([2]));
        assert_eq!(options[1].confluence, BTreeSet::from([2]));
        assert_eq!(options[2].confluence, BTreeSet::from([0, 1]));
        assert!(are_confluent(&options[0], &options[2]));
        assert!(!are_confluent(&options[0], &options[1]));
    }

    #[test]
    fn maximal_sets_are_cliques_not_closures() {
        // 0-1 and 1-2 are compatible, 0-2 are not
        let options = vec![option(0, &[1]), option(1, &[2]), option(2, &[1])];
        let sets = maximal_confluent_sets(&options);
        assert_eq!(sets, vec![BTreeSet::from([0, 1]), BTreeSet::from([1, 2])]);
    }

    #[test]
    fn isolated_options_form_singleton_sets() {
        let options = vec![option(0, &[1]), option(1, &[1])];
        assert_eq!(
            maximal_confluent_sets(&options),
            vec![BTreeSet::from([0]), BTreeSet::from([1])]
        );
        assert!(maximal_confluent_sets(&[]).is_empty());
    }
}
