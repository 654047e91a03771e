#![allow(dead_code)]

use graphsynth::prelude::*;

/// Nodes `n0, n1, ..` with one label each, joined in order by directed arcs `e0, e1, ..`.
pub fn chain(labels: &[&str]) -> Graph {
    let mut g = Graph::new();
    let keys: Vec<NodeKey> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            g.add_node(Node::new(format!("n{i}")).with_label(*label))
                .unwrap()
        })
        .collect();
    for (i, pair) in keys.windows(2).enumerate() {
        g.add_arc(Arc::between(format!("e{i}"), pair[0], pair[1]))
            .unwrap();
    }
    g
}

pub fn single(name: &str, label: &str) -> Graph {
    let mut g = Graph::new();
    g.add_node(Node::new(name).with_label(label)).unwrap();
    g
}

/// Swaps label `from` for `to` on one node, keeping the node.
pub fn relabel(from: &str, to: &str) -> GrammarRule {
    GrammarRule::new(
        format!("{from}->{to}"),
        single("x", from),
        single("x", to),
    )
    .unwrap()
}

/// Hangs a new `tip` child under a `tip` node and moves the label down.
pub fn grow() -> GrammarRule {
    let l = single("p", "tip");
    let mut r = Graph::new();
    let p = r.add_node(Node::new("p")).unwrap();
    let c = r.add_node(Node::new("c").with_label("tip")).unwrap();
    r.add_arc(Arc::between("pc", p, c)).unwrap();
    GrammarRule::new("grow", l, r).unwrap()
}

/// Checks the bookkeeping every application must leave intact: unique names, no handle to a
/// removed node.
pub fn assert_consistent(g: &Graph) {
    g.validate().unwrap();
    for (_, arc) in g.arcs() {
        for end in [arc.from(), arc.to()].into_iter().flatten() {
            assert!(g.contains_node(end), "arc `{}` points at a removed node", arc.name());
        }
    }
    for (_, hyperarc) in g.hyperarcs() {
        for &member in hyperarc.nodes() {
            assert!(g.contains_node(member));
        }
    }
}
