//! Recognized locations of a rule in a host graph.

use crate::apply::Transform;
use crate::graph::dot::{Highlight, render};
use crate::graph::{Arc, ArcKey, Graph, HyperArc, HyperArcKey, Node, NodeKey};
use std::collections::{BTreeSet, HashSet};

/// One way to apply a rule to a host: the host elements L's elements map to.
///
/// The vectors are indexed by the rule's L keys. Positions of negative elements are `None`.
/// Options hold keys, not references, so they stay valid to inspect after the host changes;
/// applying a stale option is detected and refused.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleOption {
    /// Index of the rule set the rule belongs to.
    pub rule_set_index: usize,
    /// Index of the rule within its rule set.
    pub rule_number: usize,
    /// Index of this option in the list it was recognized into.
    pub option_number: usize,
    pub nodes: Vec<Option<NodeKey>>,
    pub arcs: Vec<Option<ArcKey>>,
    pub hyperarcs: Vec<Option<HyperArcKey>>,
    /// Option numbers this option can be applied together with.
    pub confluence: BTreeSet<usize>,
    /// Where the run of L's global labels starts in the host's, for ordered global labels.
    pub global_label_start: Option<usize>,
    /// Maps R's positions into the host's coordinate frame.
    pub position_transform: Transform,
}

/// The host elements an option would consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consumed {
    pub nodes: HashSet<NodeKey>,
    pub arcs: HashSet<ArcKey>,
    pub hyperarcs: HashSet<HyperArcKey>,
}

impl Consumed {
    pub fn is_disjoint(&self, other: &Consumed) -> bool {
        self.nodes.is_disjoint(&other.nodes)
            && self.arcs.is_disjoint(&other.arcs)
            && self.hyperarcs.is_disjoint(&other.hyperarcs)
    }
}

impl RuleOption {
    pub fn node_image(&self, l_node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(l_node.index()).copied().flatten()
    }

    pub fn arc_image(&self, l_arc: ArcKey) -> Option<ArcKey> {
        self.arcs.get(l_arc.index()).copied().flatten()
    }

    pub fn hyperarc_image(&self, l_hyperarc: HyperArcKey) -> Option<HyperArcKey> {
        self.hyperarcs.get(l_hyperarc.index()).copied().flatten()
    }

    pub fn consumed(&self) -> Consumed {
        Consumed {
            nodes: self.nodes.iter().flatten().copied().collect(),
            arcs: self.arcs.iter().flatten().copied().collect(),
            hyperarcs: self.hyperarcs.iter().flatten().copied().collect(),
        }
    }

    /// A read-only view of the matched elements inside `host`.
    pub fn location<'g>(&self, host: &'g Graph) -> LocationView<'g> {
        LocationView {
            host,
            consumed: self.consumed(),
        }
    }
}

/// The part of a host graph one option matched, borrowed from the host.
#[derive(Debug)]
pub struct LocationView<'g> {
    host: &'g Graph,
    consumed: Consumed,
}

impl<'g> LocationView<'g> {
    pub fn host(&self) -> &'g Graph {
        self.host
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &'g Node)> + '_ {
        let host = self.host;
        host.nodes().filter(|(k, _)| self.consumed.nodes.contains(k))
    }

    pub fn arcs(&self) -> impl Iterator<Item = (ArcKey, &'g Arc)> + '_ {
        let host = self.host;
        host.arcs().filter(|(k, _)| self.consumed.arcs.contains(k))
    }

    pub fn hyperarcs(&self) -> impl Iterator<Item = (HyperArcKey, &'g HyperArc)> + '_ {
        let host = self.host;
        host.hyperarcs()
            .filter(|(k, _)| self.consumed.hyperarcs.contains(k))
    }

    pub fn contains_node(&self, key: NodeKey) -> bool {
        self.consumed.nodes.contains(&key)
    }

    pub fn contains_arc(&self, key: ArcKey) -> bool {
        self.consumed.arcs.contains(&key)
    }

    pub fn contains_hyperarc(&self, key: HyperArcKey) -> bool {
        self.consumed.hyperarcs.contains(&key)
    }

    /// The whole host with the location highlighted.
    pub fn dot(&self) -> String {
        let highlight = Highlight {
            nodes: self.consumed.nodes.clone(),
            arcs: self.consumed.arcs.clone(),
            hyperarcs: self.consumed.hyperarcs.clone(),
        };
        render(self.host, &highlight)
    }
}
