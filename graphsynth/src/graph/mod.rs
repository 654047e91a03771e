//! The attributed multigraph that grammar rules rewrite.
//!
//! A [`Graph`] is an arena: nodes, arcs and hyperarcs live in slot vectors and refer to each
//! other through typed keys ([`NodeKey`], [`ArcKey`], [`HyperArcKey`]). Slots are never reused,
//! so iteration order is insertion order and a key stays valid until its element is removed.
//! Arcs and hyperarcs only ever point at nodes; the node side of adjacency is derived on demand.

use crate::util::log;
use error_stack::{Report, ResultExt};
use std::collections::HashMap;
use thiserror::Error;

pub mod description;
pub mod dot;
pub mod element;

pub use description::{ArcDescription, GraphDescription, HyperArcDescription, NodeDescription};
pub use dot::DotCollector;
pub use element::{
    Arc, ArcEnd, ArcKey, GraphElement, HyperArc, HyperArcKey, Label, LabelSet, Name, Node,
    NodeKey, TypeTag,
};

pub type GraphResult<T> = Result<T, Report<GraphError>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("a node named `{0}` already exists")]
    DuplicateNodeName(Name),
    #[error("an arc named `{0}` already exists")]
    DuplicateArcName(Name),
    #[error("a hyperarc named `{0}` already exists")]
    DuplicateHyperArcName(Name),
    #[error("node {0:?} does not exist in this graph")]
    UnknownNode(NodeKey),
    #[error("arc {0:?} does not exist in this graph")]
    UnknownArc(ArcKey),
    #[error("hyperarc {0:?} does not exist in this graph")]
    UnknownHyperArc(HyperArcKey),
    #[error("no node named `{0}` to connect to")]
    UnresolvedNodeName(String),
    #[error("graph is internally inconsistent")]
    Inconsistent,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "GraphDescription", into = "GraphDescription")
)]
pub struct Graph {
    pub name: String,
    nodes: Vec<Option<Node>>,
    arcs: Vec<Option<Arc>>,
    hyperarcs: Vec<Option<HyperArc>>,
    node_names: HashMap<Name, NodeKey>,
    arc_names: HashMap<Name, ArcKey>,
    hyperarc_names: HashMap<Name, HyperArcKey>,
    pub global_labels: LabelSet,
    pub global_variables: Vec<f64>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Graph {
            name: name.into(),
            ..Graph::default()
        }
    }

    pub fn with_global_label(mut self, label: impl Into<Label>) -> Self {
        self.global_labels.insert(label);
        self
    }

    // ---- insertion ----

    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeKey> {
        if self.node_names.contains_key(&node.name) {
            return Err(Report::new(GraphError::DuplicateNodeName(node.name)));
        }
        let key = NodeKey(self.nodes.len() as u32);
        self.node_names.insert(node.name, key);
        self.nodes.push(Some(node));
        Ok(key)
    }

    /// Adds the node, renaming it with a numeric suffix if its name is already taken.
    pub fn add_node_unique(&mut self, mut node: Node) -> NodeKey {
        node.name = unique_name(&self.node_names, node.name);
        let key = NodeKey(self.nodes.len() as u32);
        self.node_names.insert(node.name, key);
        self.nodes.push(Some(node));
        key
    }

    pub fn add_arc(&mut self, arc: Arc) -> GraphResult<ArcKey> {
        if self.arc_names.contains_key(&arc.name) {
            return Err(Report::new(GraphError::DuplicateArcName(arc.name)));
        }
        self.check_arc_ends(&arc)?;
        let key = ArcKey(self.arcs.len() as u32);
        self.arc_names.insert(arc.name, key);
        self.arcs.push(Some(arc));
        Ok(key)
    }

    /// Adds the arc, renaming it with a numeric suffix if its name is already taken.
    pub fn add_arc_unique(&mut self, mut arc: Arc) -> GraphResult<ArcKey> {
        self.check_arc_ends(&arc)?;
        arc.name = unique_name(&self.arc_names, arc.name);
        let key = ArcKey(self.arcs.len() as u32);
        self.arc_names.insert(arc.name, key);
        self.arcs.push(Some(arc));
        Ok(key)
    }

    pub fn add_hyperarc(&mut self, hyperarc: HyperArc) -> GraphResult<HyperArcKey> {
        if self.hyperarc_names.contains_key(&hyperarc.name) {
            return Err(Report::new(GraphError::DuplicateHyperArcName(
                hyperarc.name,
            )));
        }
        self.check_members(&hyperarc)?;
        let key = HyperArcKey(self.hyperarcs.len() as u32);
        self.hyperarc_names.insert(hyperarc.name, key);
        self.hyperarcs.push(Some(hyperarc));
        Ok(key)
    }

    /// Adds the hyperarc, renaming it with a numeric suffix if its name is already taken.
    pub fn add_hyperarc_unique(&mut self, mut hyperarc: HyperArc) -> GraphResult<HyperArcKey> {
        self.check_members(&hyperarc)?;
        hyperarc.name = unique_name(&self.hyperarc_names, hyperarc.name);
        let key = HyperArcKey(self.hyperarcs.len() as u32);
        self.hyperarc_names.insert(hyperarc.name, key);
        self.hyperarcs.push(Some(hyperarc));
        Ok(key)
    }

    fn check_arc_ends(&self, arc: &Arc) -> GraphResult<()> {
        for end in [arc.from, arc.to].into_iter().flatten() {
            if !self.contains_node(end) {
                return Err(Report::new(GraphError::UnknownNode(end)))
                    .attach_printable_lazy(|| format!("while adding arc `{}`", arc.name));
            }
        }
        Ok(())
    }

    fn check_members(&self, hyperarc: &HyperArc) -> GraphResult<()> {
        for &member in &hyperarc.nodes {
            if !self.contains_node(member) {
                return Err(Report::new(GraphError::UnknownNode(member)))
                    .attach_printable_lazy(|| format!("while adding hyperarc `{}`", hyperarc.name));
            }
        }
        Ok(())
    }

    // ---- removal ----

    /// Removes the node. Arcs attached to it are kept with that end left dangling, and the node
    /// is dropped from every hyperarc's member list.
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        let node = self.nodes.get_mut(key.index())?.take()?;
        self.node_names.remove(&node.name);
        for arc in self.arcs.iter_mut().flatten() {
            if arc.from == Some(key) {
                arc.from = None;
            }
            if arc.to == Some(key) {
                arc.to = None;
            }
        }
        for hyperarc in self.hyperarcs.iter_mut().flatten() {
            hyperarc.nodes.retain(|&n| n != key);
        }
        Some(node)
    }

    pub fn remove_arc(&mut self, key: ArcKey) -> Option<Arc> {
        let arc = self.arcs.get_mut(key.index())?.take()?;
        self.arc_names.remove(&arc.name);
        Some(arc)
    }

    pub fn remove_hyperarc(&mut self, key: HyperArcKey) -> Option<HyperArc> {
        let hyperarc = self.hyperarcs.get_mut(key.index())?.take()?;
        self.hyperarc_names.remove(&hyperarc.name);
        Some(hyperarc)
    }

    // ---- access ----

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key.index())?.as_ref()
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key.index())?.as_mut()
    }

    pub fn arc(&self, key: ArcKey) -> Option<&Arc> {
        self.arcs.get(key.index())?.as_ref()
    }

    pub fn arc_mut(&mut self, key: ArcKey) -> Option<&mut Arc> {
        self.arcs.get_mut(key.index())?.as_mut()
    }

    pub fn hyperarc(&self, key: HyperArcKey) -> Option<&HyperArc> {
        self.hyperarcs.get(key.index())?.as_ref()
    }

    pub fn hyperarc_mut(&mut self, key: HyperArcKey) -> Option<&mut HyperArc> {
        self.hyperarcs.get_mut(key.index())?.as_mut()
    }

    pub fn contains_node(&self, key: NodeKey) -> bool {
        self.node(key).is_some()
    }

    pub fn contains_arc(&self, key: ArcKey) -> bool {
        self.arc(key).is_some()
    }

    pub fn contains_hyperarc(&self, key: HyperArcKey) -> bool {
        self.hyperarc(key).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|n| (NodeKey(idx as u32), n)))
    }

    pub fn arcs(&self) -> impl Iterator<Item = (ArcKey, &Arc)> {
        self.arcs
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|a| (ArcKey(idx as u32), a)))
    }

    pub fn hyperarcs(&self) -> impl Iterator<Item = (HyperArcKey, &HyperArc)> {
        self.hyperarcs
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|h| (HyperArcKey(idx as u32), h)))
    }

    pub fn node_keys(&self) -> Vec<NodeKey> {
        self.nodes().map(|(k, _)| k).collect()
    }

    pub fn arc_keys(&self) -> Vec<ArcKey> {
        self.arcs().map(|(k, _)| k).collect()
    }

    pub fn hyperarc_keys(&self) -> Vec<HyperArcKey> {
        self.hyperarcs().map(|(k, _)| k).collect()
    }

    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arc_names.len()
    }

    pub fn hyperarc_count(&self) -> usize {
        self.hyperarc_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0 && self.arc_count() == 0 && self.hyperarc_count() == 0
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeKey> {
        self.node_names.get(&Name::from(name)).copied()
    }

    pub fn arc_by_name(&self, name: &str) -> Option<ArcKey> {
        self.arc_names.get(&Name::from(name)).copied()
    }

    pub fn hyperarc_by_name(&self, name: &str) -> Option<HyperArcKey> {
        self.hyperarc_names.get(&Name::from(name)).copied()
    }

    // ---- adjacency (derived) ----

    /// Arcs whose `from` end is `node`.
    pub fn arcs_from(&self, node: NodeKey) -> impl Iterator<Item = ArcKey> + '_ {
        self.arcs()
            .filter(move |(_, a)| a.from == Some(node))
            .map(|(k, _)| k)
    }

    /// Arcs whose `to` end is `node`.
    pub fn arcs_to(&self, node: NodeKey) -> impl Iterator<Item = ArcKey> + '_ {
        self.arcs()
            .filter(move |(_, a)| a.to == Some(node))
            .map(|(k, _)| k)
    }

    /// Arcs touching `node` at either end. A self loop appears once.
    pub fn incident_arcs(&self, node: NodeKey) -> impl Iterator<Item = ArcKey> + '_ {
        self.arcs()
            .filter(move |(_, a)| a.from == Some(node) || a.to == Some(node))
            .map(|(k, _)| k)
    }

    pub fn hyperarcs_of(&self, node: NodeKey) -> impl Iterator<Item = HyperArcKey> + '_ {
        self.hyperarcs()
            .filter(move |(_, h)| h.contains(node))
            .map(|(k, _)| k)
    }

    /// Number of arc ends attached to `node` (a self loop counts twice) plus the number of
    /// hyperarcs containing it.
    pub fn degree(&self, node: NodeKey) -> usize {
        let arc_ends = self
            .arcs()
            .map(|(_, a)| usize::from(a.from == Some(node)) + usize::from(a.to == Some(node)))
            .sum::<usize>();
        arc_ends + self.hyperarcs_of(node).count()
    }

    /// Arcs with both ends inside the hyperarc's member set.
    pub fn intra_arcs(&self, hyperarc: HyperArcKey) -> Vec<ArcKey> {
        let Some(h) = self.hyperarc(hyperarc) else {
            return Vec::new();
        };
        self.arcs()
            .filter(|(_, a)| match (a.from, a.to) {
                (Some(f), Some(t)) => h.contains(f) && h.contains(t),
                _ => false,
            })
            .map(|(k, _)| k)
            .collect()
    }

    // ---- mutation helpers ----

    /// Attaches (or detaches, with `None`) one end of an arc.
    pub fn set_arc_end(&mut self, arc: ArcKey, end: ArcEnd, node: Option<NodeKey>) -> GraphResult<()> {
        if let Some(n) = node {
            if !self.contains_node(n) {
                return Err(Report::new(GraphError::UnknownNode(n)));
            }
        }
        let a = self
            .arc_mut(arc)
            .ok_or_else(|| Report::new(GraphError::UnknownArc(arc)))?;
        match end {
            ArcEnd::From => a.from = node,
            ArcEnd::To => a.to = node,
        }
        Ok(())
    }

    pub fn add_to_hyperarc(&mut self, hyperarc: HyperArcKey, node: NodeKey) -> GraphResult<()> {
        if !self.contains_node(node) {
            return Err(Report::new(GraphError::UnknownNode(node)));
        }
        let h = self
            .hyperarc_mut(hyperarc)
            .ok_or_else(|| Report::new(GraphError::UnknownHyperArc(hyperarc)))?;
        if !h.nodes.contains(&node) {
            h.nodes.push(node);
        }
        Ok(())
    }

    pub fn remove_from_hyperarc(&mut self, hyperarc: HyperArcKey, node: NodeKey) -> GraphResult<()> {
        let h = self
            .hyperarc_mut(hyperarc)
            .ok_or_else(|| Report::new(GraphError::UnknownHyperArc(hyperarc)))?;
        h.nodes.retain(|&n| n != node);
        Ok(())
    }

    pub fn rename_node(&mut self, key: NodeKey, name: impl Into<Name>) -> GraphResult<()> {
        let name = name.into();
        let old = self
            .node(key)
            .ok_or_else(|| Report::new(GraphError::UnknownNode(key)))?
            .name;
        if old == name {
            return Ok(());
        }
        if self.node_names.contains_key(&name) {
            return Err(Report::new(GraphError::DuplicateNodeName(name)));
        }
        self.node_names.remove(&old);
        self.node_names.insert(name, key);
        if let Some(node) = self.node_mut(key) {
            node.name = name;
        }
        Ok(())
    }

    pub fn rename_arc(&mut self, key: ArcKey, name: impl Into<Name>) -> GraphResult<()> {
        let name = name.into();
        let old = self
            .arc(key)
            .ok_or_else(|| Report::new(GraphError::UnknownArc(key)))?
            .name;
        if old == name {
            return Ok(());
        }
        if self.arc_names.contains_key(&name) {
            return Err(Report::new(GraphError::DuplicateArcName(name)));
        }
        self.arc_names.remove(&old);
        self.arc_names.insert(name, key);
        if let Some(arc) = self.arc_mut(key) {
            arc.name = name;
        }
        Ok(())
    }

    pub fn rename_hyperarc(&mut self, key: HyperArcKey, name: impl Into<Name>) -> GraphResult<()> {
        let name = name.into();
        let old = self
            .hyperarc(key)
            .ok_or_else(|| Report::new(GraphError::UnknownHyperArc(key)))?
            .name;
        if old == name {
            return Ok(());
        }
        if self.hyperarc_names.contains_key(&name) {
            return Err(Report::new(GraphError::DuplicateHyperArcName(name)));
        }
        self.hyperarc_names.remove(&old);
        self.hyperarc_names.insert(name, key);
        if let Some(hyperarc) = self.hyperarc_mut(key) {
            hyperarc.name = name;
        }
        Ok(())
    }

    // ---- whole-graph passes ----

    /// The repeat-name check: rebuilds the name indices from the elements and renames every
    /// later duplicate with a numeric suffix. Returns how many elements were renamed.
    pub fn repair_names(&mut self) -> usize {
        let mut renamed = 0;

        self.node_names.clear();
        for (idx, slot) in self.nodes.iter_mut().enumerate() {
            if let Some(node) = slot {
                let name = unique_name(&self.node_names, node.name);
                if name != node.name {
                    log::warn!("renaming duplicate node `{}` to `{}`", node.name, name);
                    node.name = name;
                    renamed += 1;
                }
                self.node_names.insert(name, NodeKey(idx as u32));
            }
        }

        self.arc_names.clear();
        for (idx, slot) in self.arcs.iter_mut().enumerate() {
            if let Some(arc) = slot {
                let name = unique_name(&self.arc_names, arc.name);
                if name != arc.name {
                    log::warn!("renaming duplicate arc `{}` to `{}`", arc.name, name);
                    arc.name = name;
                    renamed += 1;
                }
                self.arc_names.insert(name, ArcKey(idx as u32));
            }
        }

        self.hyperarc_names.clear();
        for (idx, slot) in self.hyperarcs.iter_mut().enumerate() {
            if let Some(hyperarc) = slot {
                let name = unique_name(&self.hyperarc_names, hyperarc.name);
                if name != hyperarc.name {
                    log::warn!("renaming duplicate hyperarc `{}` to `{}`", hyperarc.name, name);
                    hyperarc.name = name;
                    renamed += 1;
                }
                self.hyperarc_names.insert(name, HyperArcKey(idx as u32));
            }
        }

        renamed
    }

    /// Checks the structural invariants: unique names and no reference to a node that is not
    /// alive in this graph.
    pub fn validate(&self) -> GraphResult<()> {
        let mut seen = HashMap::new();
        for (key, node) in self.nodes() {
            if seen.insert(node.name, key).is_some() {
                return Err(Report::new(GraphError::DuplicateNodeName(node.name)))
                    .change_context(GraphError::Inconsistent);
            }
        }
        let mut seen = HashMap::new();
        for (key, arc) in self.arcs() {
            if seen.insert(arc.name, key).is_some() {
                return Err(Report::new(GraphError::DuplicateArcName(arc.name)))
                    .change_context(GraphError::Inconsistent);
            }
            self.check_arc_ends(arc)
                .change_context(GraphError::Inconsistent)?;
        }
        let mut seen = HashMap::new();
        for (key, hyperarc) in self.hyperarcs() {
            if seen.insert(hyperarc.name, key).is_some() {
                return Err(Report::new(GraphError::DuplicateHyperArcName(hyperarc.name)))
                    .change_context(GraphError::Inconsistent);
            }
            self.check_members(hyperarc)
                .change_context(GraphError::Inconsistent)?;
        }
        Ok(())
    }

    /// A deep structural copy with freshly numbered keys.
    ///
    /// Removed slots are compacted away, so keys of the copy generally differ from the
    /// original's. Use [`Graph::copy_with_mapping`] when the correspondence is needed.
    pub fn copy(&self) -> Graph {
        self.copy_with_mapping().0
    }

    /// Like [`Graph::copy`], also returning which copied node each original node became.
    pub fn copy_with_mapping(&self) -> (Graph, HashMap<NodeKey, NodeKey>) {
        let mut copy = Graph::with_name(self.name.clone());
        copy.global_labels = self.global_labels.clone();
        copy.global_variables = self.global_variables.clone();

        let mut node_map = HashMap::new();
        for (key, node) in self.nodes() {
            let new_key = copy.add_node_unique(node.clone());
            node_map.insert(key, new_key);
        }
        for (_, arc) in self.arcs() {
            let mut arc = arc.clone();
            arc.from = arc.from.and_then(|n| node_map.get(&n).copied());
            arc.to = arc.to.and_then(|n| node_map.get(&n).copied());
            copy.push_arc_unchecked(arc);
        }
        for (_, hyperarc) in self.hyperarcs() {
            let mut hyperarc = hyperarc.clone();
            hyperarc.nodes = hyperarc
                .nodes
                .iter()
                .filter_map(|n| node_map.get(n).copied())
                .collect();
            copy.push_hyperarc_unchecked(hyperarc);
        }
        (copy, node_map)
    }

    // Ends/members were remapped from a valid graph, so they are alive by construction.
    fn push_arc_unchecked(&mut self, mut arc: Arc) -> ArcKey {
        arc.name = unique_name(&self.arc_names, arc.name);
        let key = ArcKey(self.arcs.len() as u32);
        self.arc_names.insert(arc.name, key);
        self.arcs.push(Some(arc));
        key
    }

    fn push_hyperarc_unchecked(&mut self, mut hyperarc: HyperArc) -> HyperArcKey {
        hyperarc.name = unique_name(&self.hyperarc_names, hyperarc.name);
        let key = HyperArcKey(self.hyperarcs.len() as u32);
        self.hyperarc_names.insert(hyperarc.name, key);
        self.hyperarcs.push(Some(hyperarc));
        key
    }
}

/// `base` if it is free, otherwise the first free `base_1`, `base_2`, ...
fn unique_name<K>(taken: &HashMap<Name, K>, base: Name) -> Name {
    if !taken.contains_key(&base) {
        return base;
    }
    let mut suffix = 1usize;
    loop {
        let candidate = Name::from(format!("{base}_{suffix}"));
        if !taken.contains_key(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Graph, [NodeKey; 3]) {
        let mut g = Graph::with_name("triangle");
        let a = g.add_node(Node::new("a").with_label("x")).unwrap();
        let b = g.add_node(Node::new("b")).unwrap();
        let c = g.add_node(Node::new("c")).unwrap();
        g.add_arc(Arc::between("ab", a, b)).unwrap();
        g.add_arc(Arc::between("bc", b, c)).unwrap();
        g.add_arc(Arc::between("ca", c, a).undirected()).unwrap();
        (g, [a, b, c])
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut g, _) = triangle();
        let err = g.add_node(Node::new("a")).unwrap_err();
        assert_eq!(
            err.current_context(),
            &GraphError::DuplicateNodeName(Name::from("a"))
        );
        let key = g.add_node_unique(Node::new("a"));
        assert_eq!(g.node(key).unwrap().name(), Name::from("a_1"));
    }

    #[test]
    fn adjacency_is_derived_from_arcs() {
        let (mut g, [a, b, c]) = triangle();
        assert_eq!(g.arcs_from(a).count(), 1);
        assert_eq!(g.arcs_to(a).count(), 1);
        assert_eq!(g.degree(b), 2);
        g.add_arc(Arc::between("loop", b, b)).unwrap();
        assert_eq!(g.degree(b), 4);
        let h = g.add_hyperarc(HyperArc::new("h", [a, b, c])).unwrap();
        assert_eq!(g.degree(c), 3);
        assert_eq!(g.intra_arcs(h).len(), 4);
    }

    #[test]
    fn removing_a_node_leaves_arcs_dangling() {
        let (mut g, [a, b, c]) = triangle();
        let h = g.add_hyperarc(HyperArc::new("h", [a, b])).unwrap();
        g.remove_node(b).unwrap();
        let ab = g.arc_by_name("ab").unwrap();
        assert_eq!(g.arc(ab).unwrap().from(), Some(a));
        assert_eq!(g.arc(ab).unwrap().to(), None);
        assert_eq!(g.hyperarc(h).unwrap().nodes(), &[a]);
        assert!(g.validate().is_ok());
        // keys of surviving nodes are untouched
        assert_eq!(g.node(c).unwrap().name(), Name::from("c"));
        assert!(g.node_by_name("b").is_none());
    }

    #[test]
    fn copy_is_independent_and_compacted() {
        let (mut g, [_, b, _]) = triangle();
        g.remove_node(b);
        let (mut copy, mapping) = g.copy_with_mapping();
        assert_eq!(copy.node_count(), 2);
        assert_eq!(copy.arc_count(), 3);
        assert!(copy.validate().is_ok());
        let a_copy = mapping[&g.node_by_name("a").unwrap()];
        copy.node_mut(a_copy).unwrap().labels.insert("changed");
        let a = g.node_by_name("a").unwrap();
        assert!(!g.node(a).unwrap().labels.contains(&Label::from("changed")));
    }

    #[test]
    fn repair_names_renames_later_duplicates() {
        let (mut g, [a, _, _]) = triangle();
        // force a duplicate behind the index's back
        g.node_mut(a).unwrap().name = Name::from("b");
        assert!(g.validate().is_err());
        assert_eq!(g.repair_names(), 1);
        assert!(g.validate().is_ok());
        assert_eq!(g.node(a).unwrap().name(), Name::from("b"));
        assert!(g.node_by_name("b_1").is_some());
    }

    #[test]
    fn set_arc_end_rejects_dead_nodes() {
        let (mut g, [a, b, _]) = triangle();
        let ab = g.arc_by_name("ab").unwrap();
        g.remove_node(a);
        assert!(g.set_arc_end(ab, ArcEnd::From, Some(a)).is_err());
        g.set_arc_end(ab, ArcEnd::From, Some(b)).unwrap();
        assert_eq!(g.arc(ab).unwrap().from(), Some(b));
    }
}
