//! Grammar rules: an L/K/R triple of graphs plus everything that restricts where L may match
//! and how R is embedded into the host.
//!
//! L is the pattern to find, R its replacement and K (the context) the elements shared by both,
//! identified by name. A [`GrammarRule`] is only obtainable through [`RuleBuilder::build`], which
//! checks the triple for consistency, so the recognizer and applier can rely on it.

use crate::graph::{
    Arc, ArcEnd, ArcKey, Graph, HyperArc, HyperArcKey, Label, LabelSet, Name, NodeKey,
};
use crate::util::bimap::BiMap;
use error_stack::{Report, ResultExt};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub mod condition;
pub mod embedding;

pub use condition::{
    ArcCondition, Comparison, HyperArcCondition, LabelMatch, NodeCondition, VariableConstraint,
};
pub use embedding::{ArcDirection, EmbeddingRule};

pub type RuleResult<T> = Result<T, Report<RuleError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Side {
    L,
    K,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ElementKind {
    #[display("node")]
    Node,
    #[display("arc")]
    Arc,
    #[display("hyperarc")]
    HyperArc,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("the {0} graph is malformed")]
    MalformedGraph(Side),
    #[error("context {kind} `{name}` has no counterpart in {side}")]
    ContextElementMissing {
        side: Side,
        kind: ElementKind,
        name: Name,
    },
    #[error("context {kind} `{name}` is connected differently in L, K and R")]
    ContextConnectionMismatch { kind: ElementKind, name: Name },
    #[error("negative {kind} `{name}` cannot be part of the context")]
    NegativeElementInContext { kind: ElementKind, name: Name },
    #[error("{kind} `{name}` touches a negative node but is not negative itself")]
    AttachedToNegativeNode { kind: ElementKind, name: Name },
    #[error("a condition refers to {kind} `{name}`, which is not in L")]
    UnknownConditionTarget { kind: ElementKind, name: Name },
    #[error("an embedding rule refers to node `{name}`, which is not in {side}")]
    UnknownEmbeddingNode { side: Side, name: Name },
}

static DEFAULT_NODE_CONDITION: NodeCondition = NodeCondition {
    label_match: LabelMatch::Subset,
    negate_labels: LabelSet::new(),
    strict_degree: false,
    restrict_to_type: false,
    not_exist: false,
    variable_constraints: Vec::new(),
};

static DEFAULT_ARC_CONDITION: ArcCondition = ArcCondition {
    label_match: LabelMatch::Subset,
    negate_labels: LabelSet::new(),
    direction_is_equal: false,
    null_means_null: false,
    not_exist: false,
    variable_constraints: Vec::new(),
};

static DEFAULT_HYPERARC_CONDITION: HyperArcCondition = HyperArcCondition {
    label_match: LabelMatch::Subset,
    negate_labels: LabelSet::new(),
    strict_node_count: false,
    not_exist: false,
    variable_constraints: Vec::new(),
};

/// The unchecked parts of a rule. Also the rule's serialized form.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuleBuilder {
    pub name: String,
    pub l: Graph,
    /// Derived from the names L and R share when absent.
    pub k: Option<Graph>,
    pub r: Graph,
    pub node_conditions: BTreeMap<Name, NodeCondition>,
    pub arc_conditions: BTreeMap<Name, ArcCondition>,
    pub hyperarc_conditions: BTreeMap<Name, HyperArcCondition>,
    pub negate_global_labels: LabelSet,
    pub contains_all_global_labels: bool,
    pub ordered_global_labels: bool,
    pub global_variable_constraints: Vec<VariableConstraint>,
    pub spanning: bool,
    pub induced: bool,
    pub transform_node_positions: bool,
    pub embedding_rules: Vec<EmbeddingRule>,
}

impl RuleBuilder {
    pub fn new(name: impl Into<String>, l: Graph, r: Graph) -> Self {
        RuleBuilder {
            name: name.into(),
            l,
            r,
            ..RuleBuilder::default()
        }
    }

    pub fn context(mut self, k: Graph) -> Self {
        self.k = Some(k);
        self
    }

    pub fn node_condition(mut self, name: impl Into<Name>, condition: NodeCondition) -> Self {
        self.node_conditions.insert(name.into(), condition);
        self
    }

    pub fn arc_condition(mut self, name: impl Into<Name>, condition: ArcCondition) -> Self {
        self.arc_conditions.insert(name.into(), condition);
        self
    }

    pub fn hyperarc_condition(
        mut self,
        name: impl Into<Name>,
        condition: HyperArcCondition,
    ) -> Self {
        self.hyperarc_conditions.insert(name.into(), condition);
        self
    }

    pub fn negate_global_label(mut self, label: impl Into<Label>) -> Self {
        self.negate_global_labels.insert(label);
        self
    }

    pub fn contains_all_global_labels(mut self) -> Self {
        self.contains_all_global_labels = true;
        self
    }

    pub fn ordered_global_labels(mut self) -> Self {
        self.ordered_global_labels = true;
        self
    }

    pub fn global_variable_constraint(mut self, constraint: VariableConstraint) -> Self {
        self.global_variable_constraints.push(constraint);
        self
    }

    pub fn spanning(mut self) -> Self {
        self.spanning = true;
        self
    }

    pub fn induced(mut self) -> Self {
        self.induced = true;
        self
    }

    pub fn transform_node_positions(mut self) -> Self {
        self.transform_node_positions = true;
        self
    }

    pub fn embedding_rule(mut self, rule: EmbeddingRule) -> Self {
        self.embedding_rules.push(rule);
        self
    }

    pub fn build(self) -> RuleResult<GrammarRule> {
        let name = self.name.clone();
        self.assemble()
            .attach_printable_lazy(|| format!("while building rule `{name}`"))
    }

    fn assemble(self) -> RuleResult<GrammarRule> {
        self.l
            .validate()
            .change_context(RuleError::MalformedGraph(Side::L))?;
        self.r
            .validate()
            .change_context(RuleError::MalformedGraph(Side::R))?;
        // compacting makes L's keys dense, so per-element tables can be indexed by key
        let l = self.l.copy();
        let r = self.r.copy();

        for name in self.node_conditions.keys() {
            if l.node_by_name(name).is_none() {
                return Err(unknown_target(ElementKind::Node, *name));
            }
        }
        for name in self.arc_conditions.keys() {
            if l.arc_by_name(name).is_none() {
                return Err(unknown_target(ElementKind::Arc, *name));
            }
        }
        for name in self.hyperarc_conditions.keys() {
            if l.hyperarc_by_name(name).is_none() {
                return Err(unknown_target(ElementKind::HyperArc, *name));
            }
        }
        let node_conditions: Vec<NodeCondition> = l
            .nodes()
            .map(|(_, n)| self.node_conditions.get(&n.name()).cloned().unwrap_or_default())
            .collect();
        let arc_conditions: Vec<ArcCondition> = l
            .arcs()
            .map(|(_, a)| self.arc_conditions.get(&a.name()).cloned().unwrap_or_default())
            .collect();
        let hyperarc_conditions: Vec<HyperArcCondition> = l
            .hyperarcs()
            .map(|(_, h)| self.hyperarc_conditions.get(&h.name()).cloned().unwrap_or_default())
            .collect();

        let negative_node = |key: NodeKey| node_conditions[key.index()].not_exist;
        for (key, arc) in l.arcs() {
            let touches_negative = [arc.from(), arc.to()].into_iter().flatten().any(negative_node);
            if touches_negative && !arc_conditions[key.index()].not_exist {
                return Err(Report::new(RuleError::AttachedToNegativeNode {
                    kind: ElementKind::Arc,
                    name: arc.name(),
                }));
            }
        }
        for (key, hyperarc) in l.hyperarcs() {
            let touches_negative = hyperarc.nodes().iter().any(|&n| negative_node(n));
            if touches_negative && !hyperarc_conditions[key.index()].not_exist {
                return Err(Report::new(RuleError::AttachedToNegativeNode {
                    kind: ElementKind::HyperArc,
                    name: hyperarc.name(),
                }));
            }
        }

        let k = match self.k {
            Some(k) => {
                k.validate()
                    .change_context(RuleError::MalformedGraph(Side::K))?;
                check_context(&l, &k, &r)?;
                k.copy()
            }
            None => derive_context(&l, &r)?,
        };

        let mut nodes_lr = BiMap::new();
        for (_, node) in k.nodes() {
            if let (Some(lk), Some(rk)) = (l.node_by_name(&node.name()), r.node_by_name(&node.name())) {
                if node_conditions[lk.index()].not_exist {
                    return Err(in_context(ElementKind::Node, node.name()));
                }
                nodes_lr.insert(lk, rk);
            }
        }
        let mut arcs_lr = BiMap::new();
        for (_, arc) in k.arcs() {
            if let (Some(lk), Some(rk)) = (l.arc_by_name(&arc.name()), r.arc_by_name(&arc.name())) {
                if arc_conditions[lk.index()].not_exist {
                    return Err(in_context(ElementKind::Arc, arc.name()));
                }
                arcs_lr.insert(lk, rk);
            }
        }
        let mut hyperarcs_lr = BiMap::new();
        for (_, hyperarc) in k.hyperarcs() {
            if let (Some(lk), Some(rk)) = (
                l.hyperarc_by_name(&hyperarc.name()),
                r.hyperarc_by_name(&hyperarc.name()),
            ) {
                if hyperarc_conditions[lk.index()].not_exist {
                    return Err(in_context(ElementKind::HyperArc, hyperarc.name()));
                }
                hyperarcs_lr.insert(lk, rk);
            }
        }

        for embedding in &self.embedding_rules {
            if r.node_by_name(&embedding.r_node_name).is_none() {
                return Err(Report::new(RuleError::UnknownEmbeddingNode {
                    side: Side::R,
                    name: embedding.r_node_name,
                }));
            }
            if let Some(l_name) = embedding.l_node_name {
                if l.node_by_name(&l_name).is_none() {
                    return Err(Report::new(RuleError::UnknownEmbeddingNode {
                        side: Side::L,
                        name: l_name,
                    }));
                }
            }
        }

        Ok(GrammarRule {
            name: self.name,
            l,
            k,
            r,
            node_conditions,
            arc_conditions,
            hyperarc_conditions,
            negate_global_labels: self.negate_global_labels,
            contains_all_global_labels: self.contains_all_global_labels,
            ordered_global_labels: self.ordered_global_labels,
            global_variable_constraints: self.global_variable_constraints,
            spanning: self.spanning,
            induced: self.induced,
            transform_node_positions: self.transform_node_positions,
            embedding_rules: self.embedding_rules,
            nodes_lr,
            arcs_lr,
            hyperarcs_lr,
        })
    }
}

fn unknown_target(kind: ElementKind, name: Name) -> Report<RuleError> {
    Report::new(RuleError::UnknownConditionTarget { kind, name })
}

fn in_context(kind: ElementKind, name: Name) -> Report<RuleError> {
    Report::new(RuleError::NegativeElementInContext { kind, name })
}

fn missing(side: Side, kind: ElementKind, name: Name) -> Report<RuleError> {
    Report::new(RuleError::ContextElementMissing { side, kind, name })
}

fn node_name(g: &Graph, key: Option<NodeKey>) -> Option<Name> {
    key.and_then(|k| g.node(k)).map(|n| n.name())
}

/// An explicit K must name elements present on both sides, and everything K connects must be
/// connected the same way in L and in R.
fn check_context(l: &Graph, k: &Graph, r: &Graph) -> RuleResult<()> {
    for (_, node) in k.nodes() {
        for (side, g) in [(Side::L, l), (Side::R, r)] {
            if g.node_by_name(&node.name()).is_none() {
                return Err(missing(side, ElementKind::Node, node.name()));
            }
        }
    }
    for (_, arc) in k.arcs() {
        for (side, g) in [(Side::L, l), (Side::R, r)] {
            let Some(other) = g.arc_by_name(&arc.name()).and_then(|key| g.arc(key)) else {
                return Err(missing(side, ElementKind::Arc, arc.name()));
            };
            for end in [ArcEnd::From, ArcEnd::To] {
                if arc.end(end).is_some() && node_name(k, arc.end(end)) != node_name(g, other.end(end)) {
                    return Err(Report::new(RuleError::ContextConnectionMismatch {
                        kind: ElementKind::Arc,
                        name: arc.name(),
                    }))
                    .attach_printable_lazy(|| format!("{end:?} end differs in {side}"));
                }
            }
        }
    }
    for (_, hyperarc) in k.hyperarcs() {
        for (side, g) in [(Side::L, l), (Side::R, r)] {
            let Some(other) = g
                .hyperarc_by_name(&hyperarc.name())
                .and_then(|key| g.hyperarc(key))
            else {
                return Err(missing(side, ElementKind::HyperArc, hyperarc.name()));
            };
            let members: Vec<Option<Name>> =
                other.nodes().iter().map(|&n| node_name(g, Some(n))).collect();
            let all_present = hyperarc
                .nodes()
                .iter()
                .all(|&n| members.contains(&node_name(k, Some(n))));
            if !all_present {
                return Err(Report::new(RuleError::ContextConnectionMismatch {
                    kind: ElementKind::HyperArc,
                    name: hyperarc.name(),
                }));
            }
        }
    }
    Ok(())
}

/// K as the elements whose names occur in both L and R. Arc ends and hyperarc members are only
/// part of K where L and R agree on them.
fn derive_context(l: &Graph, r: &Graph) -> RuleResult<Graph> {
    let mut k = Graph::new();
    let mut k_nodes = HashMap::new();

    for (_, node) in l.nodes() {
        let Some(r_node) = r.node_by_name(&node.name()).and_then(|key| r.node(key)) else {
            continue;
        };
        let mut shared = node.clone();
        shared.labels = node
            .labels
            .iter()
            .filter(|label| r_node.labels.contains(label))
            .copied()
            .collect();
        k_nodes.insert(node.name(), k.add_node_unique(shared));
    }

    for (_, arc) in l.arcs() {
        let Some(r_arc) = r.arc_by_name(&arc.name()).and_then(|key| r.arc(key)) else {
            continue;
        };
        let shared_end = |end: ArcEnd| match (node_name(l, arc.end(end)), node_name(r, r_arc.end(end))) {
            (Some(a), Some(b)) if a == b => k_nodes.get(&a).copied(),
            _ => None,
        };
        let mut shared = Arc::dangling(arc.name(), shared_end(ArcEnd::From), shared_end(ArcEnd::To))
            .with_labels(arc.labels.iter().filter(|label| r_arc.labels.contains(label)).copied());
        shared.directed = arc.directed;
        shared.doubly_directed = arc.doubly_directed;
        k.add_arc_unique(shared)
            .change_context(RuleError::MalformedGraph(Side::K))?;
    }

    for (_, hyperarc) in l.hyperarcs() {
        let Some(r_hyperarc) = r
            .hyperarc_by_name(&hyperarc.name())
            .and_then(|key| r.hyperarc(key))
        else {
            continue;
        };
        let r_members: Vec<Option<Name>> = r_hyperarc
            .nodes()
            .iter()
            .map(|&n| node_name(r, Some(n)))
            .collect();
        let members = hyperarc
            .nodes()
            .iter()
            .filter_map(|&n| node_name(l, Some(n)))
            .filter(|name| r_members.contains(&Some(*name)))
            .filter_map(|name| k_nodes.get(&name).copied());
        let shared = HyperArc::new(hyperarc.name(), members).with_labels(
            hyperarc
                .labels
                .iter()
                .filter(|label| r_hyperarc.labels.contains(label))
                .copied(),
        );
        k.add_hyperarc_unique(shared)
            .change_context(RuleError::MalformedGraph(Side::K))?;
    }

    Ok(k)
}

/// A validated grammar rule. Build one with [`GrammarRule::builder`].
///
/// L is stored compacted: its keys are dense, in insertion order, and a
/// [`RuleOption`](crate::RuleOption)'s per-element vectors are indexed by them.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RuleBuilder", into = "RuleBuilder"))]
pub struct GrammarRule {
    name: String,
    l: Graph,
    k: Graph,
    r: Graph,
    node_conditions: Vec<NodeCondition>,
    arc_conditions: Vec<ArcCondition>,
    hyperarc_conditions: Vec<HyperArcCondition>,
    negate_global_labels: LabelSet,
    contains_all_global_labels: bool,
    ordered_global_labels: bool,
    global_variable_constraints: Vec<VariableConstraint>,
    spanning: bool,
    induced: bool,
    transform_node_positions: bool,
    embedding_rules: Vec<EmbeddingRule>,
    nodes_lr: BiMap<NodeKey, NodeKey>,
    arcs_lr: BiMap<ArcKey, ArcKey>,
    hyperarcs_lr: BiMap<HyperArcKey, HyperArcKey>,
}

impl GrammarRule {
    pub fn builder(name: impl Into<String>, l: Graph, r: Graph) -> RuleBuilder {
        RuleBuilder::new(name, l, r)
    }

    /// A rule without conditions whose context is derived from the names L and R share.
    pub fn new(name: impl Into<String>, l: Graph, r: Graph) -> RuleResult<Self> {
        RuleBuilder::new(name, l, r).build()
    }

    /// A rule without conditions with an explicit context.
    pub fn with_context(name: impl Into<String>, l: Graph, k: Graph, r: Graph) -> RuleResult<Self> {
        RuleBuilder::new(name, l, r).context(k).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn l(&self) -> &Graph {
        &self.l
    }

    pub fn k(&self) -> &Graph {
        &self.k
    }

    pub fn r(&self) -> &Graph {
        &self.r
    }

    pub fn node_condition(&self, l_node: NodeKey) -> &NodeCondition {
        self.node_conditions
            .get(l_node.index())
            .unwrap_or(&DEFAULT_NODE_CONDITION)
    }

    pub fn arc_condition(&self, l_arc: ArcKey) -> &ArcCondition {
        self.arc_conditions
            .get(l_arc.index())
            .unwrap_or(&DEFAULT_ARC_CONDITION)
    }

    pub fn hyperarc_condition(&self, l_hyperarc: HyperArcKey) -> &HyperArcCondition {
        self.hyperarc_conditions
            .get(l_hyperarc.index())
            .unwrap_or(&DEFAULT_HYPERARC_CONDITION)
    }

    pub fn negate_global_labels(&self) -> &LabelSet {
        &self.negate_global_labels
    }

    pub fn contains_all_global_labels(&self) -> bool {
        self.contains_all_global_labels
    }

    pub fn ordered_global_labels(&self) -> bool {
        self.ordered_global_labels
    }

    pub fn global_variable_constraints(&self) -> &[VariableConstraint] {
        &self.global_variable_constraints
    }

    pub fn spanning(&self) -> bool {
        self.spanning
    }

    pub fn induced(&self) -> bool {
        self.induced
    }

    pub fn transform_node_positions(&self) -> bool {
        self.transform_node_positions
    }

    pub fn embedding_rules(&self) -> &[EmbeddingRule] {
        &self.embedding_rules
    }

    /// The R counterpart of a context node of L.
    pub fn r_node_of(&self, l_node: NodeKey) -> Option<NodeKey> {
        self.nodes_lr.get_left(&l_node).copied()
    }

    /// The L counterpart of a context node of R.
    pub fn l_node_of(&self, r_node: NodeKey) -> Option<NodeKey> {
        self.nodes_lr.get_right(&r_node).copied()
    }

    pub fn r_arc_of(&self, l_arc: ArcKey) -> Option<ArcKey> {
        self.arcs_lr.get_left(&l_arc).copied()
    }

    pub fn l_arc_of(&self, r_arc: ArcKey) -> Option<ArcKey> {
        self.arcs_lr.get_right(&r_arc).copied()
    }

    pub fn r_hyperarc_of(&self, l_hyperarc: HyperArcKey) -> Option<HyperArcKey> {
        self.hyperarcs_lr.get_left(&l_hyperarc).copied()
    }

    pub fn l_hyperarc_of(&self, r_hyperarc: HyperArcKey) -> Option<HyperArcKey> {
        self.hyperarcs_lr.get_right(&r_hyperarc).copied()
    }

    pub fn is_negative_node(&self, l_node: NodeKey) -> bool {
        self.node_condition(l_node).not_exist
    }

    pub fn is_negative_arc(&self, l_arc: ArcKey) -> bool {
        self.arc_condition(l_arc).not_exist
    }

    pub fn is_negative_hyperarc(&self, l_hyperarc: HyperArcKey) -> bool {
        self.hyperarc_condition(l_hyperarc).not_exist
    }

    /// Whether the rule has any negative application condition.
    pub fn has_negative_elements(&self) -> bool {
        self.node_conditions.iter().any(|c| c.not_exist)
            || self.arc_conditions.iter().any(|c| c.not_exist)
            || self.hyperarc_conditions.iter().any(|c| c.not_exist)
    }

    /// The parts this rule was built from, with the context made explicit.
    pub fn to_builder(&self) -> RuleBuilder {
        fn non_default<C: Default + PartialEq + Clone>(
            names: impl Iterator<Item = Name>,
            conditions: &[C],
        ) -> BTreeMap<Name, C> {
            names
                .zip(conditions)
                .filter(|(_, c)| **c != C::default())
                .map(|(name, c)| (name, c.clone()))
                .collect()
        }

        RuleBuilder {
            name: self.name.clone(),
            l: self.l.clone(),
            k: Some(self.k.clone()),
            r: self.r.clone(),
            node_conditions: non_default(self.l.nodes().map(|(_, n)| n.name()), &self.node_conditions),
            arc_conditions: non_default(self.l.arcs().map(|(_, a)| a.name()), &self.arc_conditions),
            hyperarc_conditions: non_default(
                self.l.hyperarcs().map(|(_, h)| h.name()),
                &self.hyperarc_conditions,
            ),
            negate_global_labels: self.negate_global_labels.clone(),
            contains_all_global_labels: self.contains_all_global_labels,
            ordered_global_labels: self.ordered_global_labels,
            global_variable_constraints: self.global_variable_constraints.clone(),
            spanning: self.spanning,
            induced: self.induced,
            transform_node_positions: self.transform_node_positions,
            embedding_rules: self.embedding_rules.clone(),
        }
    }
}

impl TryFrom<RuleBuilder> for GrammarRule {
    type Error = Report<RuleError>;

    fn try_from(value: RuleBuilder) -> Result<Self, Self::Error> {
        value.build()
    }
}

impl From<GrammarRule> for RuleBuilder {
    fn from(value: GrammarRule) -> Self {
        value.to_builder()
    }
}
