//! Nodes, arcs and hyperarcs, and the attributes they share.

use crate::interned_string_newtype;
use crate::util::InternString;
use derive_more::From;

/// Identifies a node inside one [`Graph`](crate::Graph). Never reused after removal.
#[derive(Hash, Eq, PartialEq, derive_more::Debug, Clone, Copy, PartialOrd, Ord, From)]
#[debug("N({_0})")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeKey(pub u32);

/// Identifies an arc inside one [`Graph`](crate::Graph). Never reused after removal.
#[derive(Hash, Eq, PartialEq, derive_more::Debug, Clone, Copy, PartialOrd, Ord, From)]
#[debug("A({_0})")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArcKey(pub u32);

/// Identifies a hyperarc inside one [`Graph`](crate::Graph). Never reused after removal.
#[derive(Hash, Eq, PartialEq, derive_more::Debug, Clone, Copy, PartialOrd, Ord, From)]
#[debug("H({_0})")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HyperArcKey(pub u32);

impl NodeKey {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ArcKey {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl HyperArcKey {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A string tag attached to an element or to a whole graph.
#[derive(derive_more::Debug, derive_more::Display, Clone, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[debug("{_0}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label(pub InternString);
interned_string_newtype!(Label);

/// The name of an element, unique among the elements of its kind in the owning graph.
#[derive(derive_more::Debug, derive_more::Display, Clone, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[debug("{_0}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name(pub InternString);
interned_string_newtype!(Name);

/// Tags an element with a user-defined kind. Elements with a tag are still plain nodes/arcs; the
/// tag is data that rules may restrict matching on and that added elements inherit from R.
#[derive(derive_more::Debug, derive_more::Display, Clone, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
#[debug("{_0}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeTag(pub InternString);
interned_string_newtype!(TypeTag);

/// An insertion-ordered set of labels.
///
/// Element label lists are short, so this is a deduplicated vector rather than a hash set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    pub const fn new() -> Self {
        LabelSet(Vec::new())
    }

    /// Returns `true` if the label was not present yet.
    pub fn insert(&mut self, label: impl Into<Label>) -> bool {
        let label = label.into();
        if self.0.contains(&label) {
            return false;
        }
        self.0.push(label);
        true
    }

    /// Returns `true` if the label was present.
    pub fn remove(&mut self, label: &Label) -> bool {
        match self.0.iter().position(|l| l == label) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.0
    }

    /// Every label of `other` is also in `self`.
    pub fn contains_all(&self, other: &LabelSet) -> bool {
        other.iter().all(|l| self.contains(l))
    }

    /// At least one label of `other` is in `self`.
    pub fn contains_any(&self, other: &LabelSet) -> bool {
        other.iter().any(|l| self.contains(l))
    }

    /// Same labels, ignoring order.
    pub fn set_eq(&self, other: &LabelSet) -> bool {
        self.len() == other.len() && self.contains_all(other)
    }
}

impl<L: Into<Label>> FromIterator<L> for LabelSet {
    fn from_iter<T: IntoIterator<Item = L>>(iter: T) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

/// Attributes every element kind carries.
pub trait GraphElement {
    fn name(&self) -> Name;
    fn labels(&self) -> &LabelSet;
    fn labels_mut(&mut self) -> &mut LabelSet;
    fn variables(&self) -> &[f64];
    fn variables_mut(&mut self) -> &mut Vec<f64>;
    fn type_tag(&self) -> Option<TypeTag>;
    fn set_type_tag(&mut self, tag: Option<TypeTag>);
}

macro_rules! impl_graph_element {
    ($ty:ident) => {
        impl GraphElement for $ty {
            fn name(&self) -> Name {
                self.name
            }

            fn labels(&self) -> &LabelSet {
                &self.labels
            }

            fn labels_mut(&mut self) -> &mut LabelSet {
                &mut self.labels
            }

            fn variables(&self) -> &[f64] {
                &self.variables
            }

            fn variables_mut(&mut self) -> &mut Vec<f64> {
                &mut self.variables
            }

            fn type_tag(&self) -> Option<TypeTag> {
                self.type_tag
            }

            fn set_type_tag(&mut self, tag: Option<TypeTag>) {
                self.type_tag = tag;
            }
        }

        impl $ty {
            pub fn name(&self) -> Name {
                self.name
            }

            pub fn with_label(mut self, label: impl Into<Label>) -> Self {
                self.labels.insert(label);
                self
            }

            pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<Label>>) -> Self {
                for label in labels {
                    self.labels.insert(label);
                }
                self
            }

            pub fn with_variables(mut self, variables: impl Into<Vec<f64>>) -> Self {
                self.variables = variables.into();
                self
            }

            pub fn with_type(mut self, tag: impl Into<TypeTag>) -> Self {
                self.type_tag = Some(tag.into());
                self
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) name: Name,
    pub labels: LabelSet,
    pub variables: Vec<f64>,
    pub type_tag: Option<TypeTag>,
    /// Cosmetic only. Matching never looks at it.
    pub position: [f64; 3],
}

impl Node {
    pub fn new(name: impl Into<Name>) -> Self {
        Node {
            name: name.into(),
            labels: LabelSet::new(),
            variables: Vec::new(),
            type_tag: None,
            position: [0.0; 3],
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = [x, y, z];
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub(crate) name: Name,
    pub labels: LabelSet,
    pub variables: Vec<f64>,
    pub type_tag: Option<TypeTag>,
    pub(crate) from: Option<NodeKey>,
    pub(crate) to: Option<NodeKey>,
    pub directed: bool,
    /// Arrow heads on both ends. Orientation is then irrelevant for matching.
    pub doubly_directed: bool,
}

impl Arc {
    /// A directed arc from `from` to `to`.
    pub fn between(name: impl Into<Name>, from: NodeKey, to: NodeKey) -> Self {
        Arc::dangling(name, Some(from), Some(to))
    }

    /// An arc whose ends may be unattached.
    pub fn dangling(name: impl Into<Name>, from: Option<NodeKey>, to: Option<NodeKey>) -> Self {
        Arc {
            name: name.into(),
            labels: LabelSet::new(),
            variables: Vec::new(),
            type_tag: None,
            from,
            to,
            directed: true,
            doubly_directed: false,
        }
    }

    pub fn undirected(mut self) -> Self {
        self.directed = false;
        self
    }

    pub fn doubly_directed(mut self) -> Self {
        self.directed = true;
        self.doubly_directed = true;
        self
    }

    pub fn from(&self) -> Option<NodeKey> {
        self.from
    }

    pub fn to(&self) -> Option<NodeKey> {
        self.to
    }

    pub fn end(&self, end: ArcEnd) -> Option<NodeKey> {
        match end {
            ArcEnd::From => self.from,
            ArcEnd::To => self.to,
        }
    }

    /// Orientation matters for this arc.
    pub fn is_oriented(&self) -> bool {
        self.directed && !self.doubly_directed
    }

    /// The end opposite to `node`, if `node` is attached at exactly one end.
    pub fn other_end(&self, node: NodeKey) -> Option<Option<NodeKey>> {
        if self.from == Some(node) {
            Some(self.to)
        } else if self.to == Some(node) {
            Some(self.from)
        } else {
            None
        }
    }
}

/// One of the two ends of an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArcEnd {
    From,
    To,
}

impl ArcEnd {
    pub fn opposite(self) -> ArcEnd {
        match self {
            ArcEnd::From => ArcEnd::To,
            ArcEnd::To => ArcEnd::From,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HyperArc {
    pub(crate) name: Name,
    pub labels: LabelSet,
    pub variables: Vec<f64>,
    pub type_tag: Option<TypeTag>,
    pub(crate) nodes: Vec<NodeKey>,
}

impl HyperArc {
    pub fn new(name: impl Into<Name>, nodes: impl IntoIterator<Item = NodeKey>) -> Self {
        let mut members = Vec::new();
        for node in nodes {
            if !members.contains(&node) {
                members.push(node);
            }
        }
        HyperArc {
            name: name.into(),
            labels: LabelSet::new(),
            variables: Vec::new(),
            type_tag: None,
            nodes: members,
        }
    }

    pub fn nodes(&self) -> &[NodeKey] {
        &self.nodes
    }

    pub fn contains(&self, node: NodeKey) -> bool {
        self.nodes.contains(&node)
    }
}

impl_graph_element!(Node);
impl_graph_element!(Arc);
impl_graph_element!(HyperArc);
