//! A by-name form of [`Graph`] for storage collaborators.
//!
//! Descriptions reference nodes by name instead of by key, which is what a file format naturally
//! contains. [`GraphDescription::internally_connect`] resolves those names into a live graph.

use super::{Arc, Graph, GraphError, GraphResult, HyperArc, Name, Node, NodeKey};
use crate::util::log;
use error_stack::Report;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeDescription {
    pub name: String,
    pub labels: Vec<String>,
    pub variables: Vec<f64>,
    pub type_tag: Option<String>,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArcDescription {
    pub name: String,
    pub labels: Vec<String>,
    pub variables: Vec<f64>,
    pub type_tag: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub directed: bool,
    pub doubly_directed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HyperArcDescription {
    pub name: String,
    pub labels: Vec<String>,
    pub variables: Vec<f64>,
    pub type_tag: Option<String>,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphDescription {
    pub name: String,
    pub nodes: Vec<NodeDescription>,
    pub arcs: Vec<ArcDescription>,
    pub hyperarcs: Vec<HyperArcDescription>,
    pub global_labels: Vec<String>,
    pub global_variables: Vec<f64>,
}

impl GraphDescription {
    /// Resolves by-name references into a live [`Graph`].
    ///
    /// Duplicate node names make references ambiguous and are an error. Duplicate arc or
    /// hyperarc names are repaired by renaming, since nothing refers to them.
    pub fn internally_connect(&self) -> GraphResult<Graph> {
        let mut g = Graph::with_name(self.name.clone());
        g.global_labels = self.global_labels.iter().map(String::as_str).collect();
        g.global_variables = self.global_variables.clone();

        let mut by_name = HashMap::new();
        for desc in &self.nodes {
            let mut node = Node::new(desc.name.as_str())
                .with_labels(desc.labels.iter().map(String::as_str))
                .with_variables(desc.variables.clone());
            node.type_tag = desc.type_tag.as_deref().map(Into::into);
            node.position = desc.position;
            let key = g.add_node(node)?;
            by_name.insert(desc.name.as_str(), key);
        }

        let resolve = |name: &Option<String>| -> GraphResult<_> {
            match name {
                None => Ok(None),
                Some(name) => by_name
                    .get(name.as_str())
                    .copied()
                    .map(Some)
                    .ok_or_else(|| Report::new(GraphError::UnresolvedNodeName(name.clone()))),
            }
        };

        for desc in &self.arcs {
            let mut arc = Arc::dangling(desc.name.as_str(), resolve(&desc.from)?, resolve(&desc.to)?)
                .with_labels(desc.labels.iter().map(String::as_str))
                .with_variables(desc.variables.clone());
            arc.type_tag = desc.type_tag.as_deref().map(Into::into);
            arc.directed = desc.directed || desc.doubly_directed;
            arc.doubly_directed = desc.doubly_directed;
            let key = g.add_arc_unique(arc)?;
            if g.arc(key).is_some_and(|a| a.name() != Name::from(desc.name.as_str())) {
                log::warn!("arc name `{}` was repeated and has been renamed", desc.name);
            }
        }

        for desc in &self.hyperarcs {
            let mut members = Vec::with_capacity(desc.nodes.len());
            for member in &desc.nodes {
                let key = by_name
                    .get(member.as_str())
                    .copied()
                    .ok_or_else(|| Report::new(GraphError::UnresolvedNodeName(member.clone())))?;
                members.push(key);
            }
            let mut hyperarc = HyperArc::new(desc.name.as_str(), members)
                .with_labels(desc.labels.iter().map(String::as_str))
                .with_variables(desc.variables.clone());
            hyperarc.type_tag = desc.type_tag.as_deref().map(Into::into);
            let key = g.add_hyperarc_unique(hyperarc)?;
            if g.hyperarc(key).is_some_and(|h| h.name() != Name::from(desc.name.as_str())) {
                log::warn!("hyperarc name `{}` was repeated and has been renamed", desc.name);
            }
        }

        Ok(g)
    }
}

impl Graph {
    /// The by-name form of this graph.
    pub fn describe(&self) -> GraphDescription {
        let node_name = |key: NodeKey| self.node(key).map(|n: &Node| n.name().to_string());
        GraphDescription {
            name: self.name.clone(),
            nodes: self
                .nodes()
                .map(|(_, n)| NodeDescription {
                    name: n.name().to_string(),
                    labels: n.labels.iter().map(|l| l.to_string()).collect(),
                    variables: n.variables.clone(),
                    type_tag: n.type_tag.map(|t| t.to_string()),
                    position: n.position,
                })
                .collect(),
            arcs: self
                .arcs()
                .map(|(_, a)| ArcDescription {
                    name: a.name().to_string(),
                    labels: a.labels.iter().map(|l| l.to_string()).collect(),
                    variables: a.variables.clone(),
                    type_tag: a.type_tag.map(|t| t.to_string()),
                    from: a.from().and_then(node_name),
                    to: a.to().and_then(node_name),
                    directed: a.directed,
                    doubly_directed: a.doubly_directed,
                })
                .collect(),
            hyperarcs: self
                .hyperarcs()
                .map(|(_, h)| HyperArcDescription {
                    name: h.name().to_string(),
                    labels: h.labels.iter().map(|l| l.to_string()).collect(),
                    variables: h.variables.clone(),
                    type_tag: h.type_tag.map(|t| t.to_string()),
                    nodes: h.nodes().iter().filter_map(|&k| node_name(k)).collect(),
                })
                .collect(),
            global_labels: self.global_labels.iter().map(|l| l.to_string()).collect(),
            global_variables: self.global_variables.clone(),
        }
    }
}

impl TryFrom<GraphDescription> for Graph {
    type Error = Report<GraphError>;

    fn try_from(value: GraphDescription) -> Result<Self, Self::Error> {
        value.internally_connect()
    }
}

impl From<Graph> for GraphDescription {
    fn from(value: Graph) -> Self {
        value.describe()
    }
}
