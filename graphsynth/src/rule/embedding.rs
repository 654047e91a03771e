//! Embedding rules: how free arcs left behind by deleted nodes are reattached to R.

use crate::graph::{ArcEnd, Label, LabelSet, Name};

/// Direction of a free arc relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArcDirection {
    /// For matching: either direction. For reattachment: keep the arc's orientation.
    #[default]
    Any,
    /// The arc points at the node.
    Into,
    /// The arc leaves the node.
    OutOf,
}

impl ArcDirection {
    /// The direction of an arc relative to the node attached at `end`.
    pub(crate) fn at_end(end: ArcEnd) -> ArcDirection {
        match end {
            ArcEnd::To => ArcDirection::Into,
            ArcEnd::From => ArcDirection::OutOf,
        }
    }

    /// Whether an arc with this actual direction satisfies the required one.
    /// Unoriented arcs satisfy every requirement.
    pub(crate) fn admits(self, actual: ArcDirection, oriented: bool) -> bool {
        !oriented || self == ArcDirection::Any || self == actual
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmbeddingRule {
    pub free_arc_labels: LabelSet,
    pub free_arc_negabels: LabelSet,
    pub neighbor_node_labels: LabelSet,
    pub neighbor_node_negabels: LabelSet,
    /// Only arcs freed by deleting the host image of this L node.
    pub l_node_name: Option<Name>,
    pub original_direction: ArcDirection,
    /// The R node the free end is attached to.
    pub r_node_name: Name,
    pub new_direction: ArcDirection,
    pub allow_arc_duplication: bool,
}

impl EmbeddingRule {
    pub fn new(r_node_name: impl Into<Name>) -> Self {
        EmbeddingRule {
            free_arc_labels: LabelSet::new(),
            free_arc_negabels: LabelSet::new(),
            neighbor_node_labels: LabelSet::new(),
            neighbor_node_negabels: LabelSet::new(),
            l_node_name: None,
            original_direction: ArcDirection::Any,
            r_node_name: r_node_name.into(),
            new_direction: ArcDirection::Any,
            allow_arc_duplication: false,
        }
    }

    pub fn from_l_node(mut self, name: impl Into<Name>) -> Self {
        self.l_node_name = Some(name.into());
        self
    }

    pub fn arc_label(mut self, label: impl Into<Label>) -> Self {
        self.free_arc_labels.insert(label);
        self
    }

    pub fn arc_negabel(mut self, label: impl Into<Label>) -> Self {
        self.free_arc_negabels.insert(label);
        self
    }

    pub fn neighbor_label(mut self, label: impl Into<Label>) -> Self {
        self.neighbor_node_labels.insert(label);
        self
    }

    pub fn neighbor_negabel(mut self, label: impl Into<Label>) -> Self {
        self.neighbor_node_negabels.insert(label);
        self
    }

    pub fn original_direction(mut self, direction: ArcDirection) -> Self {
        self.original_direction = direction;
        self
    }

    pub fn new_direction(mut self, direction: ArcDirection) -> Self {
        self.new_direction = direction;
        self
    }

    pub fn allow_duplication(mut self) -> Self {
        self.allow_arc_duplication = true;
        self
    }

    /// Everything but the deleted node's identity, which the applier checks.
    pub(crate) fn admits(
        &self,
        arc_labels: &LabelSet,
        neighbor_labels: Option<&LabelSet>,
        direction: ArcDirection,
        oriented: bool,
    ) -> bool {
        if !arc_labels.contains_all(&self.free_arc_labels)
            || arc_labels.contains_any(&self.free_arc_negabels)
        {
            return false;
        }
        let neighbor_ok = match neighbor_labels {
            Some(labels) => {
                labels.contains_all(&self.neighbor_node_labels)
                    && !labels.contains_any(&self.neighbor_node_negabels)
            }
            None => self.neighbor_node_labels.is_empty(),
        };
        neighbor_ok && self.original_direction.admits(direction, oriented)
    }
}
