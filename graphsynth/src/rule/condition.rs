//! Per-element match conditions for the elements of a rule's left-hand side.

use crate::graph::{Label, LabelSet};

/// How an L element's labels are compared with a host element's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabelMatch {
    /// The host element carries every pattern label, and possibly more.
    #[default]
    Subset,
    /// The host element carries exactly the pattern labels.
    Exact,
    /// The host element carries at least one pattern label. An empty pattern matches anything.
    Any,
}

impl LabelMatch {
    pub fn matches(self, pattern: &LabelSet, host: &LabelSet) -> bool {
        match self {
            LabelMatch::Subset => host.contains_all(pattern),
            LabelMatch::Exact => host.set_eq(pattern),
            LabelMatch::Any => pattern.is_empty() || host.contains_any(pattern),
        }
    }
}

/// Label test shared by all element kinds: positive labels per `mode`, negated labels absent.
pub(crate) fn labels_satisfied(
    mode: LabelMatch,
    pattern: &LabelSet,
    negated: &LabelSet,
    host: &LabelSet,
) -> bool {
    mode.matches(pattern, host) && !host.contains_any(negated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
    GreaterOrEqual,
    Greater,
}

/// A test on one numeric variable of a host element: `variables[index] <comparison> value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableConstraint {
    pub index: usize,
    pub comparison: Comparison,
    pub value: f64,
    /// Slack for `Equal`/`NotEqual`.
    pub tolerance: f64,
}

impl VariableConstraint {
    pub fn new(index: usize, comparison: Comparison, value: f64) -> Self {
        VariableConstraint {
            index,
            comparison,
            value,
            tolerance: 1e-9,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// A missing variable never satisfies a constraint.
    pub fn holds(&self, variables: &[f64]) -> bool {
        let Some(&v) = variables.get(self.index) else {
            return false;
        };
        match self.comparison {
            Comparison::Less => v < self.value,
            Comparison::LessOrEqual => v <= self.value + self.tolerance,
            Comparison::Equal => (v - self.value).abs() <= self.tolerance,
            Comparison::NotEqual => (v - self.value).abs() > self.tolerance,
            Comparison::GreaterOrEqual => v >= self.value - self.tolerance,
            Comparison::Greater => v > self.value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeCondition {
    pub label_match: LabelMatch,
    pub negate_labels: LabelSet,
    /// Host degree must equal the L node's degree.
    pub strict_degree: bool,
    /// Host node must carry the same type tag as the L node.
    pub restrict_to_type: bool,
    /// The node is part of a negative application condition.
    pub not_exist: bool,
    pub variable_constraints: Vec<VariableConstraint>,
}

impl NodeCondition {
    pub fn new() -> Self {
        NodeCondition::default()
    }

    pub fn label_match(mut self, mode: LabelMatch) -> Self {
        self.label_match = mode;
        self
    }

    pub fn negate(mut self, label: impl Into<Label>) -> Self {
        self.negate_labels.insert(label);
        self
    }

    pub fn strict_degree(mut self) -> Self {
        self.strict_degree = true;
        self
    }

    pub fn restrict_to_type(mut self) -> Self {
        self.restrict_to_type = true;
        self
    }

    pub fn not_exist(mut self) -> Self {
        self.not_exist = true;
        self
    }

    pub fn constrain(mut self, constraint: VariableConstraint) -> Self {
        self.variable_constraints.push(constraint);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArcCondition {
    pub label_match: LabelMatch,
    pub negate_labels: LabelSet,
    /// Host `directed`/`doubly_directed` flags must equal the L arc's.
    pub direction_is_equal: bool,
    /// A dangling L end only matches a dangling host end.
    pub null_means_null: bool,
    pub not_exist: bool,
    pub variable_constraints: Vec<VariableConstraint>,
}

impl ArcCondition {
    pub fn new() -> Self {
        ArcCondition::default()
    }

    pub fn label_match(mut self, mode: LabelMatch) -> Self {
        self.label_match = mode;
        self
    }

    pub fn negate(mut self, label: impl Into<Label>) -> Self {
        self.negate_labels.insert(label);
        self
    }

    pub fn direction_is_equal(mut self) -> Self {
        self.direction_is_equal = true;
        self
    }

    pub fn null_means_null(mut self) -> Self {
        self.null_means_null = true;
        self
    }

    pub fn not_exist(mut self) -> Self {
        self.not_exist = true;
        self
    }

    pub fn constrain(mut self, constraint: VariableConstraint) -> Self {
        self.variable_constraints.push(constraint);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HyperArcCondition {
    pub label_match: LabelMatch,
    pub negate_labels: LabelSet,
    /// Host hyperarc must have exactly as many members as the L hyperarc.
    pub strict_node_count: bool,
    pub not_exist: bool,
    pub variable_constraints: Vec<VariableConstraint>,
}

impl HyperArcCondition {
    pub fn new() -> Self {
        HyperArcCondition::default()
    }

    pub fn label_match(mut self, mode: LabelMatch) -> Self {
        self.label_match = mode;
        self
    }

    pub fn negate(mut self, label: impl Into<Label>) -> Self {
        self.negate_labels.insert(label);
        self
    }

    pub fn strict_node_count(mut self) -> Self {
        self.strict_node_count = true;
        self
    }

    pub fn not_exist(mut self) -> Self {
        self.not_exist = true;
        self
    }

    pub fn constrain(mut self, constraint: VariableConstraint) -> Self {
        self.variable_constraints.push(constraint);
        self
    }
}
