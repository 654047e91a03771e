use crate::graph::{ArcEnd, ArcKey, Name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Info,
    Warning,
}

/// Something worth reporting that did not stop the operation.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Diagnostic {
    /// No embedding rule reattached a free arc end; the end stays dangling.
    #[display("no embedding rule reattached the {end:?} end of arc `{name}`")]
    DanglingReattachmentFailure {
        arc: ArcKey,
        name: Name,
        end: ArcEnd,
    },
    /// A chosen option overlapped an option applied earlier in the same cycle and was skipped.
    #[display("option {option_number} conflicts with an option applied before it and was skipped")]
    NonConfluentChoiceSkipped { option_number: usize },
    /// A chosen option could not be applied, usually because an earlier application in the
    /// same cycle changed the elements it matched.
    #[display("option {option_number} was not applied: {reason}")]
    OptionNotApplied { option_number: usize, reason: String },
    #[display("rule {rule_number} of rule set {rule_set_index} reached its application limit")]
    RuleLimitReached {
        rule_set_index: usize,
        rule_number: usize,
    },
    #[display("recognition did not finish: {reason}")]
    RecognitionIncomplete { reason: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DanglingReattachmentFailure { .. }
            | Diagnostic::NonConfluentChoiceSkipped { .. }
            | Diagnostic::OptionNotApplied { .. }
            | Diagnostic::RecognitionIncomplete { .. } => Severity::Warning,
            Diagnostic::RuleLimitReached { .. } => Severity::Info,
        }
    }
}
