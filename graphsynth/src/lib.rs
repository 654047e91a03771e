//! Generative graph grammars.
//!
//! A design is an attributed multigraph ([`Graph`]). A [`GrammarRule`] describes a rewrite as
//! a left-hand side L to find, a right-hand side R to put in its place and the context K they
//! share. [`recognize`] finds every [`RuleOption`] of a rule in a host, [`apply`] rewrites the
//! host at one of them, and [`rca::run`] loops the two under a [`Chooser`] to synthesize
//! designs from a seed.
//!
//! ```
//! use graphsynth::prelude::*;
//!
//! let mut seed = Graph::new();
//! seed.add_node(Node::new("root").with_label("tip")).unwrap();
//!
//! // grow a child under every tip, moving the tip label down
//! let mut l = Graph::new();
//! l.add_node(Node::new("p").with_label("tip")).unwrap();
//! let mut r = Graph::new();
//! let p = r.add_node(Node::new("p")).unwrap();
//! let c = r.add_node(Node::new("c").with_label("tip")).unwrap();
//! r.add_arc(Arc::between("pc", p, c)).unwrap();
//! let rule = GrammarRule::new("grow", l, r).unwrap();
//!
//! let rules = RuleSet::new("tree").with_rule(rule);
//! let mut candidate = Candidate::new(seed);
//! let config = RcaConfig::default().with_max_cycles(3);
//! let report = rca::run(&mut candidate, &rules, &mut FirstChooser, &config).unwrap();
//! assert_eq!(report.cycles, 3);
//! assert_eq!(candidate.graph.node_count(), 4);
//! ```

pub mod apply;
pub mod confluence;
pub mod diagnostics;
pub mod equivalence;
pub mod graph;
pub mod option;
pub mod rca;
pub mod recognize;
pub mod rule;
pub mod util;

pub use apply::{ApplyError, ApplyReport, Transform, apply};
pub use confluence::{are_confluent, assign_local_confluence, maximal_confluent_sets};
pub use diagnostics::{Diagnostic, Severity};
pub use equivalence::structurally_equivalent;
pub use graph::{
    Arc, ArcEnd, ArcKey, Graph, GraphDescription, GraphElement, GraphError, HyperArc,
    HyperArcKey, Label, LabelSet, Name, Node, NodeKey, TypeTag,
};
pub use option::{LocationView, RuleOption};
pub use rca::{Candidate, Chooser, FirstChooser, RcaConfig, RcaError, RcaReport, RuleSet, ScriptedChooser};
pub use recognize::{
    CancellationToken, Recognition, RecognitionStatus, RecognizeConfig, recognize,
};
pub use rule::{GrammarRule, RuleBuilder, RuleError};

pub mod prelude {
    pub use super::rca::{self, StopReason};
    pub use super::rule::{
        ArcCondition, ArcDirection, Comparison, EmbeddingRule, HyperArcCondition, LabelMatch,
        NodeCondition, VariableConstraint,
    };
    pub use super::{
        Arc, ArcEnd, ArcKey, Candidate, CancellationToken, Chooser, Diagnostic, FirstChooser,
        GrammarRule, Graph, GraphElement, HyperArc, HyperArcKey, Label, Name, Node, NodeKey,
        RcaConfig, RecognitionStatus, RecognizeConfig, RuleOption, RuleSet, ScriptedChooser,
        Transform, apply, recognize, structurally_equivalent,
    };
}
