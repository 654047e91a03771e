//! Finding the places in a host graph where a rule's L matches.

use crate::apply::Transform;
use crate::graph::{Graph, NodeKey};
use crate::option::RuleOption;
use crate::rule::GrammarRule;
use crate::util::log;
use matcher::{Mapping, Matcher};
use std::collections::BTreeSet;

mod cancel;
mod matcher;

pub use cancel::CancellationToken;

/// Limits on a single recognition.
#[derive(Debug, Clone, Default)]
pub struct RecognizeConfig {
    pub cancel: Option<CancellationToken>,
    /// Maximum number of node expansions.
    pub max_steps: Option<u64>,
    /// Stop once this many options were found.
    pub max_options: Option<usize>,
}

impl RecognizeConfig {
    pub fn new() -> Self {
        RecognizeConfig::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_max_options(mut self, options: usize) -> Self {
        self.max_options = Some(options);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecognitionStatus {
    /// The search space was exhausted, or `max_options` was reached.
    Complete,
    Cancelled,
    BudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct Recognition {
    /// Partial when `status` is not `Complete`.
    pub options: Vec<RuleOption>,
    pub status: RecognitionStatus,
    /// Node expansions performed.
    pub steps: u64,
}

impl Recognition {
    fn empty() -> Self {
        Recognition {
            options: Vec::new(),
            status: RecognitionStatus::Complete,
            steps: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == RecognitionStatus::Complete
    }
}

/// Finds every option of `rule` in `host`.
///
/// L's positive elements are mapped injectively into the host, respecting labels, variables,
/// topology and each element's conditions, after which the whole-match conditions
/// (`spanning`, `induced`, negative elements) are checked. Options are numbered in discovery
/// order with `rule_number` and `rule_set_index` zero; [`RuleSet`](crate::RuleSet) renumbers
/// them.
///
/// This is subgraph isomorphism and takes exponential time in the worst case. Use
/// [`RecognizeConfig`] to bound or cancel it.
pub fn recognize(host: &Graph, rule: &GrammarRule, config: &RecognizeConfig) -> Recognition {
    let Some(starts) = global_label_starts(host, rule) else {
        log::trace!("global labels of `{}` do not match the host", rule.name());
        return Recognition::empty();
    };
    if !rule
        .global_variable_constraints()
        .iter()
        .all(|c| c.holds(&host.global_variables))
    {
        log::trace!("global variables of the host violate `{}`", rule.name());
        return Recognition::empty();
    }

    let outcome = Matcher::new(host, rule, config).run();

    let mut options = Vec::new();
    for mapping in &outcome.mappings {
        let position_transform = placement(host, rule, mapping);
        for &global_label_start in &starts {
            options.push(RuleOption {
                rule_set_index: 0,
                rule_number: 0,
                option_number: options.len(),
                nodes: mapping.nodes.clone(),
                arcs: mapping.arcs.clone(),
                hyperarcs: mapping.hyperarcs.clone(),
                confluence: BTreeSet::new(),
                global_label_start,
                position_transform,
            });
        }
    }
    if let Some(max) = config.max_options {
        options.truncate(max);
    }

    log::debug!(
        "recognized {} options of `{}` in {} steps ({:?})",
        options.len(),
        rule.name(),
        outcome.steps,
        outcome.status
    );
    Recognition {
        options,
        status: outcome.status,
        steps: outcome.steps,
    }
}

/// Where L's global labels occur in the host's. `None` if they do not; a single `None` start
/// when order does not matter.
fn global_label_starts(host: &Graph, rule: &GrammarRule) -> Option<Vec<Option<usize>>> {
    let wanted = &rule.l().global_labels;
    let have = &host.global_labels;
    if have.contains_any(rule.negate_global_labels()) {
        return None;
    }
    if !rule.ordered_global_labels() {
        let ok = if rule.contains_all_global_labels() {
            have.set_eq(wanted)
        } else {
            have.contains_all(wanted)
        };
        return ok.then(|| vec![None]);
    }

    if rule.contains_all_global_labels() && wanted.len() != have.len() {
        return None;
    }
    if wanted.is_empty() {
        return Some(vec![None]);
    }
    let starts: Vec<Option<usize>> = have
        .as_slice()
        .windows(wanted.len())
        .enumerate()
        .filter(|(_, run)| *run == wanted.as_slice())
        .map(|(start, _)| Some(start))
        .collect();
    (!starts.is_empty()).then_some(starts)
}

/// Translation taking the first matched L node onto its image.
fn placement(host: &Graph, rule: &GrammarRule, mapping: &Mapping) -> Transform {
    let anchor = mapping
        .nodes
        .iter()
        .enumerate()
        .find_map(|(idx, image)| image.map(|h| (NodeKey(idx as u32), h)));
    let Some((l_key, h_key)) = anchor else {
        return Transform::IDENTITY;
    };
    match (rule.l().node(l_key), host.node(h_key)) {
        (Some(l), Some(h)) => Transform::translate(
            h.position[0] - l.position[0],
            h.position[1] - l.position[1],
        ),
        _ => Transform::IDENTITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Arc, Node};

    fn host() -> Graph {
        let mut g = Graph::new();
        let a = g.add_node(Node::new("a").with_label("x")).unwrap();
        let b = g.add_node(Node::new("b").with_label("y")).unwrap();
        let c = g.add_node(Node::new("c").with_label("y")).unwrap();
        g.add_arc(Arc::between("ab", a, b)).unwrap();
        g.add_arc(Arc::between("ac", a, c)).unwrap();
        g
    }

    fn edge_rule() -> GrammarRule {
        let mut l = Graph::new();
        let x = l.add_node(Node::new("x").with_label("x")).unwrap();
        let y = l.add_node(Node::new("y").with_label("y")).unwrap();
        l.add_arc(Arc::between("e", x, y)).unwrap();
        GrammarRule::new("edge", l.clone(), l).unwrap()
    }

    #[test]
    fn finds_every_oriented_match() {
        let recognition = recognize(&host(), &edge_rule(), &RecognizeConfig::new());
        assert!(recognition.is_complete());
        assert_eq!(recognition.options.len(), 2);
        assert_eq!(recognition.options[1].option_number, 1);
    }

    #[test]
    fn direction_is_respected() {
        let mut g = host();
        let ab = g.arc_by_name("ab").unwrap();
        let (a, b) = (g.node_by_name("a").unwrap(), g.node_by_name("b").unwrap());
        g.set_arc_end(ab, crate::graph::ArcEnd::From, Some(b)).unwrap();
        g.set_arc_end(ab, crate::graph::ArcEnd::To, Some(a)).unwrap();
        let recognition = recognize(&g, &edge_rule(), &RecognizeConfig::new());
        assert_eq!(recognition.options.len(), 1);
    }

    #[test]
    fn max_options_stops_early() {
        let recognition = recognize(&host(), &edge_rule(), &RecognizeConfig::new().with_max_options(1));
        assert_eq!(recognition.options.len(), 1);
        assert_eq!(recognition.status, RecognitionStatus::Complete);
    }

    #[test]
    fn ordered_global_labels_yield_one_option_per_run() {
        let mut g = host();
        for label in ["p", "q", "r", "q"] {
            g.global_labels.insert(label);
        }
        let mut l = Graph::new();
        l.global_labels.insert("q");
        let rule = GrammarRule::builder("ordered", l.clone(), l)
            .ordered_global_labels()
            .build()
            .unwrap();
        let recognition = recognize(&g, &rule, &RecognizeConfig::new());
        // label sets are deduplicated, so `q` occurs once
        assert_eq!(recognition.options.len(), 1);
        assert_eq!(recognition.options[0].global_label_start, Some(1));
    }
}
