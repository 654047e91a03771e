//! The backtracking search behind [`recognize`](super::recognize).
//!
//! A search plan lists L's elements in assignment order: nodes (by descending degree), then
//! arcs, then hyperarcs. Every complete positive assignment is checked against the whole-match
//! conditions, and then the negative plan is searched from it. A negative extension that
//! succeeds rejects the match.

use super::{RecognitionStatus, RecognizeConfig};
use crate::graph::{ArcKey, Graph, HyperArcKey, NodeKey};
use crate::rule::GrammarRule;
use crate::rule::condition::labels_satisfied;
use crate::util::log;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
enum Step {
    Node(NodeKey),
    Arc(ArcKey),
    HyperArc(HyperArcKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// The negative plan was fully assigned.
    Found,
    Stop,
}

/// Images of L's elements, indexed by L key. Negative positions are `None`.
#[derive(Debug, Clone)]
pub(crate) struct Mapping {
    pub nodes: Vec<Option<NodeKey>>,
    pub arcs: Vec<Option<ArcKey>>,
    pub hyperarcs: Vec<Option<HyperArcKey>>,
}

pub(crate) struct MatchOutcome {
    pub mappings: Vec<Mapping>,
    pub status: RecognitionStatus,
    pub steps: u64,
}

/// Derived host adjacency, computed once per recognition.
struct HostIndex {
    nodes: Vec<NodeKey>,
    arcs: Vec<ArcKey>,
    hyperarcs: Vec<HyperArcKey>,
    degree: HashMap<NodeKey, usize>,
    incident: HashMap<NodeKey, Vec<ArcKey>>,
    neighbors: HashMap<NodeKey, Vec<NodeKey>>,
    adjacent: HashSet<(NodeKey, NodeKey)>,
}

impl HostIndex {
    fn new(host: &Graph) -> Self {
        let mut index = HostIndex {
            nodes: host.node_keys(),
            arcs: host.arc_keys(),
            hyperarcs: host.hyperarc_keys(),
            degree: HashMap::new(),
            incident: HashMap::new(),
            neighbors: HashMap::new(),
            adjacent: HashSet::new(),
        };
        for (key, arc) in host.arcs() {
            for end in [arc.from(), arc.to()].into_iter().flatten() {
                *index.degree.entry(end).or_default() += 1;
            }
            let ends: Vec<NodeKey> = match (arc.from(), arc.to()) {
                (Some(f), Some(t)) if f == t => vec![f],
                (f, t) => [f, t].into_iter().flatten().collect(),
            };
            for &end in &ends {
                index.incident.entry(end).or_default().push(key);
            }
            if let (Some(f), Some(t)) = (arc.from(), arc.to()) {
                if index.adjacent.insert((f, t)) {
                    index.neighbors.entry(f).or_default().push(t);
                }
                if f != t && index.adjacent.insert((t, f)) {
                    index.neighbors.entry(t).or_default().push(f);
                }
            }
        }
        for (_, hyperarc) in host.hyperarcs() {
            for &member in hyperarc.nodes() {
                *index.degree.entry(member).or_default() += 1;
            }
        }
        index
    }

    fn degree(&self, node: NodeKey) -> usize {
        self.degree.get(&node).copied().unwrap_or(0)
    }
}

/// Per L node: degree and adjacent L nodes, once over positive elements only and once over all.
struct PatternIndex {
    degree: Vec<usize>,
    degree_all: Vec<usize>,
    adjacent: Vec<Vec<NodeKey>>,
    adjacent_all: Vec<Vec<NodeKey>>,
}

impl PatternIndex {
    fn new(rule: &GrammarRule) -> Self {
        let l = rule.l();
        let slots = l.node_count();
        let mut index = PatternIndex {
            degree: vec![0; slots],
            degree_all: vec![0; slots],
            adjacent: vec![Vec::new(); slots],
            adjacent_all: vec![Vec::new(); slots],
        };
        for (key, arc) in l.arcs() {
            let positive = !rule.is_negative_arc(key);
            for end in [arc.from(), arc.to()].into_iter().flatten() {
                index.degree_all[end.index()] += 1;
                if positive {
                    index.degree[end.index()] += 1;
                }
            }
            if let (Some(f), Some(t)) = (arc.from(), arc.to()) {
                for (a, b) in [(f, t), (t, f)] {
                    if !index.adjacent_all[a.index()].contains(&b) {
                        index.adjacent_all[a.index()].push(b);
                    }
                    if positive && !index.adjacent[a.index()].contains(&b) {
                        index.adjacent[a.index()].push(b);
                    }
                }
            }
        }
        for (key, hyperarc) in l.hyperarcs() {
            let positive = !rule.is_negative_hyperarc(key);
            for &member in hyperarc.nodes() {
                index.degree_all[member.index()] += 1;
                if positive {
                    index.degree[member.index()] += 1;
                }
            }
        }
        index
    }
}

pub(crate) struct Matcher<'a> {
    host: &'a Graph,
    rule: &'a GrammarRule,
    config: &'a RecognizeConfig,
    host_index: HostIndex,
    pattern: PatternIndex,
    positive_plan: Vec<Step>,
    negative_plan: Vec<Step>,
    nodes: Vec<Option<NodeKey>>,
    arcs: Vec<Option<ArcKey>>,
    hyperarcs: Vec<Option<HyperArcKey>>,
    used_nodes: HashSet<NodeKey>,
    used_arcs: HashSet<ArcKey>,
    used_hyperarcs: HashSet<HyperArcKey>,
    steps: u64,
    stop: Option<RecognitionStatus>,
    found: Vec<Mapping>,
}

impl<'a> Matcher<'a> {
    pub fn new(host: &'a Graph, rule: &'a GrammarRule, config: &'a RecognizeConfig) -> Self {
        let l = rule.l();
        let pattern = PatternIndex::new(rule);

        let mut positive_nodes: Vec<NodeKey> = l
            .node_keys()
            .into_iter()
            .filter(|&n| !rule.is_negative_node(n))
            .collect();
        // stable, so ties keep insertion order
        positive_nodes.sort_by_key(|n| Reverse(pattern.degree[n.index()]));

        let mut positive_plan: Vec<Step> = positive_nodes.into_iter().map(Step::Node).collect();
        let mut negative_plan = Vec::new();
        for n in l.node_keys() {
            if rule.is_negative_node(n) {
                negative_plan.push(Step::Node(n));
            }
        }
        for a in l.arc_keys() {
            if rule.is_negative_arc(a) {
                negative_plan.push(Step::Arc(a));
            } else {
                positive_plan.push(Step::Arc(a));
            }
        }
        for h in l.hyperarc_keys() {
            if rule.is_negative_hyperarc(h) {
                negative_plan.push(Step::HyperArc(h));
            } else {
                positive_plan.push(Step::HyperArc(h));
            }
        }

        Matcher {
            host,
            rule,
            config,
            host_index: HostIndex::new(host),
            pattern,
            positive_plan,
            negative_plan,
            nodes: vec![None; l.node_count()],
            arcs: vec![None; l.arc_count()],
            hyperarcs: vec![None; l.hyperarc_count()],
            used_nodes: HashSet::new(),
            used_arcs: HashSet::new(),
            used_hyperarcs: HashSet::new(),
            steps: 0,
            stop: None,
            found: Vec::new(),
        }
    }

    pub fn run(mut self) -> MatchOutcome {
        self.search(Phase::Positive, 0);
        MatchOutcome {
            mappings: self.found,
            status: self.stop.unwrap_or(RecognitionStatus::Complete),
            steps: self.steps,
        }
    }

    fn plan(&self, phase: Phase) -> &[Step] {
        match phase {
            Phase::Positive => &self.positive_plan,
            Phase::Negative => &self.negative_plan,
        }
    }

    /// Counts one expansion against the budget and polls for cancellation.
    fn tick(&mut self) -> bool {
        if self.stop.is_some() {
            return false;
        }
        self.steps += 1;
        if self.config.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            log::debug!("recognition of `{}` cancelled after {} steps", self.rule.name(), self.steps);
            self.stop = Some(RecognitionStatus::Cancelled);
            return false;
        }
        if self.config.max_steps.is_some_and(|max| self.steps > max) {
            log::debug!("recognition of `{}` ran out of budget", self.rule.name());
            self.stop = Some(RecognitionStatus::BudgetExhausted);
            return false;
        }
        true
    }

    fn search(&mut self, phase: Phase, depth: usize) -> Flow {
        let next = self.plan(phase).get(depth).copied();
        let Some(step) = next else {
            return match phase {
                Phase::Positive => self.complete(),
                Phase::Negative => Flow::Found,
            };
        };
        match step {
            Step::Node(l) => {
                if !self.tick() {
                    return Flow::Stop;
                }
                for h in self.node_candidates(phase, l) {
                    if !self.node_fits(phase, l, h) {
                        continue;
                    }
                    self.nodes[l.index()] = Some(h);
                    self.used_nodes.insert(h);
                    let flow = self.search(phase, depth + 1);
                    self.nodes[l.index()] = None;
                    self.used_nodes.remove(&h);
                    if flow != Flow::Continue {
                        return flow;
                    }
                }
            }
            Step::Arc(l) => {
                for h in self.arc_candidates(l) {
                    if !self.arc_fits(l, h) {
                        continue;
                    }
                    self.arcs[l.index()] = Some(h);
                    self.used_arcs.insert(h);
                    let flow = self.search(phase, depth + 1);
                    self.arcs[l.index()] = None;
                    self.used_arcs.remove(&h);
                    if flow != Flow::Continue {
                        return flow;
                    }
                }
            }
            Step::HyperArc(l) => {
                for h in self.hyperarc_candidates(l) {
                    if !self.hyperarc_fits(l, h) {
                        continue;
                    }
                    self.hyperarcs[l.index()] = Some(h);
                    self.used_hyperarcs.insert(h);
                    let flow = self.search(phase, depth + 1);
                    self.hyperarcs[l.index()] = None;
                    self.used_hyperarcs.remove(&h);
                    if flow != Flow::Continue {
                        return flow;
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Whole-match conditions, then the negative application condition.
    fn complete(&mut self) -> Flow {
        if self.rule.spanning() && self.used_nodes.len() != self.host.node_count() {
            return Flow::Continue;
        }
        if self.rule.induced() {
            let extra_arc = self.host.arcs().any(|(key, arc)| match (arc.from(), arc.to()) {
                (Some(f), Some(t)) => {
                    self.used_nodes.contains(&f)
                        && self.used_nodes.contains(&t)
                        && !self.used_arcs.contains(&key)
                }
                _ => false,
            });
            if extra_arc {
                return Flow::Continue;
            }
        }
        if !self.negative_plan.is_empty() {
            match self.search(Phase::Negative, 0) {
                Flow::Found => {
                    log::trace!("match of `{}` rejected by a negative element", self.rule.name());
                    return Flow::Continue;
                }
                Flow::Stop => return Flow::Stop,
                Flow::Continue => {}
            }
        }

        self.found.push(Mapping {
            nodes: self.nodes.clone(),
            arcs: self.arcs.clone(),
            hyperarcs: self.hyperarcs.clone(),
        });
        log::trace!("found match {} of `{}`", self.found.len(), self.rule.name());
        if self
            .config
            .max_options
            .is_some_and(|max| self.found.len() >= max)
        {
            self.stop = Some(RecognitionStatus::Complete);
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn image(&self, node: Option<NodeKey>) -> Option<NodeKey> {
        node.and_then(|n| self.nodes.get(n.index()).copied().flatten())
    }

    fn adjacency(&self, phase: Phase, l: NodeKey) -> &[NodeKey] {
        match phase {
            Phase::Positive => &self.pattern.adjacent[l.index()],
            Phase::Negative => &self.pattern.adjacent_all[l.index()],
        }
    }

    /// Neighbours of an already matched L neighbour's image, or every host node.
    fn node_candidates(&self, phase: Phase, l: NodeKey) -> Vec<NodeKey> {
        for &m in self.adjacency(phase, l) {
            if m == l {
                continue;
            }
            if let Some(img) = self.image(Some(m)) {
                return self
                    .host_index
                    .neighbors
                    .get(&img)
                    .cloned()
                    .unwrap_or_default();
            }
        }
        self.host_index.nodes.clone()
    }

    fn node_fits(&self, phase: Phase, l: NodeKey, h: NodeKey) -> bool {
        if self.used_nodes.contains(&h) {
            return false;
        }
        let (Some(pattern), Some(node)) = (self.rule.l().node(l), self.host.node(h)) else {
            return false;
        };
        let condition = self.rule.node_condition(l);
        if !labels_satisfied(
            condition.label_match,
            &pattern.labels,
            &condition.negate_labels,
            &node.labels,
        ) {
            return false;
        }
        if !condition
            .variable_constraints
            .iter()
            .all(|c| c.holds(&node.variables))
        {
            return false;
        }
        if condition.restrict_to_type && pattern.type_tag != node.type_tag {
            return false;
        }

        let wanted = match phase {
            Phase::Positive => self.pattern.degree[l.index()],
            Phase::Negative => self.pattern.degree_all[l.index()],
        };
        let have = self.host_index.degree(h);
        let degree_ok = if condition.strict_degree {
            have == wanted
        } else {
            have >= wanted
        };
        if !degree_ok {
            return false;
        }

        self.adjacency(phase, l).iter().all(|&m| {
            let img = if m == l { Some(h) } else { self.image(Some(m)) };
            img.is_none_or(|img| self.host_index.adjacent.contains(&(h, img)))
        })
    }

    fn arc_candidates(&self, l: ArcKey) -> Vec<ArcKey> {
        let Some(pattern) = self.rule.l().arc(l) else {
            return Vec::new();
        };
        match self.image(pattern.from()).or(self.image(pattern.to())) {
            Some(img) => self
                .host_index
                .incident
                .get(&img)
                .cloned()
                .unwrap_or_default(),
            None => self.host_index.arcs.clone(),
        }
    }

    fn arc_fits(&self, l: ArcKey, h: ArcKey) -> bool {
        if self.used_arcs.contains(&h) {
            return false;
        }
        let (Some(pattern), Some(arc)) = (self.rule.l().arc(l), self.host.arc(h)) else {
            return false;
        };
        let condition = self.rule.arc_condition(l);
        if !labels_satisfied(
            condition.label_match,
            &pattern.labels,
            &condition.negate_labels,
            &arc.labels,
        ) {
            return false;
        }
        if !condition
            .variable_constraints
            .iter()
            .all(|c| c.holds(&arc.variables))
        {
            return false;
        }
        if condition.direction_is_equal
            && (pattern.directed != arc.directed || pattern.doubly_directed != arc.doubly_directed)
        {
            return false;
        }

        let want_from = self.image(pattern.from());
        let want_to = self.image(pattern.to());
        let end_ok = |want: Option<NodeKey>, have: Option<NodeKey>| match want {
            Some(w) => have == Some(w),
            None => !condition.null_means_null || have.is_none(),
        };
        let forward = end_ok(want_from, arc.from()) && end_ok(want_to, arc.to());
        let backward = end_ok(want_from, arc.to()) && end_ok(want_to, arc.from());
        if pattern.is_oriented() {
            arc.directed && (forward || (arc.doubly_directed && backward))
        } else {
            forward || backward
        }
    }

    fn hyperarc_candidates(&self, l: HyperArcKey) -> Vec<HyperArcKey> {
        let first_member = self
            .rule
            .l()
            .hyperarc(l)
            .and_then(|h| h.nodes().first().copied());
        match self.image(first_member) {
            Some(img) => self
                .host_index
                .hyperarcs
                .iter()
                .copied()
                .filter(|&h| self.host.hyperarc(h).is_some_and(|h| h.contains(img)))
                .collect(),
            None => self.host_index.hyperarcs.clone(),
        }
    }

    fn hyperarc_fits(&self, l: HyperArcKey, h: HyperArcKey) -> bool {
        if self.used_hyperarcs.contains(&h) {
            return false;
        }
        let (Some(pattern), Some(hyperarc)) = (self.rule.l().hyperarc(l), self.host.hyperarc(h))
        else {
            return false;
        };
        let condition = self.rule.hyperarc_condition(l);
        if !labels_satisfied(
            condition.label_match,
            &pattern.labels,
            &condition.negate_labels,
            &hyperarc.labels,
        ) {
            return false;
        }
        if !condition
            .variable_constraints
            .iter()
            .all(|c| c.holds(&hyperarc.variables))
        {
            return false;
        }
        if condition.strict_node_count && pattern.nodes().len() != hyperarc.nodes().len() {
            return false;
        }
        pattern
            .nodes()
            .iter()
            .all(|&n| self.image(Some(n)).is_some_and(|img| hyperarc.contains(img)))
    }
}
