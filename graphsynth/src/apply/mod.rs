//! Realizing a rule's R at a recognized option.
//!
//! Application happens in place, in this order: the option is checked against the host; L's
//! elements outside K are deleted; K's elements are updated toward R; R's elements outside K
//! are added; global labels and variables are updated; free arcs are reattached by the
//! embedding rules. New node positions go through the option's [`Transform`].

use crate::diagnostics::Diagnostic;
use crate::graph::{
    ArcEnd, ArcKey, Graph, GraphElement, HyperArcKey, Label, LabelSet, Name, NodeKey,
};
use crate::option::RuleOption;
use crate::rule::GrammarRule;
use crate::util::log;
use embed::FreeEnd;
use error_stack::{Report, ResultExt};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

mod embed;
mod transform;

pub use transform::Transform;

pub type ApplyResult<T> = Result<T, Report<ApplyError>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("the option was not recognized for rule `{0}`")]
    OptionShape(String),
    #[error("the option no longer matches the host")]
    StaleOption,
    #[error("the host graph rejected an update")]
    Graph,
}

/// What an application changed, by host key.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub removed_nodes: Vec<NodeKey>,
    pub removed_arcs: Vec<ArcKey>,
    pub removed_hyperarcs: Vec<HyperArcKey>,
    pub added_nodes: Vec<NodeKey>,
    pub added_arcs: Vec<ArcKey>,
    pub added_hyperarcs: Vec<HyperArcKey>,
    pub diagnostics: Vec<Diagnostic>,
}

fn stale(what: String) -> Report<ApplyError> {
    Report::new(ApplyError::StaleOption).attach_printable(what)
}

fn node_name(g: &Graph, key: Option<NodeKey>) -> Option<Name> {
    key.and_then(|k| g.node(k)).map(|n| n.name())
}

/// Step 1: every positive image alive and still connected the way L is.
fn check_option(host: &Graph, rule: &GrammarRule, option: &RuleOption) -> ApplyResult<()> {
    let l = rule.l();
    if option.nodes.len() != l.node_count()
        || option.arcs.len() != l.arc_count()
        || option.hyperarcs.len() != l.hyperarc_count()
    {
        return Err(Report::new(ApplyError::OptionShape(rule.name().to_string())));
    }

    for (key, node) in l.nodes() {
        let image = option.node_image(key);
        let ok = if rule.is_negative_node(key) {
            image.is_none()
        } else {
            image.is_some_and(|h| host.contains_node(h))
        };
        if !ok {
            return Err(stale(format!("image of node `{}`", node.name())));
        }
    }

    for (key, arc) in l.arcs() {
        let image = option.arc_image(key);
        if rule.is_negative_arc(key) {
            if image.is_some() {
                return Err(stale(format!("image of negative arc `{}`", arc.name())));
            }
            continue;
        }
        let Some(host_arc) = image.and_then(|h| host.arc(h)) else {
            return Err(stale(format!("image of arc `{}`", arc.name())));
        };
        let want_from = arc.from().and_then(|n| option.node_image(n));
        let want_to = arc.to().and_then(|n| option.node_image(n));
        let fits = |from: Option<NodeKey>, to: Option<NodeKey>| {
            want_from.is_none_or(|w| from == Some(w)) && want_to.is_none_or(|w| to == Some(w))
        };
        let reversible = !arc.is_oriented() || host_arc.doubly_directed;
        if !fits(host_arc.from(), host_arc.to())
            && !(reversible && fits(host_arc.to(), host_arc.from()))
        {
            return Err(stale(format!("ends of arc `{}`", arc.name())));
        }
    }

    for (key, hyperarc) in l.hyperarcs() {
        let image = option.hyperarc_image(key);
        if rule.is_negative_hyperarc(key) {
            if image.is_some() {
                return Err(stale(format!("image of negative hyperarc `{}`", hyperarc.name())));
            }
            continue;
        }
        let Some(host_hyperarc) = image.and_then(|h| host.hyperarc(h)) else {
            return Err(stale(format!("image of hyperarc `{}`", hyperarc.name())));
        };
        let members_ok = hyperarc
            .nodes()
            .iter()
            .all(|&n| option.node_image(n).is_some_and(|img| host_hyperarc.contains(img)));
        if !members_ok {
            return Err(stale(format!("members of hyperarc `{}`", hyperarc.name())));
        }
    }
    Ok(())
}

/// Removes L-only labels and adds R-only labels, keeping whatever else the host carries.
fn apply_label_delta(host: &mut LabelSet, l: &LabelSet, r: &LabelSet) {
    for label in l.iter() {
        if !r.contains(label) {
            host.remove(label);
        }
    }
    for label in r.iter() {
        if !l.contains(label) {
            host.insert(*label);
        }
    }
}

fn update_attributes<E: GraphElement>(host: &mut E, l: &E, r: &E) {
    apply_label_delta(host.labels_mut(), l.labels(), r.labels());
    if l.variables() != r.variables() {
        *host.variables_mut() = r.variables().to_vec();
    }
    if l.type_tag() != r.type_tag() {
        host.set_type_tag(r.type_tag());
    }
}

/// Ordered global labels are replaced in place: L's run at `start` becomes R's labels.
fn replace_global_run(host: &mut LabelSet, l: &LabelSet, r: &LabelSet, start: usize) {
    let current = host.as_slice();
    let end = (start + l.len()).min(current.len());
    let mut labels: Vec<Label> = current[..start.min(end)].to_vec();
    labels.extend(r.iter().copied());
    labels.extend_from_slice(&current[end..]);
    *host = labels.into_iter().collect();
}

/// Applies `rule` at `option`, rewriting `host` in place.
///
/// Fails without touching the host if the option is stale, i.e. the host changed since it
/// was recognized in a way that affects the matched elements. Free arcs no embedding rule
/// handles stay dangling and are reported as diagnostics.
pub fn apply(host: &mut Graph, rule: &GrammarRule, option: &RuleOption) -> ApplyResult<ApplyReport> {
    check_option(host, rule, option)
        .attach_printable_lazy(|| format!("while applying rule `{}`", rule.name()))?;
    let l = rule.l();
    let r = rule.r();
    let mut report = ApplyReport::default();

    // undirected L arcs may have matched a host arc back to front
    let reversed: HashSet<ArcKey> = l
        .arcs()
        .filter(|(key, arc)| {
            let Some(host_arc) = option.arc_image(*key).and_then(|h| host.arc(h)) else {
                return false;
            };
            let want_from = arc.from().and_then(|n| option.node_image(n));
            let want_to = arc.to().and_then(|n| option.node_image(n));
            want_from.is_some_and(|w| host_arc.from() != Some(w))
                || (want_from.is_none() && want_to.is_some_and(|w| host_arc.to() != Some(w)))
        })
        .map(|(key, _)| key)
        .collect();

    // deletion
    let matched_arcs: HashSet<ArcKey> = option.arcs.iter().flatten().copied().collect();
    for (key, _) in l.arcs() {
        if rule.r_arc_of(key).is_some() {
            continue;
        }
        if let Some(h) = option.arc_image(key) {
            if host.remove_arc(h).is_some() {
                report.removed_arcs.push(h);
            }
        }
    }
    for (key, _) in l.hyperarcs() {
        if rule.r_hyperarc_of(key).is_some() {
            continue;
        }
        if let Some(h) = option.hyperarc_image(key) {
            if host.remove_hyperarc(h).is_some() {
                report.removed_hyperarcs.push(h);
            }
        }
    }
    let mut free_ends = Vec::new();
    for (key, _) in l.nodes() {
        if rule.r_node_of(key).is_some() {
            continue;
        }
        let Some(h) = option.node_image(key) else {
            continue;
        };
        let incident: Vec<ArcKey> = host.incident_arcs(h).collect();
        for arc_key in incident {
            if matched_arcs.contains(&arc_key) {
                continue;
            }
            if let Some(arc) = host.arc(arc_key) {
                for end in [ArcEnd::From, ArcEnd::To] {
                    if arc.end(end) == Some(h) {
                        free_ends.push(FreeEnd {
                            arc: arc_key,
                            end,
                            l_node: key,
                        });
                    }
                }
            }
        }
        if host.remove_node(h).is_some() {
            report.removed_nodes.push(h);
        }
    }

    // context nodes
    for (key, l_node) in l.nodes() {
        let Some(r_node) = rule.r_node_of(key).and_then(|k| r.node(k)) else {
            continue;
        };
        if let Some(node) = option.node_image(key).and_then(|h| host.node_mut(h)) {
            update_attributes(node, l_node, r_node);
        }
    }

    // additions
    let transform = option.position_transform;
    let mut r_to_host: HashMap<NodeKey, NodeKey> = HashMap::new();
    for (r_key, r_node) in r.nodes() {
        match rule.l_node_of(r_key) {
            Some(l_key) => {
                if let Some(h) = option.node_image(l_key) {
                    r_to_host.insert(r_key, h);
                }
            }
            None => {
                let mut node = r_node.clone();
                node.position = transform.apply(r_node.position);
                let h = host.add_node_unique(node);
                r_to_host.insert(r_key, h);
                report.added_nodes.push(h);
            }
        }
    }
    if rule.transform_node_positions() {
        for (key, l_node) in l.nodes() {
            let Some(r_node) = rule.r_node_of(key).and_then(|k| r.node(k)) else {
                continue;
            };
            let before = transform.apply(l_node.position);
            let after = transform.apply(r_node.position);
            if let Some(node) = option.node_image(key).and_then(|h| host.node_mut(h)) {
                for axis in 0..3 {
                    node.position[axis] += after[axis] - before[axis];
                }
            }
        }
    }
    let to_host = |end: Option<NodeKey>| end.and_then(|n| r_to_host.get(&n).copied());

    // context arcs and hyperarcs, now that every R node has a host image
    for (key, l_arc) in l.arcs() {
        let Some(r_arc) = rule.r_arc_of(key).and_then(|k| r.arc(k)) else {
            continue;
        };
        let Some(h) = option.arc_image(key) else {
            continue;
        };
        let Some((host_from, host_to)) = host.arc(h).map(|a| (a.from(), a.to())) else {
            continue;
        };
        let mut reversed = reversed.contains(&key);
        if reversed && r_arc.is_oriented() {
            // R gives the arc an orientation, so align the host arc with L first
            host.set_arc_end(h, ArcEnd::From, host_to)
                .change_context(ApplyError::Graph)?;
            host.set_arc_end(h, ArcEnd::To, host_from)
                .change_context(ApplyError::Graph)?;
            reversed = false;
        }
        for end in [ArcEnd::From, ArcEnd::To] {
            if node_name(l, l_arc.end(end)) == node_name(r, r_arc.end(end)) {
                continue;
            }
            let slot = if reversed { end.opposite() } else { end };
            host.set_arc_end(h, slot, to_host(r_arc.end(end)))
                .change_context(ApplyError::Graph)?;
        }
        if let Some(arc) = host.arc_mut(h) {
            update_attributes(arc, l_arc, r_arc);
            if l_arc.directed != r_arc.directed || l_arc.doubly_directed != r_arc.doubly_directed {
                arc.directed = r_arc.directed;
                arc.doubly_directed = r_arc.doubly_directed;
            }
        }
    }
    for (key, l_hyperarc) in l.hyperarcs() {
        let Some(r_hyperarc) = rule.r_hyperarc_of(key).and_then(|k| r.hyperarc(k)) else {
            continue;
        };
        let Some(h) = option.hyperarc_image(key) else {
            continue;
        };
        let l_members: Vec<Option<Name>> = l_hyperarc
            .nodes()
            .iter()
            .map(|&n| node_name(l, Some(n)))
            .collect();
        let r_members: Vec<Option<Name>> = r_hyperarc
            .nodes()
            .iter()
            .map(|&n| node_name(r, Some(n)))
            .collect();
        for &member in l_hyperarc.nodes() {
            if r_members.contains(&node_name(l, Some(member))) {
                continue;
            }
            if let Some(img) = option.node_image(member) {
                host.remove_from_hyperarc(h, img)
                    .change_context(ApplyError::Graph)?;
            }
        }
        for &member in r_hyperarc.nodes() {
            if l_members.contains(&node_name(r, Some(member))) {
                continue;
            }
            if let Some(img) = to_host(Some(member)) {
                host.add_to_hyperarc(h, img)
                    .change_context(ApplyError::Graph)?;
            }
        }
        if let Some(hyperarc) = host.hyperarc_mut(h) {
            update_attributes(hyperarc, l_hyperarc, r_hyperarc);
        }
    }

    for (r_key, r_arc) in r.arcs() {
        if rule.l_arc_of(r_key).is_some() {
            continue;
        }
        let mut arc = r_arc.clone();
        arc.from = to_host(r_arc.from());
        arc.to = to_host(r_arc.to());
        let h = host
            .add_arc_unique(arc)
            .change_context(ApplyError::Graph)?;
        report.added_arcs.push(h);
    }
    for (r_key, r_hyperarc) in r.hyperarcs() {
        if rule.l_hyperarc_of(r_key).is_some() {
            continue;
        }
        let mut hyperarc = r_hyperarc.clone();
        hyperarc.nodes = r_hyperarc
            .nodes()
            .iter()
            .filter_map(|&n| to_host(Some(n)))
            .collect();
        let h = host
            .add_hyperarc_unique(hyperarc)
            .change_context(ApplyError::Graph)?;
        report.added_hyperarcs.push(h);
    }

    // globals
    match option.global_label_start {
        Some(start) if rule.ordered_global_labels() => {
            replace_global_run(&mut host.global_labels, &l.global_labels, &r.global_labels, start)
        }
        _ => apply_label_delta(&mut host.global_labels, &l.global_labels, &r.global_labels),
    }
    if l.global_variables != r.global_variables {
        host.global_variables = r.global_variables.clone();
    }

    embed::reattach(host, rule, &free_ends, &r_to_host, &mut report)?;

    log::debug!(
        "applied `{}`: -{} +{} nodes, -{} +{} arcs, {} diagnostics",
        rule.name(),
        report.removed_nodes.len(),
        report.added_nodes.len(),
        report.removed_arcs.len(),
        report.added_arcs.len(),
        report.diagnostics.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Arc, Node};
    use crate::recognize::{RecognizeConfig, recognize};

    #[test]
    fn label_delta_keeps_host_extras() {
        let mut host: LabelSet = ["a", "extra"].into_iter().collect();
        let l: LabelSet = ["a"].into_iter().collect();
        let r: LabelSet = ["b"].into_iter().collect();
        apply_label_delta(&mut host, &l, &r);
        assert_eq!(host.as_slice(), &[Label::from("extra"), Label::from("b")]);
    }

    #[test]
    fn ordered_run_is_replaced_in_place() {
        let mut host: LabelSet = ["p", "q", "r"].into_iter().collect();
        let l: LabelSet = ["q"].into_iter().collect();
        let r: LabelSet = ["x", "y"].into_iter().collect();
        replace_global_run(&mut host, &l, &r, 1);
        let expected: LabelSet = ["p", "x", "y", "r"].into_iter().collect();
        assert_eq!(host, expected);
    }

    #[test]
    fn stale_options_are_refused() {
        let mut l = Graph::new();
        let a = l.add_node(Node::new("a")).unwrap();
        let b = l.add_node(Node::new("b")).unwrap();
        l.add_arc(Arc::between("ab", a, b)).unwrap();
        let mut r = Graph::new();
        r.add_node(Node::new("a")).unwrap();
        let rule = GrammarRule::new("drop_b", l.clone(), r).unwrap();

        let mut host = l.copy();
        let option = recognize(&host, &rule, &RecognizeConfig::new()).options.remove(0);
        let mut first = host.clone();
        apply(&mut first, &rule, &option).unwrap();
        let err = apply(&mut first, &rule, &option).unwrap_err();
        assert_eq!(err.current_context(), &ApplyError::StaleOption);

        // an option of another rule does not fit at all
        let other = GrammarRule::new("empty", Graph::new(), Graph::new()).unwrap();
        let err = apply(&mut host, &other, &option).unwrap_err();
        assert!(matches!(err.current_context(), ApplyError::OptionShape(_)));
    }
}
