use crate::graph::{Graph, GraphElement};
use crate::recognize::{RecognizeConfig, recognize};
use crate::rule::{
    ArcCondition, Comparison, GrammarRule, HyperArcCondition, LabelMatch, NodeCondition,
    RuleBuilder, VariableConstraint,
};
use crate::util::log;

/// One equality constraint per variable. Recognizing both ways makes the vectors equal.
fn same_variables(variables: &[f64]) -> impl Iterator<Item = VariableConstraint> + '_ {
    variables
        .iter()
        .enumerate()
        .map(|(index, &value)| VariableConstraint::new(index, Comparison::Equal, value))
}

/// A rule whose L is `g` under the strictest conditions, so that a match is an isomorphism
/// onto a graph with the same element counts.
fn exact_rule(g: &Graph) -> Option<GrammarRule> {
    let mut builder = RuleBuilder::new("equivalence", g.copy(), g.copy())
        .contains_all_global_labels()
        .induced()
        .spanning();
    for (_, node) in g.nodes() {
        let condition = NodeCondition::new()
            .label_match(LabelMatch::Exact)
            .strict_degree()
            .restrict_to_type();
        let condition = same_variables(&node.variables).fold(condition, NodeCondition::constrain);
        builder = builder.node_condition(node.name(), condition);
    }
    for (_, arc) in g.arcs() {
        let condition = ArcCondition::new()
            .label_match(LabelMatch::Exact)
            .direction_is_equal()
            .null_means_null();
        let condition = same_variables(&arc.variables).fold(condition, ArcCondition::constrain);
        builder = builder.arc_condition(arc.name(), condition);
    }
    for (_, hyperarc) in g.hyperarcs() {
        let condition = HyperArcCondition::new()
            .label_match(LabelMatch::Exact)
            .strict_node_count();
        let condition =
            same_variables(&hyperarc.variables).fold(condition, HyperArcCondition::constrain);
        builder = builder.hyperarc_condition(hyperarc.name(), condition);
    }
    match builder.build() {
        Ok(rule) => Some(rule),
        Err(err) => {
            log::error!("graph `{}` cannot be used as a pattern: {err:?}", g.name);
            None
        }
    }
}

fn embeds_exactly(pattern: &Graph, host: &Graph) -> bool {
    exact_rule(pattern).is_some_and(|rule| {
        !recognize(host, &rule, &RecognizeConfig::new().with_max_options(1))
            .options
            .is_empty()
    })
}

/// Whether two graphs have the same structure, labels and variables, ignoring names and
/// positions.
///
/// Each graph is recognized in the other with exact labels, equal variables, strict degrees,
/// matching directedness, and the induced and spanning conditions. Costs two recognitions, so it is
/// exponential in the worst case.
pub fn structurally_equivalent(g1: &Graph, g2: &Graph) -> bool {
    if g1.node_count() != g2.node_count()
        || g1.arc_count() != g2.arc_count()
        || g1.hyperarc_count() != g2.hyperarc_count()
        || !g1.global_labels.set_eq(&g2.global_labels)
        || g1.global_variables != g2.global_variables
    {
        return false;
    }
    let labels_of = |g: &Graph| {
        let mut labels: Vec<String> = g
            .nodes()
            .flat_map(|(_, n)| n.labels().iter().map(|l| l.to_string()).collect::<Vec<_>>())
            .collect();
        labels.sort();
        labels
    };
    if labels_of(g1) != labels_of(g2) {
        return false;
    }
    embeds_exactly(g1, g2) && embeds_exactly(g2, g1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Arc, Node};

    fn path(labels: &[&str], prefix: &str) -> Graph {
        let mut g = Graph::new();
        let keys: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                g.add_node(Node::new(format!("{prefix}{i}")).with_label(*label))
                    .unwrap()
            })
            .collect();
        for (i, pair) in keys.windows(2).enumerate() {
            g.add_arc(Arc::between(format!("{prefix}e{i}"), pair[0], pair[1]))
                .unwrap();
        }
        g
    }

    #[test]
    fn names_do_not_matter() {
        assert!(structurally_equivalent(
            &path(&["a", "b", "c"], "x"),
            &path(&["a", "b", "c"], "y")
        ));
    }

    #[test]
    fn labels_and_direction_matter() {
        let g = path(&["a", "b", "c"], "x");
        assert!(!structurally_equivalent(&g, &path(&["a", "b", "b"], "x")));
        assert!(!structurally_equivalent(&g, &path(&["c", "b", "a"], "x")));
    }

    #[test]
    fn variables_matter() {
        let g = path(&["a", "b"], "x");
        let with = |node: &str, variables: &[f64]| {
            let mut h = path(&["a", "b"], "y");
            let key = h.node_by_name(node).unwrap();
            h.node_mut(key).unwrap().variables = variables.to_vec();
            h
        };
        let mut weighted = g.clone();
        let x1 = weighted.node_by_name("x1").unwrap();
        weighted.node_mut(x1).unwrap().variables = vec![2.0, 3.0];

        assert!(structurally_equivalent(&weighted, &with("y1", &[2.0, 3.0])));
        assert!(!structurally_equivalent(&weighted, &with("y1", &[2.0, 4.0])));
        assert!(!structurally_equivalent(&weighted, &with("y1", &[2.0])));
        assert!(!structurally_equivalent(&weighted, &with("y1", &[2.0, 3.0, 1.0])));
        assert!(!structurally_equivalent(&weighted, &g));

        let ab = weighted.arc_by_name("xe0").unwrap();
        let mut arc_weighted = weighted.clone();
        arc_weighted.arc_mut(ab).unwrap().variables = vec![1.0];
        assert!(!structurally_equivalent(&weighted, &arc_weighted));
    }
}
