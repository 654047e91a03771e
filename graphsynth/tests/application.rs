mod util;

use graphsynth::prelude::*;
use test_log::test;
use util::*;

fn first_option(host: &Graph, rule: &GrammarRule) -> RuleOption {
    recognize(host, rule, &RecognizeConfig::new())
        .options
        .into_iter()
        .next()
        .expect("rule should match")
}

/// `a -> m -> b` with `m` labelled `mid`.
fn through_middle() -> Graph {
    let mut g = Graph::new();
    let a = g.add_node(Node::new("a").with_label("end")).unwrap();
    let m = g.add_node(Node::new("m").with_label("mid")).unwrap();
    let b = g.add_node(Node::new("b").with_label("end")).unwrap();
    g.add_arc(Arc::between("am", a, m)).unwrap();
    g.add_arc(Arc::between("mb", m, b)).unwrap();
    g
}

/// Replaces a `mid` node by fresh nodes named after `r_nodes`.
fn replace_middle(r_nodes: &[&str], embedding: Vec<EmbeddingRule>) -> GrammarRule {
    let mut r = Graph::new();
    for name in r_nodes {
        r.add_node(Node::new(*name).with_label("new")).unwrap();
    }
    let mut builder = GrammarRule::builder("replace", single("x", "mid"), r);
    for rule in embedding {
        builder = builder.embedding_rule(rule);
    }
    builder.build().unwrap()
}

#[test]
fn relabelling_keeps_node_identity() {
    let mut host = chain(&["a", "X", "c"]);
    let b = host.node_by_name("n1").unwrap();
    let (e0, e1) = (host.arc_by_name("e0").unwrap(), host.arc_by_name("e1").unwrap());
    let rule = relabel("X", "Y");
    let option = first_option(&host, &rule);

    let report = apply(&mut host, &rule, &option).unwrap();
    assert!(report.removed_nodes.is_empty() && report.added_nodes.is_empty());
    let node = host.node(b).unwrap();
    assert!(node.labels.contains(&Label::from("Y")));
    assert!(!node.labels.contains(&Label::from("X")));
    assert_eq!(host.arc(e0).unwrap().to(), Some(b));
    assert_eq!(host.arc(e1).unwrap().from(), Some(b));
    assert_eq!(host.node_count(), 3);
    assert_consistent(&host);

    // the rewrite is visible to the next recognition
    let config = RecognizeConfig::new();
    assert!(recognize(&host, &rule, &config).options.is_empty());
    assert_eq!(recognize(&host, &relabel("Y", "X"), &config).options.len(), 1);
}

#[test]
fn added_elements_get_unique_names() {
    let mut host = single("root", "tip");
    let rule = grow();
    for _ in 0..3 {
        let option = first_option(&host, &rule);
        let report = apply(&mut host, &rule, &option).unwrap();
        assert_eq!(report.added_nodes.len(), 1);
        assert_eq!(report.added_arcs.len(), 1);
        assert_consistent(&host);
    }
    assert_eq!(host.node_count(), 4);
    assert_eq!(host.arc_count(), 3);
    assert!(host.node_by_name("c").is_some());
    assert!(host.node_by_name("c_1").is_some());
    assert!(host.node_by_name("c_2").is_some());
    // exactly one tip left, at the end of the chain
    let tips = host
        .nodes()
        .filter(|(_, n)| n.labels.contains(&Label::from("tip")))
        .count();
    assert_eq!(tips, 1);
}

#[test]
fn copies_are_independent() {
    let original = chain(&["a", "X", "c"]);
    let mut copy = original.copy();
    assert!(structurally_equivalent(&original, &copy));

    let rule = relabel("X", "Y");
    let option = first_option(&copy, &rule);
    apply(&mut copy, &rule, &option).unwrap();
    assert!(!structurally_equivalent(&original, &copy));
    let b = original.node_by_name("n1").unwrap();
    assert!(original.node(b).unwrap().labels.contains(&Label::from("X")));
}

#[test]
fn free_arcs_are_reattached() {
    let mut host = through_middle();
    let (am, mb) = (host.arc_by_name("am").unwrap(), host.arc_by_name("mb").unwrap());
    let (a, b) = (host.node_by_name("a").unwrap(), host.node_by_name("b").unwrap());
    let rule = replace_middle(&["n"], vec![EmbeddingRule::new("n")]);
    let option = first_option(&host, &rule);

    let report = apply(&mut host, &rule, &option).unwrap();
    assert!(report.diagnostics.is_empty());
    let n = report.added_nodes[0];
    assert_eq!(host.arc(am).unwrap().from(), Some(a));
    assert_eq!(host.arc(am).unwrap().to(), Some(n));
    assert_eq!(host.arc(mb).unwrap().from(), Some(n));
    assert_eq!(host.arc(mb).unwrap().to(), Some(b));
    assert_consistent(&host);
}

#[test]
fn unhandled_free_arcs_stay_dangling() {
    let mut host = through_middle();
    let am = host.arc_by_name("am").unwrap();
    let rule = replace_middle(&["n"], vec![EmbeddingRule::new("n").arc_label("wire")]);
    let option = first_option(&host, &rule);

    let report = apply(&mut host, &rule, &option).unwrap();
    assert_eq!(report.diagnostics.len(), 2);
    assert!(report.diagnostics.iter().all(|d| matches!(
        d,
        Diagnostic::DanglingReattachmentFailure { .. }
    )));
    assert_eq!(
        report.diagnostics[0].severity(),
        graphsynth::Severity::Warning
    );
    assert_eq!(host.arc(am).unwrap().to(), None);
    assert_eq!(host.arc_count(), 2);
    assert_consistent(&host);
}

#[test]
fn duplication_needs_permission() {
    let mut host = through_middle();
    let mb = host.arc_by_name("mb").unwrap();
    host.remove_arc(mb);

    let without = replace_middle(
        &["n", "o"],
        vec![EmbeddingRule::new("n"), EmbeddingRule::new("o")],
    );
    let mut once = host.clone();
    let option = first_option(&once, &without);
    apply(&mut once, &without, &option).unwrap();
    assert_eq!(once.arc_count(), 1);

    let with = replace_middle(
        &["n", "o"],
        vec![EmbeddingRule::new("n").allow_duplication(), EmbeddingRule::new("o")],
    );
    let option = first_option(&host, &with);
    let report = apply(&mut host, &with, &option).unwrap();
    assert_eq!(host.arc_count(), 2);
    // the original arc plus one duplicate
    assert_eq!(report.added_arcs.len(), 1);
    let a = host.node_by_name("a").unwrap();
    assert!(host.arcs().all(|(_, arc)| arc.from() == Some(a)));
    assert_consistent(&host);
}

#[test]
fn arcs_losing_both_ends_are_reattached_end_by_end() {
    let mut host = single("m", "mid");
    let m = host.node_by_name("m").unwrap();
    let lp = host.add_arc(Arc::between("loop", m, m)).unwrap();

    let rule = replace_middle(
        &["n"],
        vec![EmbeddingRule::new("n").new_direction(ArcDirection::Into)],
    );
    let mut looped = host.clone();
    let option = first_option(&looped, &rule);
    let report = apply(&mut looped, &rule, &option).unwrap();
    assert!(report.diagnostics.is_empty());
    let n = report.added_nodes[0];
    let arc = looped.arc(lp).unwrap();
    assert_eq!((arc.from(), arc.to()), (Some(n), Some(n)));
    assert!(arc.directed);
    assert_consistent(&looped);

    // nothing fires: both ends are reported, not just the first
    let rule = replace_middle(&["n"], vec![EmbeddingRule::new("n").arc_label("wire")]);
    let option = first_option(&host, &rule);
    let report = apply(&mut host, &rule, &option).unwrap();
    let ends: Vec<ArcEnd> = report
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::DanglingReattachmentFailure { arc, end, .. } if *arc == lp => Some(*end),
            _ => None,
        })
        .collect();
    assert_eq!(ends, vec![ArcEnd::From, ArcEnd::To]);
    let arc = host.arc(lp).unwrap();
    assert_eq!((arc.from(), arc.to()), (None, None));
}

#[test]
fn reattachment_can_turn_arcs_around() {
    let mut host = through_middle();
    let am = host.arc_by_name("am").unwrap();
    let a = host.node_by_name("a").unwrap();
    let rule = replace_middle(
        &["n"],
        vec![
            EmbeddingRule::new("n")
                .from_l_node("x")
                .original_direction(ArcDirection::Into)
                .new_direction(ArcDirection::OutOf),
            EmbeddingRule::new("n"),
        ],
    );
    let option = first_option(&host, &rule);
    let report = apply(&mut host, &rule, &option).unwrap();
    let n = report.added_nodes[0];
    assert_eq!(host.arc(am).unwrap().from(), Some(n));
    assert_eq!(host.arc(am).unwrap().to(), Some(a));
}

#[test]
fn context_arcs_are_reconnected_in_place() {
    let mut l = Graph::new();
    let p = l.add_node(Node::new("p")).unwrap();
    let q = l.add_node(Node::new("q")).unwrap();
    l.add_node(Node::new("s")).unwrap();
    l.add_arc(Arc::between("e", p, q)).unwrap();
    let mut r = Graph::new();
    let p = r.add_node(Node::new("p")).unwrap();
    r.add_node(Node::new("q")).unwrap();
    let s = r.add_node(Node::new("s")).unwrap();
    r.add_arc(Arc::between("e", p, s)).unwrap();
    let rule = GrammarRule::new("swing", l.clone(), r).unwrap();
    assert_eq!(rule.k().arc_count(), 1);

    let mut host = l.copy();
    let e = host.arc_by_name("e").unwrap();
    let option = first_option(&host, &rule);
    let report = apply(&mut host, &rule, &option).unwrap();
    assert!(report.added_arcs.is_empty() && report.removed_arcs.is_empty());
    let arc = host.arc(e).unwrap();
    assert_eq!(arc.from(), host.node_by_name("p"));
    assert_eq!(arc.to(), host.node_by_name("s"));
}

#[test]
fn hyperarc_membership_follows_r() {
    let mut l = Graph::new();
    let x = l.add_node(Node::new("x")).unwrap();
    l.add_node(Node::new("y")).unwrap();
    l.add_hyperarc(HyperArc::new("h", [x])).unwrap();
    let mut r = Graph::new();
    let x = r.add_node(Node::new("x")).unwrap();
    let y = r.add_node(Node::new("y")).unwrap();
    r.add_hyperarc(HyperArc::new("h", [x, y])).unwrap();
    let rule = GrammarRule::new("join", l.clone(), r).unwrap();

    let mut host = l.copy();
    let option = first_option(&host, &rule);
    apply(&mut host, &rule, &option).unwrap();
    let h = host.hyperarc(host.hyperarc_by_name("h").unwrap()).unwrap();
    assert_eq!(h.nodes().len(), 2);
}

#[test]
fn deleted_nodes_leave_no_handles() {
    let mut host = chain(&["a", "gone", "c"]);
    let members = host.node_keys();
    host.add_hyperarc(HyperArc::new("all", members)).unwrap();
    let rule = GrammarRule::new("drop", single("x", "gone"), Graph::new()).unwrap();
    let option = first_option(&host, &rule);
    let report = apply(&mut host, &rule, &option).unwrap();

    assert_eq!(report.removed_nodes.len(), 1);
    assert_eq!(host.node_count(), 2);
    let all = host.hyperarc(host.hyperarc_by_name("all").unwrap()).unwrap();
    assert_eq!(all.nodes().len(), 2);
    assert_consistent(&host);
}

#[test]
fn ordered_global_labels_are_rewritten_in_place() {
    let mut host = Graph::new();
    for label in ["p", "q", "r"] {
        host.global_labels.insert(label);
    }
    let l = Graph::new().with_global_label("q");
    let r = Graph::new().with_global_label("x").with_global_label("y");
    let rule = GrammarRule::builder("expand", l, r)
        .ordered_global_labels()
        .build()
        .unwrap();
    let option = first_option(&host, &rule);
    assert_eq!(option.global_label_start, Some(1));
    apply(&mut host, &rule, &option).unwrap();
    let labels: Vec<String> = host.global_labels.iter().map(|l| l.to_string()).collect();
    assert_eq!(labels, ["p", "x", "y", "r"]);
}

#[test]
fn new_nodes_are_placed_relative_to_the_match() {
    let mut l = Graph::new();
    l.add_node(Node::new("p").with_label("tip").at(0.0, 0.0, 0.0)).unwrap();
    let mut r = Graph::new();
    let p = r.add_node(Node::new("p").at(1.0, 0.0, 0.0)).unwrap();
    let c = r.add_node(Node::new("c").with_label("tip").at(0.0, 1.0, 0.0)).unwrap();
    r.add_arc(Arc::between("pc", p, c)).unwrap();
    let rule = GrammarRule::builder("grow", l, r)
        .transform_node_positions()
        .build()
        .unwrap();

    let mut host = Graph::new();
    let root = host
        .add_node(Node::new("root").with_label("tip").at(5.0, 5.0, 0.0))
        .unwrap();
    let option = first_option(&host, &rule);
    assert_eq!(option.position_transform.apply([0.0, 0.0, 0.0]), [5.0, 5.0, 0.0]);

    let report = apply(&mut host, &rule, &option).unwrap();
    let child = host.node(report.added_nodes[0]).unwrap();
    assert_eq!(child.position, [5.0, 6.0, 0.0]);
    // the context node moved by its own displacement in the rule
    assert_eq!(host.node(root).unwrap().position, [6.0, 5.0, 0.0]);
}
