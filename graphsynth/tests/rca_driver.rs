mod util;

use graphsynth::prelude::*;
use graphsynth::rca::RcaError;
use test_log::test;
use util::*;

fn tree() -> RuleSet {
    RuleSet::new("tree").with_rule(grow())
}

#[test]
fn first_chooser_grows_until_max_cycles() {
    let mut candidate = Candidate::new(single("root", "tip"));
    let config = RcaConfig::default().with_max_cycles(3);
    let report = rca::run(&mut candidate, &tree(), &mut FirstChooser, &config).unwrap();

    assert_eq!(report.stop_reason, StopReason::MaxCycles);
    assert_eq!((report.cycles, report.applied), (3, 3));
    assert_eq!(candidate.generation, 3);
    assert_eq!(candidate.graph.node_count(), 4);
    assert_eq!(candidate.recipe.len(), 3);
    assert!(candidate.recipe.iter().all(|step| step.rule_name == "grow"));
    assert_consistent(&candidate.graph);
}

#[test]
fn run_stops_without_options() {
    let mut candidate = Candidate::new(chain(&["X", "X"]));
    let rules = RuleSet::new("relabel").with_rule(relabel("X", "Y"));
    let report = rca::run(&mut candidate, &rules, &mut FirstChooser, &RcaConfig::default()).unwrap();
    assert_eq!(report.stop_reason, StopReason::NoOptions);
    assert_eq!(report.cycles, 2);
}

#[test]
fn scripted_choices_are_replayed() {
    let mut candidate = Candidate::new(chain(&["X", "X"]));
    let rules = RuleSet::new("relabel").with_rule(relabel("X", "Y"));
    let mut chooser = ScriptedChooser::new([vec![1]]);
    let report = rca::run(&mut candidate, &rules, &mut chooser, &RcaConfig::default()).unwrap();

    assert_eq!(report.stop_reason, StopReason::ChooserStopped);
    assert_eq!(report.cycles, 1);
    assert_eq!(chooser.remaining(), 0);
    let step = &candidate.recipe[0];
    assert_eq!(step.option_number, 1);
    assert_eq!(step.nodes, vec![candidate.graph.node_by_name("n1").unwrap()]);
}

#[test]
fn rule_limits_disable_rules() {
    let mut rules = RuleSet::new("tree");
    let number = rules.add_rule_with_limit(grow(), 2);
    assert_eq!(rules.limit(number), Some(2));

    let mut candidate = Candidate::new(single("root", "tip"));
    let report = rca::run(&mut candidate, &rules, &mut FirstChooser, &RcaConfig::default()).unwrap();
    assert_eq!(report.stop_reason, StopReason::NoOptions);
    assert_eq!(report.applied, 2);
    assert_eq!(candidate.graph.node_count(), 3);
    assert!(report.diagnostics.contains(&Diagnostic::RuleLimitReached {
        rule_set_index: 0,
        rule_number: number,
    }));
}

#[test]
fn all_chosen_options_apply_in_one_cycle() {
    let mut candidate = Candidate::new(chain(&["X", "X", "X"]));
    let rules = RuleSet::new("relabel").with_rule(relabel("X", "Y"));
    let config = RcaConfig::default().with_max_cycles(1).apply_all_chosen();
    let mut everything = |options: &[RuleOption], _: &Candidate| -> Vec<usize> {
        (0..options.len()).collect()
    };
    let report = rca::run(&mut candidate, &rules, &mut everything, &config).unwrap();

    assert_eq!((report.cycles, report.applied), (1, 3));
    assert!(
        candidate
            .graph
            .nodes()
            .all(|(_, n)| n.labels.contains(&Label::from("Y")))
    );
}

#[test]
fn overlapping_choices_are_skipped() {
    let mut candidate = Candidate::new(chain(&["X", "X"]));
    let rules = RuleSet::new("relabel").with_rule(relabel("X", "Y"));
    let config = RcaConfig::default().with_max_cycles(1).apply_all_chosen();
    let mut twice = |_: &[RuleOption], _: &Candidate| -> Vec<usize> { vec![0, 0] };
    let report = rca::run(&mut candidate, &rules, &mut twice, &config).unwrap();

    assert_eq!(report.applied, 1);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::NonConfluentChoiceSkipped { option_number: 0 }]
    );
}

/// `m` is replaced by `n`, and arcs into `m` are turned to leave `n`.
fn replace_and_turn() -> GrammarRule {
    GrammarRule::builder("replace", single("x", "mid"), single("n", "new"))
        .embedding_rule(EmbeddingRule::new("n").new_direction(ArcDirection::OutOf))
        .build()
        .unwrap()
}

/// A `src` node with an outgoing arc, whatever it points at.
fn outgoing() -> GrammarRule {
    let mut l = Graph::new();
    let p = l.add_node(Node::new("p").with_label("src")).unwrap();
    l.add_arc(Arc::dangling("t", Some(p), None)).unwrap();
    GrammarRule::new("outgoing", l.clone(), l).unwrap()
}

#[test]
fn options_gone_stale_are_reported_and_the_run_continues() {
    let host = chain(&["src", "mid"]);
    let e0 = host.arc_by_name("e0").unwrap();
    let rules = RuleSet::new("mixed")
        .with_rule(replace_and_turn())
        .with_rule(outgoing());
    let options = rules.recognize(&host, &RecognizeConfig::new()).options;
    assert_eq!(options.len(), 2);
    assert!(graphsynth::are_confluent(&options[0], &options[1]));

    let mut candidate = Candidate::new(host);
    let config = RcaConfig::default().with_max_cycles(2).apply_all_chosen();
    let mut both = |options: &[RuleOption], _: &Candidate| -> Vec<usize> {
        (0..options.len()).collect()
    };
    let report = rca::run(&mut candidate, &rules, &mut both, &config).unwrap();

    // the first cycle turns `e0` around, so the second option no longer fits
    assert!(matches!(
        report.diagnostics.first(),
        Some(Diagnostic::OptionNotApplied { option_number: 1, .. })
    ));
    assert_eq!(report.applied, 1);
    assert_eq!(candidate.recipe.len(), 1);
    assert_eq!(candidate.recipe[0].rule_name, "replace");
    // the next cycle is still recognized, and finds nothing left to do
    assert_eq!(report.cycles, 1);
    assert_eq!(report.stop_reason, StopReason::NoOptions);
    let n = candidate.graph.node_by_name("n").unwrap();
    assert_eq!(candidate.graph.arc(e0).unwrap().from(), Some(n));
    assert_consistent(&candidate.graph);
}

#[test]
fn invalid_choices_are_errors() {
    let mut candidate = Candidate::new(single("root", "tip"));
    let mut out_of_range = |_: &[RuleOption], _: &Candidate| -> Vec<usize> { vec![5] };
    let err = rca::run(&mut candidate, &tree(), &mut out_of_range, &RcaConfig::default())
        .unwrap_err();
    assert_eq!(
        err.current_context(),
        &RcaError::InvalidChoice {
            index: 5,
            available: 1,
        }
    );
}

#[test]
fn cancellation_and_budget_end_the_run() {
    let token = CancellationToken::new();
    token.cancel();
    let config = RcaConfig::default()
        .with_recognize(RecognizeConfig::new().with_cancellation(token));
    let mut candidate = Candidate::new(single("root", "tip"));
    let report = rca::run(&mut candidate, &tree(), &mut FirstChooser, &config).unwrap();
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.cycles, 0);

    let config = RcaConfig::default().with_recognize(RecognizeConfig::new().with_max_steps(0));
    let report = rca::run(&mut candidate, &tree(), &mut FirstChooser, &config).unwrap();
    assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::RecognitionIncomplete { .. }]
    ));
    assert_eq!(candidate.graph.node_count(), 1);
}

/// Removes the tip and gives its label back to the parent.
fn prune() -> GrammarRule {
    let mut l = Graph::new();
    let p = l.add_node(Node::new("p")).unwrap();
    let c = l.add_node(Node::new("c").with_label("tip")).unwrap();
    l.add_arc(Arc::between("pc", p, c)).unwrap();
    GrammarRule::new("prune", l, single("p", "tip")).unwrap()
}

#[test]
fn random_runs_stay_consistent() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let rules = RuleSet::new("mixed").with_rule(grow()).with_rule(prune());
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pick = |options: &[RuleOption], _: &Candidate| -> Vec<usize> {
            vec![rng.random_range(0..options.len())]
        };
        let mut candidate = Candidate::new(single("root", "tip"));
        let config = RcaConfig::default().with_max_cycles(30);
        let report = rca::run(&mut candidate, &rules, &mut pick, &config).unwrap();

        assert_eq!(report.applied, candidate.recipe.len());
        assert_consistent(&candidate.graph);
        let tips = candidate
            .graph
            .nodes()
            .filter(|(_, n)| n.labels.contains(&Label::from("tip")))
            .count();
        assert_eq!(tips, 1, "seed {seed}");
    }
}

#[test]
fn independent_runs_share_nothing() {
    let rules = tree();
    let rules = &rules;
    let sizes: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|cycles| {
                s.spawn(move || {
                    let mut candidate = Candidate::new(single("root", "tip"));
                    let config = RcaConfig::default().with_max_cycles(cycles);
                    rca::run(&mut candidate, rules, &mut FirstChooser, &config).unwrap();
                    candidate.graph.node_count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sizes, vec![2, 3, 4, 5]);
}
