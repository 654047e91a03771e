//! Grows a random tree from a single tip and prints every intermediate design as DOT.
//!
//! Usage: `random_designer [seed] [cycles]`. Set `RUST_LOG=debug` to follow the run.

use graphsynth::graph::DotCollector;
use graphsynth::prelude::*;
use graphsynth::{Severity, maximal_confluent_sets};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks a random option, or now and then a whole set of options that can be applied together.
struct RandomChooser {
    rng: StdRng,
    /// Chance of applying a maximal confluent set instead of a single option.
    simultaneous: f64,
    dots: DotCollector,
}

impl RandomChooser {
    fn new(seed: u64) -> Self {
        RandomChooser {
            rng: StdRng::seed_from_u64(seed),
            simultaneous: 0.25,
            dots: DotCollector::new(),
        }
    }
}

impl Chooser for RandomChooser {
    fn choose(&mut self, options: &[RuleOption], candidate: &Candidate) -> Vec<usize> {
        self.dots.collect(&candidate.graph);
        if options.is_empty() {
            return Vec::new();
        }
        if self.rng.random_bool(self.simultaneous) {
            let sets = maximal_confluent_sets(options);
            let pick = self.rng.random_range(0..sets.len());
            // option numbers are positions, the rule set numbered them
            return sets[pick].iter().copied().collect();
        }
        vec![self.rng.random_range(0..options.len())]
    }
}

/// A growth point of the tree. New nodes are placed relative to the matched tip.
fn tip(name: &str) -> Node {
    Node::new(name).with_label("tip")
}

fn grow() -> GrammarRule {
    let mut l = Graph::new();
    l.add_node(tip("p")).unwrap();
    let mut r = Graph::new();
    let p = r.add_node(Node::new("p").with_label("trunk")).unwrap();
    let c = r.add_node(tip("c").at(0.0, 1.0, 0.0)).unwrap();
    r.add_arc(Arc::between("pc", p, c)).unwrap();
    GrammarRule::new("grow", l, r).unwrap()
}

fn branch() -> GrammarRule {
    let mut l = Graph::new();
    l.add_node(tip("p")).unwrap();
    let mut r = Graph::new();
    let p = r.add_node(Node::new("p").with_label("fork")).unwrap();
    let left = r.add_node(tip("left").at(-1.0, 1.0, 0.0)).unwrap();
    let right = r.add_node(tip("right").at(1.0, 1.0, 0.0)).unwrap();
    r.add_arc(Arc::between("pl", p, left)).unwrap();
    r.add_arc(Arc::between("pr", p, right)).unwrap();
    GrammarRule::new("branch", l, r).unwrap()
}

/// Only tips whose parent is not already a fork may be capped.
fn cap() -> GrammarRule {
    let mut l = Graph::new();
    let p = l.add_node(tip("p")).unwrap();
    let parent = l.add_node(Node::new("parent").with_label("fork")).unwrap();
    l.add_arc(Arc::between("up", parent, p)).unwrap();
    let r = {
        let mut r = Graph::new();
        r.add_node(Node::new("p").with_label("leaf")).unwrap();
        r
    };
    GrammarRule::builder("cap", l, r)
        .node_condition("parent", NodeCondition::new().not_exist())
        .arc_condition("up", ArcCondition::new().not_exist())
        .build()
        .unwrap()
}

fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(7);
    let cycles: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(12);

    let mut rules = RuleSet::new("tree");
    rules.add_rule(grow());
    rules.add_rule_with_limit(branch(), 3);
    rules.add_rule_with_limit(cap(), 2);

    let mut seed_graph = Graph::with_name("seedling");
    seed_graph.add_node(tip("root")).unwrap();
    let mut candidate = Candidate::new(seed_graph);
    let mut chooser = RandomChooser::new(seed);
    let config = RcaConfig::default().with_max_cycles(cycles).apply_all_chosen();

    match rca::run(&mut candidate, &rules, &mut chooser, &config) {
        Ok(report) => {
            log::info!(
                "{} options applied in {} cycles, stopped: {:?}",
                report.applied,
                report.cycles,
                report.stop_reason
            );
            for diagnostic in &report.diagnostics {
                match diagnostic.severity() {
                    Severity::Warning => log::warn!("{diagnostic}"),
                    Severity::Info => log::info!("{diagnostic}"),
                }
            }
        }
        Err(err) => {
            log::error!("design run failed: {err:?}");
            std::process::exit(1);
        }
    }

    for step in &candidate.recipe {
        log::debug!("{} at {:?}", step.rule_name, step.nodes);
    }
    chooser.dots.collect(&candidate.graph);
    println!("{}", chooser.dots.finalize());
}
