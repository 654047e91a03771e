//! The recognize-choose-apply loop that grows a candidate design from a seed graph.

use crate::apply::apply;
use crate::confluence::are_confluent;
use crate::diagnostics::Diagnostic;
use crate::graph::{ArcKey, Graph, HyperArcKey, NodeKey};
use crate::option::RuleOption;
use crate::recognize::{RecognitionStatus, RecognizeConfig};
use crate::rule::GrammarRule;
use crate::util::log;
use error_stack::Report;
use thiserror::Error;

mod chooser;
mod rule_set;

pub use chooser::{Chooser, FirstChooser, ScriptedChooser};
pub use rule_set::RuleSet;

pub type RcaResult<T> = Result<T, Report<RcaError>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RcaError {
    #[error("the chooser picked option {index}, but only {available} were offered")]
    InvalidChoice { index: usize, available: usize },
}

/// One applied option, in the order it was applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecipeStep {
    pub rule_set_index: usize,
    pub rule_number: usize,
    pub option_number: usize,
    pub rule_name: String,
    pub nodes: Vec<NodeKey>,
    pub arcs: Vec<ArcKey>,
    pub hyperarcs: Vec<HyperArcKey>,
}

impl RecipeStep {
    fn new(rule: &GrammarRule, option: &RuleOption) -> Self {
        RecipeStep {
            rule_set_index: option.rule_set_index,
            rule_number: option.rule_number,
            option_number: option.option_number,
            rule_name: rule.name().to_string(),
            nodes: option.nodes.iter().flatten().copied().collect(),
            arcs: option.arcs.iter().flatten().copied().collect(),
            hyperarcs: option.hyperarcs.iter().flatten().copied().collect(),
        }
    }
}

/// A design under construction.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    pub graph: Graph,
    pub recipe: Vec<RecipeStep>,
    /// Completed cycles.
    pub generation: usize,
    /// Evaluation results, filled in by whoever evaluates designs.
    pub performance: Vec<f64>,
}

impl Candidate {
    pub fn new(seed: Graph) -> Self {
        Candidate {
            graph: seed,
            ..Candidate::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RcaConfig {
    pub max_cycles: usize,
    pub recognize: RecognizeConfig,
    /// Apply every chosen option of a cycle instead of only the first. Options that overlap
    /// one applied earlier in the cycle are skipped.
    pub apply_all_chosen: bool,
}

impl Default for RcaConfig {
    fn default() -> Self {
        RcaConfig {
            max_cycles: 100,
            recognize: RecognizeConfig::default(),
            apply_all_chosen: false,
        }
    }
}

impl RcaConfig {
    pub fn with_max_cycles(mut self, cycles: usize) -> Self {
        self.max_cycles = cycles;
        self
    }

    pub fn with_recognize(mut self, recognize: RecognizeConfig) -> Self {
        self.recognize = recognize;
        self
    }

    pub fn apply_all_chosen(mut self) -> Self {
        self.apply_all_chosen = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoOptions,
    ChooserStopped,
    MaxCycles,
    Cancelled,
    BudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct RcaReport {
    pub cycles: usize,
    pub applied: usize,
    pub stop_reason: StopReason,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs recognize, choose, apply on `candidate` until no option is left, the chooser returns
/// nothing, recognition is cancelled or out of budget, or `max_cycles` is reached.
pub fn run(
    candidate: &mut Candidate,
    rule_set: &RuleSet,
    chooser: &mut impl Chooser,
    config: &RcaConfig,
) -> RcaResult<RcaReport> {
    let mut applications = vec![0usize; rule_set.len()];
    let mut report = RcaReport {
        cycles: 0,
        applied: 0,
        stop_reason: StopReason::MaxCycles,
        diagnostics: Vec::new(),
    };

    while report.cycles < config.max_cycles {
        let recognition = rule_set.recognize_where(&candidate.graph, &config.recognize, |n| {
            rule_set.limit(n).is_none_or(|limit| applications[n] < limit)
        });
        match recognition.status {
            RecognitionStatus::Complete => {}
            RecognitionStatus::Cancelled => {
                report.stop_reason = StopReason::Cancelled;
                break;
            }
            RecognitionStatus::BudgetExhausted => {
                report.diagnostics.push(Diagnostic::RecognitionIncomplete {
                    reason: format!("step budget exhausted in cycle {}", report.cycles),
                });
                report.stop_reason = StopReason::BudgetExhausted;
                break;
            }
        }
        let options = recognition.options;
        if options.is_empty() {
            report.stop_reason = StopReason::NoOptions;
            break;
        }

        let mut choice = chooser.choose(&options, candidate);
        if choice.is_empty() {
            report.stop_reason = StopReason::ChooserStopped;
            break;
        }
        if let Some(&index) = choice.iter().find(|&&i| i >= options.len()) {
            return Err(Report::new(RcaError::InvalidChoice {
                index,
                available: options.len(),
            }));
        }
        if !config.apply_all_chosen {
            choice.truncate(1);
        }

        let mut applied_this_cycle: Vec<&RuleOption> = Vec::new();
        for index in choice {
            let option = &options[index];
            if applied_this_cycle
                .iter()
                .any(|earlier| !are_confluent(earlier, option))
            {
                report.diagnostics.push(Diagnostic::NonConfluentChoiceSkipped {
                    option_number: option.option_number,
                });
                continue;
            }
            let Some(rule) = rule_set.rule(option.rule_number) else {
                continue;
            };
            let applied = match apply(&mut candidate.graph, rule, option) {
                Ok(applied) => applied,
                Err(err) => {
                    log::warn!(
                        "option {} of rule `{}` not applied in cycle {}: {err:?}",
                        option.option_number,
                        rule.name(),
                        report.cycles
                    );
                    report.diagnostics.push(Diagnostic::OptionNotApplied {
                        option_number: option.option_number,
                        reason: err.current_context().to_string(),
                    });
                    continue;
                }
            };
            report.diagnostics.extend(applied.diagnostics);
            candidate.recipe.push(RecipeStep::new(rule, option));
            report.applied += 1;

            applications[option.rule_number] += 1;
            if rule_set.limit(option.rule_number) == Some(applications[option.rule_number]) {
                report.diagnostics.push(Diagnostic::RuleLimitReached {
                    rule_set_index: rule_set.index,
                    rule_number: option.rule_number,
                });
            }
            applied_this_cycle.push(option);
        }

        candidate.generation += 1;
        report.cycles += 1;
        log::debug!(
            "cycle {} of `{}` done, {} steps recorded",
            report.cycles,
            rule_set.name,
            candidate.recipe.len()
        );
    }

    log::info!(
        "run over `{}` stopped after {} cycles: {:?}",
        rule_set.name,
        report.cycles,
        report.stop_reason
    );
    Ok(report)
}
