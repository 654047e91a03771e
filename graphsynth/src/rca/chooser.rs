use super::Candidate;
use crate::option::RuleOption;
use std::collections::VecDeque;

/// Picks which of the recognized options to apply.
///
/// Returns indices into `options`. An empty choice ends the run.
pub trait Chooser {
    fn choose(&mut self, options: &[RuleOption], candidate: &Candidate) -> Vec<usize>;
}

impl<F> Chooser for F
where
    F: FnMut(&[RuleOption], &Candidate) -> Vec<usize>,
{
    fn choose(&mut self, options: &[RuleOption], candidate: &Candidate) -> Vec<usize> {
        self(options, candidate)
    }
}

/// Always the first option.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChooser;

impl Chooser for FirstChooser {
    fn choose(&mut self, options: &[RuleOption], _candidate: &Candidate) -> Vec<usize> {
        if options.is_empty() {
            Vec::new()
        } else {
            vec![0]
        }
    }
}

/// Replays a fixed sequence of choices, one per cycle, then stops.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChooser {
    script: VecDeque<Vec<usize>>,
}

impl ScriptedChooser {
    pub fn new(script: impl IntoIterator<Item = Vec<usize>>) -> Self {
        ScriptedChooser {
            script: script.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Chooser for ScriptedChooser {
    fn choose(&mut self, _options: &[RuleOption], _candidate: &Candidate) -> Vec<usize> {
        self.script.pop_front().unwrap_or_default()
    }
}
