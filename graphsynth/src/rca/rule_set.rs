use crate::confluence::assign_local_confluence;
use crate::graph::Graph;
use crate::recognize::{Recognition, RecognitionStatus, RecognizeConfig, recognize};
use crate::rule::GrammarRule;

/// An ordered collection of rules recognized together.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleSet {
    pub name: String,
    /// Stamped onto every option as `rule_set_index`.
    pub index: usize,
    rules: Vec<GrammarRule>,
    /// How often each rule may be applied during one run. `None` is unlimited.
    limits: Vec<Option<usize>>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        RuleSet {
            name: name.into(),
            ..RuleSet::default()
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_rule(mut self, rule: GrammarRule) -> Self {
        self.add_rule(rule);
        self
    }

    /// Returns the new rule's number.
    pub fn add_rule(&mut self, rule: GrammarRule) -> usize {
        self.rules.push(rule);
        self.limits.push(None);
        self.rules.len() - 1
    }

    pub fn add_rule_with_limit(&mut self, rule: GrammarRule, limit: usize) -> usize {
        let number = self.add_rule(rule);
        self.limits[number] = Some(limit);
        number
    }

    pub fn rule(&self, number: usize) -> Option<&GrammarRule> {
        self.rules.get(number)
    }

    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    pub fn limit(&self, number: usize) -> Option<usize> {
        self.limits.get(number).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Recognizes every rule in order and numbers the options across the whole set, with
    /// local confluence assigned.
    pub fn recognize(&self, host: &Graph, config: &RecognizeConfig) -> Recognition {
        self.recognize_where(host, config, |_| true)
    }

    /// Like [`RuleSet::recognize`], skipping rules `enabled` rejects. Stops at the first rule
    /// whose recognition does not complete.
    pub(crate) fn recognize_where(
        &self,
        host: &Graph,
        config: &RecognizeConfig,
        enabled: impl Fn(usize) -> bool,
    ) -> Recognition {
        let mut options = Vec::new();
        let mut steps = 0;
        let mut status = RecognitionStatus::Complete;
        for (number, rule) in self.rules.iter().enumerate() {
            if !enabled(number) {
                continue;
            }
            let Recognition {
                options: found,
                status: found_status,
                steps: found_steps,
            } = recognize(host, rule, config);
            steps += found_steps;
            for mut option in found {
                option.rule_set_index = self.index;
                option.rule_number = number;
                option.option_number = options.len();
                options.push(option);
            }
            if found_status != RecognitionStatus::Complete {
                status = found_status;
                break;
            }
        }
        assign_local_confluence(&mut options);
        Recognition {
            options,
            status,
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::recognize::CancellationToken;

    fn keep(name: &str, label: &str) -> GrammarRule {
        let mut l = Graph::new();
        l.add_node(Node::new("x").with_label(label)).unwrap();
        GrammarRule::new(name, l.clone(), l).unwrap()
    }

    fn host() -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::new("a").with_label("x")).unwrap();
        g.add_node(Node::new("b").with_label("x")).unwrap();
        g
    }

    #[test_log::test]
    fn options_are_numbered_across_rules() {
        let rules = RuleSet::new("pair")
            .with_index(3)
            .with_rule(keep("first", "x"))
            .with_rule(keep("second", "x"));
        let config = RecognizeConfig::new();
        let recognition = rules.recognize(&host(), &config);

        assert!(recognition.is_complete());
        let numbering: Vec<(usize, usize, usize)> = recognition
            .options
            .iter()
            .map(|o| (o.rule_set_index, o.rule_number, o.option_number))
            .collect();
        assert_eq!(numbering, vec![(3, 0, 0), (3, 0, 1), (3, 1, 2), (3, 1, 3)]);
        let single = recognize(&host(), &keep("first", "x"), &config).steps;
        assert_eq!(recognition.steps, 2 * single);
    }

    #[test_log::test]
    fn disabled_rules_are_skipped() {
        let rules = RuleSet::new("pair")
            .with_rule(keep("first", "x"))
            .with_rule(keep("second", "x"));
        let recognition = rules.recognize_where(&host(), &RecognizeConfig::new(), |n| n == 1);
        assert_eq!(recognition.options.len(), 2);
        assert!(recognition.options.iter().all(|o| o.rule_number == 1));
        assert_eq!(recognition.options[0].option_number, 0);
    }

    #[test_log::test]
    fn incomplete_recognition_stops_the_set() {
        let token = CancellationToken::new();
        token.cancel();
        let rules = RuleSet::new("pair")
            .with_rule(keep("first", "x"))
            .with_rule(keep("second", "x"));
        let recognition =
            rules.recognize(&host(), &RecognizeConfig::new().with_cancellation(token));
        assert_eq!(recognition.status, RecognitionStatus::Cancelled);
        assert!(recognition.options.is_empty());
    }
}
