//! Declarative chat rule table.
//!
//! Fixed keyword→response behavior lives in `config/rules.yaml` as data:
//! (patterns, response variants, optional navigation, optional flow
//! trigger). A single generic matcher consumes the list, so the matching
//! algorithm is testable independent of rule content, and flow triggers
//! are tagged variants rather than sentinel response strings.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::nlu::fuzzy;

/// A flow the assistant can hand control to from a rule match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Answer from the reservation status log.
    ReservationStatus,
}

/// Navigation suggestion attached to a rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleNavigation {
    pub target_view: String,
    pub label: String,
}

/// One declarative rule: tolerant patterns plus what to do on a hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRule {
    pub id: String,
    pub patterns: Vec<String>,
    pub responses: Vec<String>,
    #[serde(default)]
    pub navigate: Option<RuleNavigation>,
    #[serde(default)]
    pub flow: Option<FlowKind>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<ChatRule>,
}

/// The rule table, loaded once at engine construction.
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: Vec<ChatRule>,
}

impl RuleBook {
    /// Parse the embedded default table.
    pub fn embedded() -> Result<Self, serde_yaml::Error> {
        Self::from_yaml_str(include_str!("../../config/rules.yaml"))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let file: RuleFile = serde_yaml::from_str(raw)?;
        Ok(Self { rules: file.rules })
    }

    pub fn rules(&self) -> &[ChatRule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&ChatRule> {
        self.rules.get(index)
    }

    /// Best-matching rule index for an utterance, if any pattern hits.
    /// More matched significant words wins; ties go to the earlier rule.
    pub fn match_rule(&self, utterance: &str) -> Option<usize> {
        let tokens = fuzzy::tokenize(utterance);
        let mut best: Option<(usize, usize)> = None;

        for (idx, rule) in self.rules.iter().enumerate() {
            for pattern in &rule.patterns {
                if !fuzzy::phrase_matches(pattern, &tokens) {
                    continue;
                }
                let weight = fuzzy::match_weight(pattern, &tokens).max(1);
                let better = match best {
                    None => true,
                    Some((_, best_weight)) => weight > best_weight,
                };
                if better {
                    best = Some((idx, weight));
                }
            }
        }

        best.map(|(idx, _)| idx)
    }

    /// Pick a response variant, seeded from the utterance so identical
    /// inputs phrase identically.
    pub fn response_for(&self, rule: &ChatRule, utterance: &str) -> String {
        let mut rng = StdRng::seed_from_u64(fuzzy::utterance_seed(utterance));
        rule.responses
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| "Okay.".to_string())
    }
}
