//! Clarification dialog: four sequential questions for an under-specified
//! recommendation request.
//!
//! Questions always advance in the fixed order vibe → budget → timing →
//! social, but an answer is applied to whichever still-missing fields it
//! parses as; answering out of order works, and a reply that fills two
//! fields skips a question.

use crate::nlu::context::{self, Budget, FindContext, Social, Timing, Vibe};

/// Accumulated clarification answers plus the utterance that started it.
#[derive(Debug, Clone)]
pub struct ClarificationState {
    pub seed_prompt: String,
    pub vibe: Option<Vibe>,
    pub budget: Option<Budget>,
    pub timing: Option<Timing>,
    pub social: Option<Social>,
}

impl ClarificationState {
    /// Open a session for an utterance, pre-filling whatever structure it
    /// already carried.
    pub fn open(seed_prompt: &str) -> Self {
        let ctx = context::extract(seed_prompt);
        Self {
            seed_prompt: seed_prompt.to_string(),
            vibe: ctx.vibe,
            budget: ctx.budget,
            timing: ctx.timing,
            social: ctx.social,
        }
    }

    /// Parse a reply against every still-missing dimension and apply all
    /// matches. Returns how many fields the reply filled.
    pub fn apply_reply(&mut self, reply: &str) -> usize {
        let ctx = context::extract(reply);
        let mut filled = 0;

        if self.vibe.is_none() {
            if let Some(vibe) = ctx.vibe {
                self.vibe = Some(vibe);
                filled += 1;
            }
        }
        if self.budget.is_none() {
            if let Some(budget) = ctx.budget {
                self.budget = Some(budget);
                filled += 1;
            }
        }
        if self.timing.is_none() {
            if let Some(timing) = ctx.timing {
                self.timing = Some(timing);
                filled += 1;
            }
        }
        if self.social.is_none() {
            if let Some(social) = ctx.social {
                self.social = Some(social);
                filled += 1;
            }
        }

        filled
    }

    pub fn is_complete(&self) -> bool {
        self.vibe.is_some()
            && self.budget.is_some()
            && self.timing.is_some()
            && self.social.is_some()
    }

    /// The next question, in fixed order, or `None` when complete.
    pub fn next_question(&self) -> Option<&'static str> {
        if self.vibe.is_none() {
            Some("Are you feeling outdoors, indoors, food-focused, or a mix?")
        } else if self.budget.is_none() {
            Some("What's the budget — free, cheap, or flexible?")
        } else if self.timing.is_none() {
            Some("When is this for — right now, a quick break, tonight, or the weekend?")
        } else if self.social.is_none() {
            Some("Who's going — just you, a date, or a group?")
        } else {
            None
        }
    }

    /// Merge the clarified answers over the seed utterance's own
    /// extraction, for handing to the ranker.
    pub fn into_context(self) -> FindContext {
        let mut ctx = context::extract(&self.seed_prompt);
        ctx.vibe = self.vibe;
        ctx.budget = self.budget;
        ctx.timing = self.timing;
        ctx.social = self.social;
        ctx
    }
}
