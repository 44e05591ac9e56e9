//! Partial-credit reward for every vocabulary action at one configuration.
//!
//! - 0.0: the oracle does not accept this action type here
//! - 0.5: type accepted, but the action's label differs from the oracle's tag
//! - 1.0: type accepted and the action is unlabeled or its label matches

use crate::action::{vocab, ActionType, OracleAction, VocabAction, V};
use crate::valid::TypeTags;

/// Credit for choosing an action type the oracle would accept.
pub const TYPE_CREDIT: f64 = 0.5;
/// Additional credit when the label also matches (or the action has none).
pub const LABEL_CREDIT: f64 = 0.5;

/// Reward for a single vocabulary action against the oracle's type→tag view.
pub fn reward(a: &VocabAction, tags: &TypeTags) -> f64 {
    let mut r = 0.0;
    if let Some(tag) = tags.tag_for(a.action_type) {
        r += TYPE_CREDIT;
        if !a.has_label() || a.label == tag {
            r += LABEL_CREDIT;
        }
    }
    r
}

/// Rewards for the whole vocabulary at one configuration, aligned with `vocab()`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepScore {
    pub rewards: [f64; V],
    /// Types whose oracle tag was ambiguous at this configuration.
    pub ambiguous: Vec<ActionType>,
}

impl StepScore {
    pub fn iter(&self) -> impl Iterator<Item = (&'static VocabAction, f64)> + '_ {
        vocab().iter().zip(self.rewards.iter().copied())
    }

    /// Number of vocabulary actions that scored exactly `r`.
    pub fn count(&self, r: f64) -> usize {
        self.rewards.iter().filter(|&&x| x == r).count()
    }
}

/// Score all `V` vocabulary actions against the oracle's valid set.
pub fn score_all(valid: &[OracleAction]) -> StepScore {
    let tags = TypeTags::from_valid(valid);
    score_with(&tags)
}

pub fn score_with(tags: &TypeTags) -> StepScore {
    let mut rewards = [0.0f64; V];
    for (out, a) in rewards.iter_mut().zip(vocab()) {
        *out = reward(a, tags);
    }
    StepScore {
        rewards,
        ambiguous: tags.ambiguous().to_vec(),
    }
}
