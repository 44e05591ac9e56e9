//! Type→tag view of the oracle's valid-action set at one configuration.

use crate::action::{ActionType, EdgeLabel, OracleAction, NUM_TYPES};

/// For each action type the oracle currently accepts, the tag it expects.
///
/// At a well-formed configuration the oracle offers at most one tag per type.
/// When it offers several, the lexicographically smallest tag wins ("no tag"
/// sorts first) and the type is reported in `ambiguous()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTags {
    slots: [Option<Option<EdgeLabel>>; NUM_TYPES],
    ambiguous: Vec<ActionType>,
}

fn tag_key(tag: Option<EdgeLabel>) -> &'static str {
    tag.map_or("", EdgeLabel::as_str)
}

impl TypeTags {
    pub fn from_valid(valid: &[OracleAction]) -> Self {
        let mut slots = [None; NUM_TYPES];
        let mut ambiguous = Vec::new();

        for a in valid {
            let slot = &mut slots[a.action_type.code() as usize];
            match *slot {
                None => *slot = Some(a.tag),
                Some(prev) if prev == a.tag => {}
                Some(prev) => {
                    if !ambiguous.contains(&a.action_type) {
                        ambiguous.push(a.action_type);
                    }
                    if tag_key(a.tag) < tag_key(prev) {
                        *slot = Some(a.tag);
                    }
                }
            }
        }

        Self { slots, ambiguous }
    }

    /// True if the oracle accepts some action of type `t` here.
    #[inline]
    pub fn contains(&self, t: ActionType) -> bool {
        self.slots[t.code() as usize].is_some()
    }

    /// `None` if `t` is not valid here; `Some(tag)` otherwise.
    #[inline]
    pub fn tag_for(&self, t: ActionType) -> Option<Option<EdgeLabel>> {
        self.slots[t.code() as usize]
    }

    /// Types for which the oracle offered more than one distinct tag.
    pub fn ambiguous(&self) -> &[ActionType] {
        &self.ambiguous
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Valid types in code order.
    pub fn types(&self) -> impl Iterator<Item = ActionType> + '_ {
        ActionType::ALL
            .into_iter()
            .filter(move |&t| self.contains(t))
    }
}
