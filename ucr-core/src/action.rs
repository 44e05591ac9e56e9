//! Action vocabulary definition and integer encoding.
//!
//! Vocabulary size: V = 88
//! - idx 0..=3   : unlabeled SHIFT, REDUCE, SWAP, FINISH
//! - idx 4..=87  : labeled actions, label-major / type-minor:
//!   idx = 4 + label_idx * 6 + labeled_type_pos
//!
//! Encoding is the triple `(type10, hasLabel, label14)` where `label14` is
//! `label_idx + 1` when a label is present and `0` otherwise.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NUM_TYPES: usize = 10;
pub const NUM_LABELS: usize = 14;
pub const NUM_UNLABELED: usize = 4;
pub const NUM_LABELED_TYPES: usize = 6;
pub const V: usize = NUM_UNLABELED + NUM_LABELED_TYPES * NUM_LABELS; // 88

/// Length of an encoded action when appended to an observation.
pub const ENCODING_LEN: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("invalid action code ({type_code}, {has_label}, {label_code}): {reason}")]
    InvalidCode {
        type_code: u8,
        has_label: u8,
        label_code: u8,
        reason: &'static str,
    },
    #[error("unknown action name: {0:?}")]
    UnknownName(String),
    #[error("action {0} is not in the vocabulary")]
    NotInVocab(String),
}

/// Transition type. Ordinal position is the integer code (0..=9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionType {
    Swap,
    Implicit,
    Node,
    RightEdge,
    LeftEdge,
    RightRemote,
    LeftRemote,
    Shift,
    Finish,
    Reduce,
}

impl ActionType {
    pub const ALL: [ActionType; NUM_TYPES] = [
        ActionType::Swap,
        ActionType::Implicit,
        ActionType::Node,
        ActionType::RightEdge,
        ActionType::LeftEdge,
        ActionType::RightRemote,
        ActionType::LeftRemote,
        ActionType::Shift,
        ActionType::Finish,
        ActionType::Reduce,
    ];

    /// Types that never carry a label, in vocabulary order.
    pub const UNLABELED: [ActionType; NUM_UNLABELED] = [
        ActionType::Shift,
        ActionType::Reduce,
        ActionType::Swap,
        ActionType::Finish,
    ];

    /// Types that always carry a label, in vocabulary order.
    pub const LABELED: [ActionType; NUM_LABELED_TYPES] = [
        ActionType::Implicit,
        ActionType::Node,
        ActionType::RightEdge,
        ActionType::LeftEdge,
        ActionType::RightRemote,
        ActionType::LeftRemote,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<ActionType> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn takes_label(self) -> bool {
        !matches!(
            self,
            ActionType::Shift | ActionType::Reduce | ActionType::Swap | ActionType::Finish
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Swap => "SWAP",
            ActionType::Implicit => "IMPLICIT",
            ActionType::Node => "NODE",
            ActionType::RightEdge => "RIGHT-EDGE",
            ActionType::LeftEdge => "LEFT-EDGE",
            ActionType::RightRemote => "RIGHT-REMOTE",
            ActionType::LeftRemote => "LEFT-REMOTE",
            ActionType::Shift => "SHIFT",
            ActionType::Finish => "FINISH",
            ActionType::Reduce => "REDUCE",
        }
    }

    fn labeled_pos(self) -> Option<usize> {
        Self::LABELED.iter().position(|&t| t == self)
    }

    fn unlabeled_pos(self) -> Option<usize> {
        Self::UNLABELED.iter().position(|&t| t == self)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ActionError::UnknownName(s.to_string()))
    }
}

/// UCCA edge category. Ordinal position is the label index (0..=13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeLabel {
    H,
    A,
    C,
    L,
    D,
    E,
    G,
    S,
    N,
    P,
    R,
    F,
    Terminal,
    U,
}

impl EdgeLabel {
    pub const ALL: [EdgeLabel; NUM_LABELS] = [
        EdgeLabel::H,
        EdgeLabel::A,
        EdgeLabel::C,
        EdgeLabel::L,
        EdgeLabel::D,
        EdgeLabel::E,
        EdgeLabel::G,
        EdgeLabel::S,
        EdgeLabel::N,
        EdgeLabel::P,
        EdgeLabel::R,
        EdgeLabel::F,
        EdgeLabel::Terminal,
        EdgeLabel::U,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Encoded label: index + 1 (0 is reserved for "no label").
    #[inline]
    pub fn code(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_code(code: u8) -> Option<EdgeLabel> {
        match code {
            0 => None,
            c => Self::ALL.get(c as usize - 1).copied(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeLabel::H => "H",
            EdgeLabel::A => "A",
            EdgeLabel::C => "C",
            EdgeLabel::L => "L",
            EdgeLabel::D => "D",
            EdgeLabel::E => "E",
            EdgeLabel::G => "G",
            EdgeLabel::S => "S",
            EdgeLabel::N => "N",
            EdgeLabel::P => "P",
            EdgeLabel::R => "R",
            EdgeLabel::F => "F",
            EdgeLabel::Terminal => "Terminal",
            EdgeLabel::U => "U",
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeLabel {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| ActionError::UnknownName(s.to_string()))
    }
}

/// Integer encoding of a vocabulary action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionEncoding {
    #[serde(rename = "type10")]
    pub type_code: u8,
    #[serde(rename = "hasLabel")]
    pub has_label: u8,
    #[serde(rename = "label14")]
    pub label_code: u8,
}

impl ActionEncoding {
    pub fn new(type_code: u8, has_label: u8, label_code: u8) -> Self {
        Self {
            type_code,
            has_label,
            label_code,
        }
    }

    pub fn decode(self) -> Result<VocabAction, ActionError> {
        decode(self.type_code, self.has_label, self.label_code)
    }

    /// Numeric form appended to an observation for the reward estimator.
    pub fn to_features(self) -> [f64; ENCODING_LEN] {
        [
            self.type_code as f64,
            self.has_label as f64,
            self.label_code as f64,
        ]
    }
}

/// One entry of the closed action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VocabAction {
    pub action_type: ActionType,
    pub label: Option<EdgeLabel>,
}

impl VocabAction {
    pub fn unlabeled(action_type: ActionType) -> Self {
        Self {
            action_type,
            label: None,
        }
    }

    pub fn labeled(action_type: ActionType, label: EdgeLabel) -> Self {
        Self {
            action_type,
            label: Some(label),
        }
    }

    #[inline]
    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }

    pub fn encode(&self) -> ActionEncoding {
        encode(self)
    }

    pub fn to_oracle_action(&self) -> OracleAction {
        OracleAction {
            action_type: self.action_type,
            tag: self.label,
        }
    }
}

impl fmt::Display for VocabAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_oracle_action(), f)
    }
}

/// An action value offered by the external oracle (`type` plus optional `tag`).
///
/// Serialized as its canonical string (`SHIFT`, `NODE-H`, `RIGHT-EDGE-Terminal`).
/// Replay ordering is defined on that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OracleAction {
    pub action_type: ActionType,
    pub tag: Option<EdgeLabel>,
}

impl OracleAction {
    pub fn new(action_type: ActionType, tag: Option<EdgeLabel>) -> Self {
        Self { action_type, tag }
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// The vocabulary entry for this action, if it is one.
    pub fn to_vocab(&self) -> Result<VocabAction, ActionError> {
        if self.action_type.takes_label() != self.tag.is_some() {
            return Err(ActionError::NotInVocab(self.canonical()));
        }
        Ok(VocabAction {
            action_type: self.action_type,
            label: self.tag,
        })
    }
}

impl fmt::Display for OracleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "{}-{}", self.action_type, tag),
            None => f.write_str(self.action_type.as_str()),
        }
    }
}

impl FromStr for OracleAction {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for t in ActionType::ALL {
            let name = t.as_str();
            if s == name {
                return Ok(OracleAction::new(t, None));
            }
            if let Some(rest) = s.strip_prefix(name).and_then(|r| r.strip_prefix('-')) {
                return Ok(OracleAction::new(t, Some(rest.parse()?)));
            }
        }
        Err(ActionError::UnknownName(s.to_string()))
    }
}

impl TryFrom<String> for OracleAction {
    type Error = ActionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OracleAction> for String {
    fn from(a: OracleAction) -> Self {
        a.canonical()
    }
}

/// The full vocabulary in its fixed order. Built once per process.
pub fn vocab() -> &'static [VocabAction] {
    static VOCAB: OnceLock<Vec<VocabAction>> = OnceLock::new();
    VOCAB.get_or_init(|| {
        let mut out = Vec::with_capacity(V);
        for t in ActionType::UNLABELED {
            out.push(VocabAction::unlabeled(t));
        }
        for label in EdgeLabel::ALL {
            for t in ActionType::LABELED {
                out.push(VocabAction::labeled(t, label));
            }
        }
        debug_assert_eq!(out.len(), V);
        out
    })
}

/// Position of `a` in `vocab()`.
///
/// # Panics
/// Panics if `a` is not a vocabulary entry (unlabeled type with a label or vice versa).
pub fn vocab_index(a: &VocabAction) -> usize {
    match a.label {
        None => a
            .action_type
            .unlabeled_pos()
            .unwrap_or_else(|| panic!("{} requires a label", a.action_type)),
        Some(label) => {
            let pos = a
                .action_type
                .labeled_pos()
                .unwrap_or_else(|| panic!("{} does not take a label", a.action_type));
            NUM_UNLABELED + label.index() * NUM_LABELED_TYPES + pos
        }
    }
}

pub fn encode(a: &VocabAction) -> ActionEncoding {
    ActionEncoding {
        type_code: a.action_type.code(),
        has_label: a.has_label() as u8,
        label_code: a.label.map_or(0, EdgeLabel::code),
    }
}

pub fn decode(type_code: u8, has_label: u8, label_code: u8) -> Result<VocabAction, ActionError> {
    let invalid = |reason| ActionError::InvalidCode {
        type_code,
        has_label,
        label_code,
        reason,
    };

    let action_type = ActionType::from_code(type_code).ok_or_else(|| invalid("type out of range"))?;
    if has_label > 1 {
        return Err(invalid("hasLabel must be 0 or 1"));
    }
    if label_code as usize > NUM_LABELS {
        return Err(invalid("label out of range"));
    }
    let label = match (has_label, label_code) {
        (0, 0) => None,
        (0, _) => return Err(invalid("label present without hasLabel")),
        (_, 0) => return Err(invalid("hasLabel set without a label")),
        (_, c) => EdgeLabel::from_code(c),
    };
    if action_type.takes_label() != label.is_some() {
        return Err(invalid("type/label combination is not in the vocabulary"));
    }
    Ok(VocabAction { action_type, label })
}
