use std::collections::HashSet;

use crate::action::{
    decode, encode, vocab, vocab_index, ActionEncoding, ActionError, ActionType, EdgeLabel,
    OracleAction, VocabAction, NUM_LABELS, V,
};

#[test]
fn vocab_has_88_unique_entries() {
    let v = vocab();
    assert_eq!(v.len(), 88);
    assert_eq!(V, 88);
    let uniq: HashSet<_> = v.iter().copied().collect();
    assert_eq!(uniq.len(), 88);
}

#[test]
fn vocab_is_stable_across_calls() {
    let a = vocab();
    let b = vocab();
    assert!(std::ptr::eq(a, b));
}

#[test]
fn vocab_order_unlabeled_first_then_label_major() {
    let v = vocab();
    assert_eq!(v[0], VocabAction::unlabeled(ActionType::Shift));
    assert_eq!(v[1], VocabAction::unlabeled(ActionType::Reduce));
    assert_eq!(v[2], VocabAction::unlabeled(ActionType::Swap));
    assert_eq!(v[3], VocabAction::unlabeled(ActionType::Finish));
    assert_eq!(v[4], VocabAction::labeled(ActionType::Implicit, EdgeLabel::H));
    assert_eq!(v[9], VocabAction::labeled(ActionType::LeftRemote, EdgeLabel::H));
    assert_eq!(v[10], VocabAction::labeled(ActionType::Implicit, EdgeLabel::A));
    assert_eq!(v[87], VocabAction::labeled(ActionType::LeftRemote, EdgeLabel::U));
}

#[test]
fn vocab_index_matches_position() {
    for (i, a) in vocab().iter().enumerate() {
        assert_eq!(vocab_index(a), i, "index mismatch for {}", a);
    }
}

#[test]
fn encode_decode_roundtrip_every_entry() {
    for a in vocab() {
        let e = encode(a);
        assert_eq!(decode(e.type_code, e.has_label, e.label_code).unwrap(), *a);
        assert_eq!(e.decode().unwrap().encode(), e);
    }
}

#[test]
fn encoding_spot_checks() {
    let shift = encode(&VocabAction::unlabeled(ActionType::Shift));
    assert_eq!(shift, ActionEncoding::new(7, 0, 0));

    let node_h = encode(&VocabAction::labeled(ActionType::Node, EdgeLabel::H));
    assert_eq!(node_h, ActionEncoding::new(2, 1, 1));

    let swap = encode(&VocabAction::unlabeled(ActionType::Swap));
    assert_eq!(swap, ActionEncoding::new(0, 0, 0));

    let re_u = encode(&VocabAction::labeled(ActionType::RightEdge, EdgeLabel::U));
    assert_eq!(re_u, ActionEncoding::new(3, 1, NUM_LABELS as u8));
}

#[test]
fn decode_rejects_out_of_range_codes() {
    for (t, h, l) in [(10, 0, 0), (0, 2, 0), (2, 1, 15), (255, 1, 1)] {
        let err = decode(t, h, l).unwrap_err();
        assert!(
            matches!(err, ActionError::InvalidCode { .. }),
            "({t},{h},{l}) should be InvalidCode"
        );
    }
}

#[test]
fn decode_rejects_label_flag_mismatch() {
    // hasLabel=0 with a label code.
    assert!(matches!(
        decode(2, 0, 3),
        Err(ActionError::InvalidCode { .. })
    ));
    // hasLabel=1 without a label code.
    assert!(matches!(
        decode(2, 1, 0),
        Err(ActionError::InvalidCode { .. })
    ));
}

#[test]
fn decode_rejects_combinations_outside_vocab() {
    // SHIFT with a label.
    assert!(decode(7, 1, 1).is_err());
    // NODE without a label.
    assert!(decode(2, 0, 0).is_err());
}

#[test]
fn oracle_action_canonical_strings() {
    let a = OracleAction::new(ActionType::Node, Some(EdgeLabel::H));
    assert_eq!(a.to_string(), "NODE-H");
    let b = OracleAction::new(ActionType::RightEdge, Some(EdgeLabel::Terminal));
    assert_eq!(b.to_string(), "RIGHT-EDGE-Terminal");
    let c = OracleAction::new(ActionType::Shift, None);
    assert_eq!(c.to_string(), "SHIFT");

    for s in ["NODE-H", "RIGHT-EDGE-Terminal", "SHIFT", "LEFT-REMOTE-A", "FINISH"] {
        let parsed: OracleAction = s.parse().unwrap();
        assert_eq!(parsed.to_string(), s);
    }
}

#[test]
fn oracle_action_parse_rejects_unknown() {
    assert!("JUMP".parse::<OracleAction>().is_err());
    assert!("NODE-X".parse::<OracleAction>().is_err());
    assert!("NODE-".parse::<OracleAction>().is_err());
}

#[test]
fn oracle_action_to_vocab_checks_membership() {
    let ok = OracleAction::new(ActionType::LeftEdge, Some(EdgeLabel::D));
    assert_eq!(
        ok.to_vocab().unwrap(),
        VocabAction::labeled(ActionType::LeftEdge, EdgeLabel::D)
    );
    let bad = OracleAction::new(ActionType::Node, None);
    assert!(matches!(bad.to_vocab(), Err(ActionError::NotInVocab(_))));
}

#[test]
fn encoding_serde_field_names() {
    let e = ActionEncoding::new(3, 1, 13);
    let s = serde_json::to_string(&e).unwrap();
    assert_eq!(s, r#"{"type10":3,"hasLabel":1,"label14":13}"#);
    let back: ActionEncoding = serde_json::from_str(&s).unwrap();
    assert_eq!(back, e);
}

#[test]
fn oracle_action_serializes_as_canonical_string() {
    let a = OracleAction::new(ActionType::LeftEdge, Some(EdgeLabel::Terminal));
    let s = serde_json::to_string(&a).unwrap();
    assert_eq!(s, r#""LEFT-EDGE-Terminal""#);
    let back: OracleAction = serde_json::from_str(&s).unwrap();
    assert_eq!(back, a);
    assert!(serde_json::from_str::<OracleAction>(r#""NOPE""#).is_err());
}
