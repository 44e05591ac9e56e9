//! ucr-features: Observation type + reward-estimator input encoding.

pub mod encode;
pub mod schema;

pub use encode::{encode_input, encode_input_into, Features, Observation};
pub use schema::{input_len, INPUT_SCHEMA_ID};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use ucr_core::{encode, vocab, ActionEncoding};

    #[test]
    fn version_is_nonempty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn input_is_observation_then_action_code() {
        let obs = vec![0.25, -1.0, 3.5];
        let input = encode_input(&obs, ActionEncoding::new(2, 1, 1));
        assert_eq!(input, vec![0.25, -1.0, 3.5, 2.0, 1.0, 1.0]);
        assert_eq!(input.len(), input_len(obs.len()));
    }

    #[test]
    fn encode_into_reuses_buffer() {
        let mut buf = vec![9.0; 32];
        for a in vocab() {
            encode_input_into(&[1.0], encode(a), &mut buf);
            assert_eq!(buf.len(), 4);
            assert_eq!(buf[0], 1.0);
        }
    }

    #[test]
    fn empty_observation_yields_bare_action() {
        let input = encode_input(&[], ActionEncoding::new(7, 0, 0));
        assert_eq!(input, vec![7.0, 0.0, 0.0]);
    }
}
