//! Observation to discrete state encoding

use crate::{
    Error, Result,
    types::{Observation, StateId},
};

/// Largest feature vector the encoder accepts (65 536 states).
pub const MAX_FEATURES: usize = 16;

/// Maps boolean observations onto dense state ids.
///
/// Feature `i` contributes bit `i` of the state id, so an observation with
/// `n` features maps into `0..2^n`. For the two-feature swarm observation
/// `[in_cluster, on_pheromone]` this yields:
///
/// | in_cluster | on_pheromone | state |
/// |------------|--------------|-------|
/// | false      | false        | 0     |
/// | true       | false        | 1     |
/// | false      | true         | 2     |
/// | true       | true         | 3     |
///
/// The mapping is pure: the same observation always encodes to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEncoder {
    features: usize,
}

impl StateEncoder {
    /// Create an encoder for observations of exactly `features` booleans.
    pub fn new(features: usize) -> Result<Self> {
        if features == 0 || features > MAX_FEATURES {
            return Err(Error::config(format!(
                "observation feature count must be in 1..={MAX_FEATURES}, got {features}"
            )));
        }
        Ok(Self { features })
    }

    /// Number of features expected per observation.
    pub fn features(&self) -> usize {
        self.features
    }

    /// Size of the state space this encoder produces.
    pub fn num_states(&self) -> usize {
        1 << self.features
    }

    /// Encode an observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateEncoding`] when the observation does not have
    /// the expected number of features.
    pub fn encode(&self, observation: &Observation) -> Result<StateId> {
        if observation.len() != self.features {
            return Err(Error::StateEncoding {
                expected: self.features,
                got: observation.len(),
            });
        }
        let id = observation
            .features()
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(0usize, |acc, (bit, _)| acc | (1 << bit));
        Ok(StateId::new(id))
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self { features: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_mapping() {
        let encoder = StateEncoder::default();
        let cases = [
            ([false, false], 0),
            ([true, false], 1),
            ([false, true], 2),
            ([true, true], 3),
        ];
        for (features, expected) in cases {
            let state = encoder.encode(&Observation::from(features)).unwrap();
            assert_eq!(state.value(), expected, "features {features:?}");
        }
    }

    #[test]
    fn test_encode_is_pure() {
        let encoder = StateEncoder::default();
        let obs = Observation::from([true, false]);
        let first = encoder.encode(&obs).unwrap();
        for _ in 0..10 {
            assert_eq!(encoder.encode(&obs).unwrap(), first);
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let encoder = StateEncoder::default();
        let err = encoder
            .encode(&Observation::from([true, false, true]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StateEncoding {
                expected: 2,
                got: 3
            }
        ));
    }

    #[test]
    fn test_wider_observations_stay_in_range() {
        let encoder = StateEncoder::new(3).unwrap();
        assert_eq!(encoder.num_states(), 8);
        let state = encoder
            .encode(&Observation::from([true, true, true]))
            .unwrap();
        assert_eq!(state.value(), 7);
    }

    #[test]
    fn test_feature_count_bounds() {
        assert!(StateEncoder::new(0).is_err());
        assert!(StateEncoder::new(MAX_FEATURES + 1).is_err());
    }
}
