use crate::constants::UNREACHED;
use crate::raptor::state::RoundChain;
use crate::types::{PatternIndex, StopIndex};

/// What kind of leg a reconstructed path step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    Transit { pattern: PatternIndex },
    Transfer,
}

/// One step of a reconstructed path, in travel order.
#[derive(Debug, Clone, Copy)]
pub struct Leg {
    pub kind: LegKind,
    pub from_stop: StopIndex,
    pub to_stop: StopIndex,
}

/// An immutable reconstruction of one iteration's best route to a stop. Owns
/// its data rather than referencing the `RoundChain` it was built from, so it
/// can outlive the round-state chain per the "path reconstruction" design
/// note.
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub legs: Vec<Leg>,
}

impl Path {
    pub fn is_reachable(&self) -> bool {
        !self.legs.is_empty()
    }
}

/// Walks `chain`'s `transferStop`/`previousStop`/`previousPattern` links
/// backward from `stop` to reconstruct the sequence of rides and transfers
/// that produced its best arrival.
///
/// The last round already carries every stop's global minimum, since
/// `min_merge_previous` propagates it forward every round; the walk always
/// starts there. A transfer step is immediately followed by the boarding
/// leg that produced its source stop's non-transfer arrival -- the pattern
/// scan never chains two transfers within a round, so the transfer-stop
/// check is skipped on the step right after one is taken.
pub fn reconstruct_path(chain: &RoundChain, stop: StopIndex) -> Path {
    let mut round = chain.n_rounds() - 1;
    let mut at = stop;
    let mut legs = Vec::new();
    let mut just_transferred = false;

    loop {
        if chain.rounds[round].best_times[at] == UNREACHED {
            return Path::default();
        }

        if !just_transferred {
            if let Some(from) = chain.rounds[round].transfer_stop[at] {
                legs.push(Leg {
                    kind: LegKind::Transfer,
                    from_stop: from,
                    to_stop: at,
                });
                at = from;
                just_transferred = true;
                continue;
            }
        }
        just_transferred = false;

        match (
            chain.rounds[round].previous_pattern[at],
            chain.rounds[round].previous_stop[at],
        ) {
            (Some(pattern), Some(from)) => {
                legs.push(Leg {
                    kind: LegKind::Transit { pattern },
                    from_stop: from,
                    to_stop: at,
                });
                at = from;
                if round == 0 {
                    break;
                }
                round -= 1;
            }
            _ => break,
        }
    }

    legs.reverse();
    Path { legs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raptor::state::RoundChain;

    #[test]
    fn unreached_stop_yields_an_empty_path() {
        let chain = RoundChain::new(3, 1, 3600);
        let path = reconstruct_path(&chain, 2);
        assert!(!path.is_reachable());
    }

    #[test]
    fn access_only_stop_yields_an_empty_path() {
        let mut chain = RoundChain::new(2, 1, 3600);
        chain.set_departure_time(0);
        chain.stamp_access_stop(0, 60).unwrap();
        // Round 1 never touched -- min_merge_previous alone carries stop 0's
        // access time forward, with no pattern or transfer leg behind it.
        chain.min_merge_previous(1);
        let path = reconstruct_path(&chain, 0);
        assert!(!path.is_reachable());
    }

    #[test]
    fn one_ride_reconstructs_a_single_transit_leg() {
        let mut chain = RoundChain::new(2, 1, 3600);
        chain.set_departure_time(0);
        chain.stamp_access_stop(0, 0).unwrap();
        chain.min_merge_previous(1);
        chain
            .set_time_at_stop(1, 1, 300, Some(7), Some(0), 60, 240, false)
            .unwrap();
        let path = reconstruct_path(&chain, 1);
        assert_eq!(path.legs.len(), 1);
        assert!(matches!(path.legs[0].kind, LegKind::Transit { pattern: 7 }));
        assert_eq!(path.legs[0].from_stop, 0);
        assert_eq!(path.legs[0].to_stop, 1);
    }

    #[test]
    fn a_transfer_does_not_chain_past_its_own_boarding_leg() {
        let mut chain = RoundChain::new(3, 1, 3600);
        chain.set_departure_time(0);
        chain.stamp_access_stop(0, 0).unwrap();
        chain.min_merge_previous(1);
        // Stop 1 is reached by a transit ride (non-transfer), stop 2 by a
        // walk transfer from stop 1.
        chain
            .set_time_at_stop(1, 1, 300, Some(7), Some(0), 60, 240, false)
            .unwrap();
        chain
            .set_time_at_stop(1, 2, 360, None, Some(1), 0, 0, true)
            .unwrap();
        let path = reconstruct_path(&chain, 2);
        assert_eq!(path.legs.len(), 2);
        assert_eq!(path.legs[0].kind, LegKind::Transit { pattern: 7 });
        assert_eq!(path.legs[1].kind, LegKind::Transfer);
        assert_eq!(path.legs[1].from_stop, 1);
        assert_eq!(path.legs[1].to_stop, 2);
    }
}
