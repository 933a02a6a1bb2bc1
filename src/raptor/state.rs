use fixedbitset::FixedBitSet;

use crate::constants::UNREACHED;
use crate::types::{PatternIndex, StopIndex, Time};
use crate::RaptorError;

/// The arrival-time frontier for one transit-ride round.
///
/// Grounded on the teacher's `routing/raptor/common/state.rs::RaptorState`;
/// extended with the non-transfer decomposition fields SPEC_FULL.md §3
/// requires for invariant 3 (wait + in-vehicle time accounting).
#[derive(Debug, Clone)]
pub struct RaptorState {
    pub best_times: Vec<Time>,
    pub best_non_transfer_times: Vec<Time>,
    pub previous_pattern: Vec<Option<PatternIndex>>,
    pub previous_stop: Vec<Option<StopIndex>>,
    pub transfer_stop: Vec<Option<StopIndex>>,
    pub non_transfer_wait_time: Vec<u32>,
    pub non_transfer_in_vehicle_time: Vec<u32>,
    pub stops_updated: FixedBitSet,
    pub non_transfer_stops_updated: FixedBitSet,
}

impl RaptorState {
    pub fn new(n_stops: usize) -> Self {
        RaptorState {
            best_times: vec![UNREACHED; n_stops],
            best_non_transfer_times: vec![UNREACHED; n_stops],
            previous_pattern: vec![None; n_stops],
            previous_stop: vec![None; n_stops],
            transfer_stop: vec![None; n_stops],
            non_transfer_wait_time: vec![0; n_stops],
            non_transfer_in_vehicle_time: vec![0; n_stops],
            stops_updated: FixedBitSet::with_capacity(n_stops),
            non_transfer_stops_updated: FixedBitSet::with_capacity(n_stops),
        }
    }

    fn clear_update_bitsets(&mut self) {
        self.stops_updated.clear();
        self.non_transfer_stops_updated.clear();
    }
}

/// A linear chain of [`RaptorState`] rounds (round 0 is the access leg),
/// array-indexed rather than linked via parent pointers, per the "chained
/// states" design note.
#[derive(Debug, Clone)]
pub struct RoundChain {
    pub rounds: Vec<RaptorState>,
    pub departure_time: Time,
    pub max_duration_seconds: u32,
}

impl RoundChain {
    pub fn new(n_stops: usize, max_rides: usize, max_duration_seconds: u32) -> Self {
        RoundChain {
            rounds: (0..=max_rides).map(|_| RaptorState::new(n_stops)).collect(),
            departure_time: 0,
            max_duration_seconds,
        }
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Range-raptor: moves the departure clock backward and clears the
    /// per-minute update bitsets. Retains all prior arrival data so later
    /// minutes' results remain valid upper bounds for earlier ones.
    pub fn set_departure_time(&mut self, time: Time) {
        self.departure_time = time;
        for round in &mut self.rounds {
            round.clear_update_bitsets();
        }
    }

    /// Carries round r-1's arrivals into round r wherever they improve on
    /// round r's current frontier (invariant 2).
    pub fn min_merge_previous(&mut self, round: usize) {
        if round == 0 {
            return;
        }
        let (earlier, later) = self.rounds.split_at_mut(round);
        let prev = &earlier[round - 1];
        let cur = &mut later[0];
        for stop in 0..cur.best_times.len() {
            if prev.best_times[stop] < cur.best_times[stop] {
                cur.best_times[stop] = prev.best_times[stop];
                cur.best_non_transfer_times[stop] = prev.best_non_transfer_times[stop];
                cur.previous_pattern[stop] = prev.previous_pattern[stop];
                cur.previous_stop[stop] = prev.previous_stop[stop];
                cur.transfer_stop[stop] = prev.transfer_stop[stop];
                cur.non_transfer_wait_time[stop] = prev.non_transfer_wait_time[stop];
                cur.non_transfer_in_vehicle_time[stop] = prev.non_transfer_in_vehicle_time[stop];
            }
        }
    }

    /// Seeds every round from `other` wherever `other` is a strictly
    /// better (smaller) known-reachable time. Used to plant the UPPER_BOUND
    /// chain's worst-case arrivals as a ceiling before a Monte-Carlo draw,
    /// so the draw's own `set_time_at_stop` calls naturally short-circuit
    /// once they can no longer beat a guaranteed bound.
    pub fn merge_ceiling_from(&mut self, other: &RoundChain) {
        for (cur, prev) in self.rounds.iter_mut().zip(other.rounds.iter()) {
            for stop in 0..cur.best_times.len() {
                if prev.best_times[stop] < cur.best_times[stop] {
                    cur.best_times[stop] = prev.best_times[stop];
                    cur.best_non_transfer_times[stop] = prev.best_non_transfer_times[stop];
                    cur.previous_pattern[stop] = prev.previous_pattern[stop];
                    cur.previous_stop[stop] = prev.previous_stop[stop];
                    cur.transfer_stop[stop] = prev.transfer_stop[stop];
                    cur.non_transfer_wait_time[stop] = prev.non_transfer_wait_time[stop];
                    cur.non_transfer_in_vehicle_time[stop] = prev.non_transfer_in_vehicle_time[stop];
                }
            }
        }
    }

    /// Stamps the access leg into round 0: `accessTime + departureTime`,
    /// which always improves because the departure clock only decreases.
    pub fn stamp_access_stop(&mut self, stop: StopIndex, access_time: Time) -> Result<(), RaptorError> {
        self.set_time_at_stop(0, stop, self.departure_time + access_time, None, None, 0, 0, false)?;
        Ok(())
    }

    /// Stamps every reachable access stop, skipping [`UNREACHED`] entries.
    pub fn stamp_access_stop_all(&mut self, access_times: &[Time]) -> Result<(), RaptorError> {
        for (stop, &access_time) in access_times.iter().enumerate() {
            if access_time != UNREACHED {
                self.stamp_access_stop(stop, access_time)?;
            }
        }
        Ok(())
    }

    /// Implements the state update rule of SPEC_FULL.md §4.2. Returns
    /// whether the call improved any field.
    #[allow(clippy::too_many_arguments)]
    pub fn set_time_at_stop(
        &mut self,
        round: usize,
        stop: StopIndex,
        time: Time,
        pattern: Option<PatternIndex>,
        from_stop: Option<StopIndex>,
        wait_time: u32,
        in_vehicle_time: u32,
        is_transfer: bool,
    ) -> Result<bool, RaptorError> {
        if time >= self.departure_time.saturating_add(self.max_duration_seconds) {
            return Ok(false);
        }

        let mut updated = false;

        if !is_transfer && time < self.rounds[round].best_non_transfer_times[stop] {
            let (prev_wait, prev_in_vehicle) = if round == 0 {
                (0, 0)
            } else {
                let prev = &self.rounds[round - 1];
                let source = from_stop.ok_or_else(|| {
                    RaptorError::internal("non-transfer update missing a source stop")
                })?;
                let decomposition_source = prev.transfer_stop[source].unwrap_or(source);
                (
                    prev.non_transfer_wait_time[decomposition_source],
                    prev.non_transfer_in_vehicle_time[decomposition_source],
                )
            };
            let cur = &mut self.rounds[round];
            cur.best_non_transfer_times[stop] = time;
            cur.previous_pattern[stop] = pattern;
            cur.previous_stop[stop] = from_stop;
            cur.non_transfer_wait_time[stop] = prev_wait + wait_time;
            cur.non_transfer_in_vehicle_time[stop] = prev_in_vehicle + in_vehicle_time;
            cur.non_transfer_stops_updated.insert(stop);
            updated = true;
        }

        if time < self.rounds[round].best_times[stop] {
            let cur = &mut self.rounds[round];
            cur.best_times[stop] = time;
            cur.transfer_stop[stop] = if is_transfer { from_stop } else { None };
            cur.stops_updated.insert(stop);
            updated = true;
        }

        if !is_transfer && updated {
            let cur = &self.rounds[round];
            let decomposed = cur.non_transfer_wait_time[stop] as u64
                + cur.non_transfer_in_vehicle_time[stop] as u64;
            let elapsed = (time - self.departure_time) as u64;
            if decomposed > elapsed {
                return Err(RaptorError::internal(format!(
                    "wait+in-vehicle decomposition {decomposed} exceeds elapsed time {elapsed} at stop {stop}"
                )));
            }
        }

        Ok(updated)
    }
}
