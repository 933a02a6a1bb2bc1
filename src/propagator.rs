use crate::constants::UNREACHED;
use crate::types::{StopIndex, Time};

/// A stop-to-target egress linkage cost, in whichever unit the table was
/// built with.
#[derive(Debug, Clone, Copy)]
pub enum EgressCost {
    DistanceMm(u32),
    DurationSeconds(u32),
}

impl EgressCost {
    pub fn to_seconds(self, walk_speed_mps: f64) -> u32 {
        match self {
            EgressCost::DurationSeconds(s) => s,
            EgressCost::DistanceMm(mm) => (mm as f64 / 1000.0 / walk_speed_mps) as u32,
        }
    }
}

/// One egress mode's per-target linkage table: for each target, the stops
/// it is reachable from and at what cost.
pub struct EgressModeTable<'a> {
    pub leg_time_limit_seconds: u32,
    pub cost_for_target: &'a dyn Fn(usize) -> &'a [(StopIndex, EgressCost)],
    pub walk_speed_mps: f64,
    pub stop_delays_seconds: Option<&'a [i32]>,
}

/// Transposes `[iteration][stop]` into `[stop][iteration]`.
///
/// Unconditional, per SPEC_FULL.md §4.3: the teacher's own one-to-many fan
/// out (`routing/multimodal_routing.rs`) trades the same memory for
/// cache-contiguous per-stop rows.
pub fn transpose(travel_times_per_iteration: &[Vec<Time>]) -> Vec<Vec<Time>> {
    let n_iterations = travel_times_per_iteration.len();
    let n_stops = travel_times_per_iteration.first().map_or(0, Vec::len);
    let mut by_stop = vec![vec![UNREACHED; n_iterations]; n_stops];
    for (iter, row) in travel_times_per_iteration.iter().enumerate() {
        for (stop, &time) in row.iter().enumerate() {
            by_stop[stop][iter] = time;
        }
    }
    by_stop
}

/// Combines transit arrivals with egress cost tables for one target,
/// forwarding the resulting per-iteration travel-time vector to `reducer`.
///
/// Grounded on the teacher's `routing/multimodal_routing.rs::multimodal_routing_one_to_many`
/// one-to-many fan-out idiom, restructured around the transpose-then-combine
/// algorithm of SPEC_FULL.md §4.3.
pub fn propagate_target(
    target: usize,
    travel_times_by_stop: &[Vec<Time>],
    non_transit_time: Time,
    egress_modes: &[EgressModeTable],
    max_travel_time_seconds: Time,
    mut reducer: impl FnMut(usize, &[Time]),
) {
    let n_iterations = travel_times_by_stop.first().map_or(0, Vec::len);
    let mut per_iteration = vec![non_transit_time; n_iterations];

    for mode in egress_modes {
        for &(stop, cost) in (mode.cost_for_target)(target) {
            let stop_to_target_seconds = cost.to_seconds(mode.walk_speed_mps);
            if stop_to_target_seconds >= mode.leg_time_limit_seconds {
                continue;
            }
            let delay = mode
                .stop_delays_seconds
                .and_then(|delays| delays.get(stop))
                .copied()
                .unwrap_or(0);
            if delay < 0 {
                continue;
            }
            let leg_seconds = stop_to_target_seconds + delay as u32;

            for iter in 0..n_iterations {
                let arrival = travel_times_by_stop[stop][iter];
                if arrival == UNREACHED || arrival >= max_travel_time_seconds {
                    continue;
                }
                if arrival >= per_iteration[iter] {
                    continue;
                }
                let candidate = arrival + leg_seconds;
                if candidate < per_iteration[iter] {
                    per_iteration[iter] = candidate;
                }
            }
        }
    }

    reducer(target, &per_iteration);
}
