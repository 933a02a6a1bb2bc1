use fixedbitset::FixedBitSet;

use crate::model::transit_layer::{FrequencyEntry, TripPattern};
use crate::types::{Time, TripIndex};

/// Which strategy the round body uses to compute a frequency boarding time.
///
/// A tagged variant rather than a trait object: the boarding decision sits
/// in the hottest loop in the engine and must not go through a vtable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardingMode {
    /// Monte-Carlo: a specific randomized offset has already been drawn.
    Random,
    /// Worst-case bound, valid across every randomization and every minute.
    UpperBound,
    /// Deterministic single-iteration approximation.
    HalfHeadway,
}

/// Finds the next scheduled trip boardable at `stop_pos`.
///
/// `currently_on` is the index of the trip already boarded this round, if
/// any; passing it restricts the search to strictly earlier trips, since
/// switching to a later trip than the one already boarded can never help.
pub fn find_boardable_scheduled_trip(
    pattern: &TripPattern,
    stop_pos: usize,
    earliest_board_time: Time,
    active_services: &FixedBitSet,
    currently_on: Option<TripIndex>,
) -> Option<TripIndex> {
    let is_boardable = |idx: TripIndex| -> bool {
        let trip = &pattern.trips[idx];
        !trip.is_frequency() && active_services.contains(trip.service_code as usize)
    };

    match currently_on {
        None => (0..pattern.trips.len())
            .filter(|&idx| is_boardable(idx))
            .find(|&idx| pattern.trips[idx].departures[stop_pos] > earliest_board_time),
        Some(current_idx) => {
            let mut best = None;
            for idx in (0..current_idx).rev() {
                if !is_boardable(idx) {
                    continue;
                }
                if pattern.trips[idx].departures[stop_pos] > earliest_board_time {
                    best = Some(idx);
                } else {
                    break;
                }
            }
            best
        }
    }
}

/// RANDOM (Monte-Carlo) boarding-time formula.
pub fn board_time_random(
    entry: &FrequencyEntry,
    departure_at_stop: Time,
    earliest_board_time: Time,
    offset: u32,
) -> Option<Time> {
    let headway = entry.headway_seconds.max(1) as i64;
    let first_vehicle_at_stop =
        entry.start_time as i64 + departure_at_stop as i64 + offset as i64;
    let lower_bound = earliest_board_time as i64 - 1;

    let index = if lower_bound <= first_vehicle_at_stop {
        0
    } else {
        (lower_bound - first_vehicle_at_stop) / headway + 1
    };

    let number_of_trips =
        (entry.end_time as i64 - (entry.start_time as i64 + offset as i64)) / headway + 1;

    if number_of_trips <= 0 || index >= number_of_trips {
        return None;
    }

    Some((first_vehicle_at_stop + index * headway) as Time)
}

/// UPPER_BOUND boarding-time formula: worst case across every randomization.
pub fn board_time_upper_bound(
    entry: &FrequencyEntry,
    departure_at_stop: Time,
    earliest_board_time: Time,
) -> Option<Time> {
    let earliest_end_here = entry.end_time as i64 + departure_at_stop as i64;
    if earliest_end_here < earliest_board_time as i64 {
        return None;
    }
    let headway = entry.headway_seconds as i64;
    let candidate = (earliest_board_time as i64 + headway)
        .max(entry.start_time as i64 + headway + departure_at_stop as i64);
    Some(candidate as Time)
}

/// HALF_HEADWAY boarding-time formula.
pub fn board_time_half_headway(
    entry: &FrequencyEntry,
    departure_at_stop: Time,
    earliest_board_time: Time,
) -> Option<Time> {
    let earliest_end_here = entry.end_time as i64 + departure_at_stop as i64;
    if earliest_end_here < earliest_board_time as i64 {
        return None;
    }
    let base = (earliest_board_time as i64).max(entry.start_time as i64 + departure_at_stop as i64);
    Some((base + entry.headway_seconds as i64 / 2) as Time)
}

/// Dispatches a frequency boarding-time computation by mode, never through a
/// virtual call.
pub fn board_time(
    mode: BoardingMode,
    entry: &FrequencyEntry,
    departure_at_stop: Time,
    earliest_board_time: Time,
    offset: u32,
) -> Option<Time> {
    match mode {
        BoardingMode::Random => board_time_random(entry, departure_at_stop, earliest_board_time, offset),
        BoardingMode::UpperBound => board_time_upper_bound(entry, departure_at_stop, earliest_board_time),
        BoardingMode::HalfHeadway => board_time_half_headway(entry, departure_at_stop, earliest_board_time),
    }
}
