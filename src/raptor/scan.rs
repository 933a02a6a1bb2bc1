use fixedbitset::FixedBitSet;

use crate::constants::MINIMUM_BOARD_WAIT_SEC;
use crate::model::TransitLayer;
use crate::offsets::FrequencyOffsets;
use crate::raptor::board::{board_time, find_boardable_scheduled_trip, BoardingMode};
use crate::raptor::state::RoundChain;
use crate::types::{FrequencyEntryIndex, StopIndex, Time, TripIndex};
use crate::RaptorError;

/// Which ride a pattern scan is currently riding at a given stop position.
enum Boarded {
    None,
    Scheduled {
        trip_idx: TripIndex,
        board_stop_pos: usize,
        board_time: Time,
        wait_time: u32,
    },
    Frequency {
        trip_idx: TripIndex,
        #[allow(dead_code)]
        entry_idx: FrequencyEntryIndex,
        board_stop_pos: usize,
        board_time: Time,
        wait_time: u32,
    },
}

/// Returns the set of patterns touching any stop for which `updated`
/// returns true, intersected with `running`.
pub fn patterns_to_scan(
    layer: &TransitLayer,
    running: &FixedBitSet,
    updated: impl Fn(StopIndex) -> bool,
) -> FixedBitSet {
    let mut out = FixedBitSet::with_capacity(layer.patterns.len());
    for stop in 0..layer.stop_count() {
        if !updated(stop) {
            continue;
        }
        for &pattern_idx in layer.patterns_for_stop(stop) {
            if running.contains(pattern_idx) {
                out.insert(pattern_idx);
            }
        }
    }
    out
}

/// The shared round body's pattern scan: rides every candidate pattern,
/// alighting and (re)boarding at each stop position.
///
/// Grounded on the teacher's `routing/raptor/range_raptor.rs` round body,
/// generalized to interleave scheduled and frequency boarding per
/// SPEC_FULL.md §4.2.
#[allow(clippy::too_many_arguments)]
pub fn scan_patterns(
    chain: &mut RoundChain,
    layer: &TransitLayer,
    round: usize,
    candidate_patterns: &FixedBitSet,
    scan_scheduled: bool,
    scan_frequency: bool,
    boarding_mode: BoardingMode,
    offsets: Option<&FrequencyOffsets>,
    active_services: &FixedBitSet,
    updated: impl Fn(StopIndex) -> bool,
) -> Result<(), RaptorError> {
    debug_assert!(round >= 1, "pattern scan only runs for rounds >= 1");

    for pattern_idx in candidate_patterns.ones() {
        let pattern = &layer.patterns[pattern_idx];
        let mut boarded = Boarded::None;

        for (pos, &stop) in pattern.stops.iter().enumerate() {
            // Alight attempt.
            match &boarded {
                Boarded::Scheduled {
                    trip_idx,
                    board_stop_pos,
                    board_time,
                    wait_time,
                } if pattern.dropoff[pos].allowed() => {
                    let trip = &pattern.trips[*trip_idx];
                    let alight_time = trip.arrivals[pos];
                    let in_vehicle_time = alight_time.saturating_sub(*board_time);
                    chain.set_time_at_stop(
                        round,
                        stop,
                        alight_time,
                        Some(pattern_idx),
                        Some(pattern.stops[*board_stop_pos]),
                        *wait_time,
                        in_vehicle_time,
                        false,
                    )?;
                }
                Boarded::Frequency {
                    trip_idx,
                    board_stop_pos,
                    board_time,
                    wait_time,
                    ..
                } if pattern.dropoff[pos].allowed() => {
                    let trip = &pattern.trips[*trip_idx];
                    let relative_travel =
                        trip.arrivals[pos].saturating_sub(trip.departures[*board_stop_pos]);
                    let alight_time = board_time + relative_travel;
                    chain.set_time_at_stop(
                        round,
                        stop,
                        alight_time,
                        Some(pattern_idx),
                        Some(pattern.stops[*board_stop_pos]),
                        *wait_time,
                        relative_travel,
                        false,
                    )?;
                }
                _ => {}
            }

            // Board attempt.
            if round == 0 || !updated(stop) || !pattern.pickup[pos].allowed() {
                continue;
            }
            let prev_best = chain.rounds[round - 1].best_times[stop];
            if prev_best == crate::constants::UNREACHED {
                continue;
            }
            // Do not immediately reboard the pattern that produced this
            // stop's own arrival without an intervening transfer.
            let reboarding_own_pattern = chain.rounds[round - 1].previous_pattern[stop]
                == Some(pattern_idx)
                && chain.rounds[round - 1].transfer_stop[stop].is_none();
            if reboarding_own_pattern {
                continue;
            }
            let earliest_board_time = prev_best + MINIMUM_BOARD_WAIT_SEC;

            if scan_scheduled {
                let currently_on = match &boarded {
                    Boarded::Scheduled { trip_idx, .. } => Some(*trip_idx),
                    _ => None,
                };
                if let Some(trip_idx) = find_boardable_scheduled_trip(
                    pattern,
                    pos,
                    earliest_board_time,
                    active_services,
                    currently_on,
                ) {
                    let departure = pattern.trips[trip_idx].departures[pos];
                    boarded = Boarded::Scheduled {
                        trip_idx,
                        board_stop_pos: pos,
                        board_time: departure,
                        wait_time: departure - prev_best,
                    };
                }
            }

            if scan_frequency {
                let mut best: Option<(TripIndex, FrequencyEntryIndex, Time)> = None;
                for (trip_idx, trip) in pattern.trips.iter().enumerate() {
                    if !trip.is_frequency()
                        || !active_services.contains(trip.service_code as usize)
                    {
                        continue;
                    }
                    let mut trip_best: Option<(FrequencyEntryIndex, Time)> = None;
                    for (entry_idx, entry) in trip.frequency_entries.iter().enumerate() {
                        let offset = match boarding_mode {
                            BoardingMode::Random => offsets
                                .expect("Random boarding mode requires a FrequencyOffsets table")
                                .offset(pattern_idx, trip_idx, entry_idx),
                            _ => 0,
                        };
                        if let Some(t) = board_time(
                            boarding_mode,
                            entry,
                            trip.departures[pos],
                            earliest_board_time,
                            offset,
                        ) {
                            if trip_best.map_or(true, |(_, bt)| t < bt) {
                                trip_best = Some((entry_idx, t));
                            }
                        }
                    }
                    if let Some((entry_idx, t)) = trip_best {
                        if best.map_or(true, |(_, _, bt)| t < bt) {
                            best = Some((trip_idx, entry_idx, t));
                        }
                    }
                }

                if let Some((trip_idx, entry_idx, candidate_time)) = best {
                    let switch = match &boarded {
                        Boarded::Frequency {
                            trip_idx: cur_trip,
                            board_stop_pos,
                            board_time,
                            ..
                        } => {
                            let trip = &pattern.trips[*cur_trip];
                            let remain_on_board = board_time
                                + trip.departures[pos]
                                    .saturating_sub(trip.departures[*board_stop_pos]);
                            candidate_time < remain_on_board
                        }
                        Boarded::Scheduled { .. } => false,
                        Boarded::None => true,
                    };
                    if switch {
                        boarded = Boarded::Frequency {
                            trip_idx,
                            entry_idx,
                            board_stop_pos: pos,
                            board_time: candidate_time,
                            wait_time: candidate_time - prev_best,
                        };
                    }
                }
            }
        }
    }

    Ok(())
}

/// Stop-to-stop transfer pass: the last step of a round body. Transfers
/// update only `best_times`, never `best_non_transfer_times`, so a second
/// round cannot chain two transfers together.
pub fn scan_transfers(
    chain: &mut RoundChain,
    layer: &TransitLayer,
    round: usize,
    walk_speed_mps: f64,
    max_walk_time_seconds: u32,
) -> Result<(), RaptorError> {
    let updated_stops: Vec<StopIndex> = chain.rounds[round]
        .non_transfer_stops_updated
        .ones()
        .collect();

    for stop in updated_stops {
        let base_time = chain.rounds[round].best_non_transfer_times[stop];
        for transfer in layer.transfers_for_stop(stop) {
            let walk_seconds = (transfer.distance_mm as f64 / 1000.0 / walk_speed_mps) as u32;
            if walk_seconds > max_walk_time_seconds {
                continue;
            }
            chain.set_time_at_stop(
                round,
                transfer.target_stop,
                base_time + walk_seconds,
                None,
                Some(stop),
                0,
                0,
                true,
            )?;
        }
    }
    Ok(())
}
