use fixedbitset::FixedBitSet;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::model::request::FrequencySearchMode;
use crate::model::{ProfileRequest, TransitLayer};
use crate::offsets::FrequencyOffsets;
use crate::raptor::board::BoardingMode;
use crate::raptor::path::{reconstruct_path, Path};
use crate::raptor::prefilter::prefilter;
use crate::raptor::scan::{patterns_to_scan, scan_patterns, scan_transfers};
use crate::raptor::state::RoundChain;
use crate::timings::{timed, Timings};
use crate::types::{StopIndex, Time};
use crate::RaptorError;

/// Result of one origin's range-raptor + Monte-Carlo search.
#[derive(Debug)]
pub struct RaptorOutput {
    /// `[iteration][stop]`, travel-time durations from the departure
    /// minute; UNREACHED is preserved where a stop was never reached.
    pub travel_times_per_iteration: Vec<Vec<Time>>,
    /// `[iteration][target position]`, present only when `run_with_paths`
    /// was used; empty otherwise. Positions line up with the caller's
    /// `path_targets` slice, not with stop index.
    pub paths_per_iteration: Vec<Vec<Path>>,
    pub timings: Timings,
}

/// Orchestrates the full control flow of SPEC_FULL.md §4.2: a minute-by-
/// minute range-raptor sweep, with an optional Monte-Carlo or half-headway
/// pass layered on top when the network has frequency patterns.
///
/// Grounded on the teacher's `routing/raptor/range_raptor.rs::rraptor`.
pub struct RaptorEngine<'a> {
    layer: &'a TransitLayer,
    request: &'a ProfileRequest,
}

impl<'a> RaptorEngine<'a> {
    pub fn new(layer: &'a TransitLayer, request: &'a ProfileRequest) -> Self {
        RaptorEngine { layer, request }
    }

    pub fn run(&self, access_times: &[Time]) -> Result<RaptorOutput, RaptorError> {
        self.run_inner(access_times, &[])
    }

    /// Same search as [`run`](Self::run), additionally reconstructing a
    /// [`Path`] to each stop in `path_targets` for every iteration -- the
    /// optional `paths[iter][stop]` output of SPEC_FULL.md §6. Reconstructed
    /// while each iteration's chain is still alive, since the engine never
    /// retains round-state chains past the minute or draw that produced
    /// them.
    pub fn run_with_paths(
        &self,
        access_times: &[Time],
        path_targets: &[StopIndex],
    ) -> Result<RaptorOutput, RaptorError> {
        self.run_inner(access_times, path_targets)
    }

    fn run_inner(
        &self,
        access_times: &[Time],
        path_targets: &[StopIndex],
    ) -> Result<RaptorOutput, RaptorError> {
        self.request.validate()?;
        if access_times.len() != self.layer.stop_count() {
            return Err(RaptorError::InvalidInput(format!(
                "access_times length {} does not match stop_count {}",
                access_times.len(),
                self.layer.stop_count()
            )));
        }

        let mut timings = Timings::new();

        let (active_services, running) = timed(&mut timings.prefilter, || {
            let active_services = self.layer.services_active_for_date(self.request.date);
            let running = prefilter(self.layer, self.request, &active_services);
            (active_services, running)
        });

        let n_stops = self.layer.stop_count();
        let max_rides = self.request.max_rides;
        let max_duration = self.request.max_duration_seconds();

        let start_minute = self.request.from_time / 60;
        let end_minute = (self.request.to_time + 59) / 60;
        if end_minute <= start_minute {
            return Err(RaptorError::InvalidInput(
                "departure window resolves to zero minutes".into(),
            ));
        }

        let mut scheduled_chain = RoundChain::new(n_stops, max_rides, max_duration);
        let has_frequency = running.any_frequency();
        let mut upper_bound_chain = if has_frequency {
            Some(RoundChain::new(n_stops, max_rides, max_duration))
        } else {
            None
        };
        // A pass that considers frequency trips at all (UPPER_BOUND, or a
        // Monte-Carlo/half-headway draw) must treat every pattern that runs
        // either kind of trip as a scan candidate -- not just the patterns
        // that run the kind named by its own `running` bucket.
        let mut all_running = running.scheduled.clone();
        all_running.union_with(&running.frequency);

        let mut offsets = has_frequency.then(|| FrequencyOffsets::new(self.layer));
        let mut rng: StdRng = if self.request.lock_schedules {
            StdRng::seed_from_u64(0xA5A5_5A5A)
        } else {
            StdRng::from_entropy()
        };

        let draws_per_minute = match self.request.frequency_search_mode() {
            FrequencySearchMode::HalfHeadway => 1,
            FrequencySearchMode::MonteCarlo => self.request.monte_carlo_draws_per_minute.max(1),
        };

        let mut travel_times_per_iteration = Vec::new();
        let mut paths_per_iteration = Vec::new();

        for minute in (start_minute..end_minute).rev() {
            let departure_time = minute * 60;

            scheduled_chain.set_departure_time(departure_time);
            scheduled_chain.stamp_access_stop_all(access_times)?;
            timed(&mut timings.scheduled_pass, || {
                self.run_pass(
                    &mut scheduled_chain,
                    &running.scheduled,
                    true,
                    false,
                    BoardingMode::Random,
                    None,
                    &active_services,
                    false,
                )
            })?;

            if !has_frequency {
                travel_times_per_iteration.push(to_durations(&scheduled_chain, departure_time));
                if !path_targets.is_empty() {
                    paths_per_iteration.push(
                        path_targets
                            .iter()
                            .map(|&stop| reconstruct_path(&scheduled_chain, stop))
                            .collect(),
                    );
                }
                timings.iterations += 1;
                continue;
            }

            let upper_bound_chain_ref = upper_bound_chain.as_mut().unwrap();
            upper_bound_chain_ref.set_departure_time(departure_time);
            upper_bound_chain_ref.stamp_access_stop_all(access_times)?;
            timed(&mut timings.scheduled_pass, || {
                self.run_pass(
                    upper_bound_chain_ref,
                    &all_running,
                    true,
                    true,
                    BoardingMode::UpperBound,
                    None,
                    &active_services,
                    true,
                )
            })?;

            let offsets_ref = offsets.as_mut().unwrap();

            for _ in 0..draws_per_minute {
                let mode = match self.request.frequency_search_mode() {
                    FrequencySearchMode::HalfHeadway => BoardingMode::HalfHeadway,
                    FrequencySearchMode::MonteCarlo => {
                        offsets_ref.randomize(self.layer, &mut rng)?;
                        BoardingMode::Random
                    }
                };

                // The draw chain starts from whatever the scheduled range-raptor
                // chain already achieved this minute, then is further ceiling-
                // seeded with the worst-case UPPER_BOUND arrivals. Any board
                // attempt this draw makes that cannot beat those seeded times
                // is rejected by the ordinary `set_time_at_stop` comparison,
                // which is the per-stop pruning SPEC_FULL.md §4.2 describes.
                let mut draw_chain = scheduled_chain.clone();
                draw_chain.merge_ceiling_from(upper_bound_chain_ref);

                timed(&mut timings.monte_carlo_pass, || {
                    self.run_pass(
                        &mut draw_chain,
                        &all_running,
                        true,
                        true,
                        mode,
                        Some(&*offsets_ref),
                        &active_services,
                        true,
                    )
                })?;

                travel_times_per_iteration.push(to_durations(&draw_chain, departure_time));
                if !path_targets.is_empty() {
                    paths_per_iteration.push(
                        path_targets
                            .iter()
                            .map(|&stop| reconstruct_path(&draw_chain, stop))
                            .collect(),
                    );
                }
                timings.iterations += 1;
            }
        }

        timings.log_summary();
        Ok(RaptorOutput {
            travel_times_per_iteration,
            paths_per_iteration,
            timings,
        })
    }

    /// Runs the round body (pattern scan + transfers) for every round.
    ///
    /// "Updated", per SPEC_FULL.md §4.2's round body, has two different
    /// readings depending on what this pass is: (a) within-minute, via
    /// `previous.stopsUpdated[s]`, for a range-raptor-valid pass -- the
    /// plain scheduled sweep, whose bitsets are cleared fresh every minute
    /// and accumulate correctly round over round; or (b) cross-minute, via
    /// `previous.bestTimes[s] < previous.previous.bestTimes[s]`, when
    /// layering Monte-Carlo/UPPER_BOUND frequency results on top of
    /// accumulated range-raptor state -- those passes run on a cloned and
    /// ceiling-seeded chain whose `stopsUpdated` bitset reflects the
    /// scheduled pass it was cloned from, not the seeding itself, so the
    /// bitset alone would miss stops the ceiling-seed or an earlier round
    /// of this same pass actually improved. `cross_minute` selects which
    /// reading applies.
    #[allow(clippy::too_many_arguments)]
    fn run_pass(
        &self,
        chain: &mut RoundChain,
        running: &FixedBitSet,
        scan_scheduled: bool,
        scan_frequency: bool,
        mode: BoardingMode,
        offsets: Option<&FrequencyOffsets>,
        active_services: &FixedBitSet,
        cross_minute: bool,
    ) -> Result<(), RaptorError> {
        for round in 1..chain.n_rounds() {
            chain.min_merge_previous(round);
            // Snapshot whatever state decides "updated" up front: it must
            // not be borrowed live from `chain` while `chain` is passed as
            // `&mut` into the scan below.
            if cross_minute {
                let prev_best = chain.rounds[round - 1].best_times.clone();
                let prev_prev_best = if round >= 2 {
                    chain.rounds[round - 2].best_times.clone()
                } else {
                    vec![crate::constants::UNREACHED; prev_best.len()]
                };
                let updated = |stop: usize| prev_best[stop] < prev_prev_best[stop];
                let candidates = patterns_to_scan(self.layer, running, updated);
                scan_patterns(
                    chain,
                    self.layer,
                    round,
                    &candidates,
                    scan_scheduled,
                    scan_frequency,
                    mode,
                    offsets,
                    active_services,
                    updated,
                )?;
            } else {
                let updated_snapshot = chain.rounds[round - 1].stops_updated.clone();
                let updated = |stop: usize| updated_snapshot.contains(stop);
                let candidates = patterns_to_scan(self.layer, running, updated);
                scan_patterns(
                    chain,
                    self.layer,
                    round,
                    &candidates,
                    scan_scheduled,
                    scan_frequency,
                    mode,
                    offsets,
                    active_services,
                    updated,
                )?;
            }
            scan_transfers(
                chain,
                self.layer,
                round,
                self.request.walk_speed_mps,
                self.request.max_walk_time_seconds(),
            )?;
        }
        Ok(())
    }
}

fn to_durations(chain: &RoundChain, departure_time: Time) -> Vec<Time> {
    let n_stops = chain.rounds[0].best_times.len();
    let mut best_overall = vec![crate::constants::UNREACHED; n_stops];
    for round in &chain.rounds {
        for stop in 0..n_stops {
            if round.best_times[stop] < best_overall[stop] {
                best_overall[stop] = round.best_times[stop];
            }
        }
    }
    for time in &mut best_overall {
        if *time != crate::constants::UNREACHED {
            *time -= departure_time;
        }
    }
    best_overall
}
