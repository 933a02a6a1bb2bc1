use fixedbitset::FixedBitSet;

use crate::model::{ProfileRequest, TransitLayer};

/// Running patterns for one search, split by whether they carry any
/// scheduled trips, any frequency trips, or both.
///
/// Grounded on the teacher's `create_route_queue` pattern-marking idiom in
/// `routing/raptor/common/raptor_utils.rs`, generalized to the two-bitset
/// split SPEC_FULL.md §4.1 requires.
pub struct RunningPatterns {
    pub scheduled: FixedBitSet,
    pub frequency: FixedBitSet,
}

impl RunningPatterns {
    pub fn any_frequency(&self) -> bool {
        self.frequency.count_ones(..) > 0
    }

    pub fn any_scheduled(&self) -> bool {
        self.scheduled.count_ones(..) > 0
    }
}

/// Computes which patterns run on the request's date and mode set.
pub fn prefilter(
    layer: &TransitLayer,
    request: &ProfileRequest,
    active_services: &FixedBitSet,
) -> RunningPatterns {
    let n = layer.patterns.len();
    let mut scheduled = FixedBitSet::with_capacity(n);
    let mut frequency = FixedBitSet::with_capacity(n);

    for (idx, pattern) in layer.patterns.iter().enumerate() {
        if !request.transit_modes.contains(&pattern.mode) {
            continue;
        }
        let pattern_qualifies = pattern.trips.iter().any(|trip| {
            (trip.service_code as usize) < active_services.len()
                && active_services.contains(trip.service_code as usize)
        });
        if !pattern_qualifies {
            continue;
        }
        if pattern.has_schedules() {
            scheduled.insert(idx);
        }
        if pattern.has_frequencies() {
            frequency.insert(idx);
        }
    }

    RunningPatterns { scheduled, frequency }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transit_layer::{PickupDropoff, TransitMode, TripPattern, TripSchedule};
    use chrono::NaiveDate;
    use hashbrown::HashSet;

    fn scheduled_pattern(service_code: u32, mode: TransitMode) -> TripPattern {
        TripPattern::new(
            vec![0, 1],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![TripSchedule {
                arrivals: vec![0, 300],
                departures: vec![0, 300],
                service_code,
                frequency_entries: vec![],
            }],
            mode,
        )
        .unwrap()
    }

    #[test]
    fn excludes_patterns_with_no_active_service() {
        let pattern = scheduled_pattern(0, TransitMode::Bus);
        let mut modes = HashSet::new();
        modes.insert(TransitMode::Bus);
        let request = ProfileRequest::new(
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            0,
            3600,
            modes,
        )
        .unwrap();
        let mut active = FixedBitSet::with_capacity(1);
        // service 0 is not marked active
        let running = prefilter(
            &crate::model::TransitLayer::new(vec![pattern], vec![Vec::new(); 2], 2),
            &request,
            &active,
        );
        active.clear();
        assert!(!running.any_scheduled());
    }

    #[test]
    fn excludes_patterns_outside_requested_modes() {
        let pattern = scheduled_pattern(0, TransitMode::Rail);
        let mut modes = HashSet::new();
        modes.insert(TransitMode::Bus);
        let request = ProfileRequest::new(
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            0,
            3600,
            modes,
        )
        .unwrap();
        let mut active = FixedBitSet::with_capacity(1);
        active.insert(0);
        let layer = crate::model::TransitLayer::new(vec![pattern], vec![Vec::new(); 2], 2);
        let running = prefilter(&layer, &request, &active);
        assert!(!running.any_scheduled());
    }
}
