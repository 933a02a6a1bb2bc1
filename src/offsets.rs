use hashbrown::HashMap;
use rand::Rng;

use crate::model::transit_layer::PhaseSource;
use crate::model::TransitLayer;
use crate::types::{FrequencyEntryIndex, PatternIndex, TripIndex};
use crate::RaptorError;

type EntryKey = (PatternIndex, TripIndex, FrequencyEntryIndex);

/// Per-Monte-Carlo-draw phase of every frequency entry in the network.
///
/// Shaped like the `TransitLayer`'s patterns/trips/entries so a lookup is a
/// triple index rather than a hash, since it sits in the hot boarding loop.
#[derive(Debug, Clone)]
pub struct FrequencyOffsets {
    offsets: Vec<Vec<Vec<u32>>>,
}

/// Checks a phased entry's source reference against SPEC_FULL.md §7's
/// `InvalidInput` cases: the referenced entry must actually exist, and the
/// phase's anchor stop must lie on the source pattern's stop sequence.
fn validate_phase_source(layer: &TransitLayer, source: PhaseSource) -> Result<(), RaptorError> {
    let pattern = layer.patterns.get(source.pattern).ok_or_else(|| {
        RaptorError::InvalidInput(format!(
            "missing phase source id: no pattern {}",
            source.pattern
        ))
    })?;
    let trip = pattern.trips.get(source.trip).ok_or_else(|| {
        RaptorError::InvalidInput(format!(
            "missing phase source id: no trip {} on pattern {}",
            source.trip, source.pattern
        ))
    })?;
    trip.frequency_entries.get(source.entry).ok_or_else(|| {
        RaptorError::InvalidInput(format!(
            "missing phase source id: no frequency entry {} on trip {} of pattern {}",
            source.entry, source.trip, source.pattern
        ))
    })?;
    if !pattern.stops.contains(&source.target_stop) {
        return Err(RaptorError::InvalidInput(format!(
            "target stop {} not on phase-source pattern {}",
            source.target_stop, source.pattern
        )));
    }
    Ok(())
}

impl FrequencyOffsets {
    /// Builds a zeroed offset table shaped to `layer`. Call [`Self::randomize`]
    /// before using it in a search.
    pub fn new(layer: &TransitLayer) -> Self {
        let offsets = layer
            .patterns
            .iter()
            .map(|pattern| {
                pattern
                    .trips
                    .iter()
                    .map(|trip| vec![0u32; trip.frequency_entries.len()])
                    .collect()
            })
            .collect();
        FrequencyOffsets { offsets }
    }

    pub fn offset(&self, pattern: PatternIndex, trip: TripIndex, entry: FrequencyEntryIndex) -> u32 {
        self.offsets[pattern][trip][entry]
    }

    /// Draws a fresh phase for every unphased frequency entry, then resolves
    /// phased entries against their source in dependency order. Returns
    /// [`RaptorError::PhasingCycle`] if a full pass makes no progress while
    /// unresolved entries remain.
    pub fn randomize(
        &mut self,
        layer: &TransitLayer,
        rng: &mut impl Rng,
    ) -> Result<(), RaptorError> {
        let mut resolved: HashMap<EntryKey, u32> = HashMap::new();
        let mut pending: Vec<EntryKey> = Vec::new();

        for (p, pattern) in layer.patterns.iter().enumerate() {
            for (t, trip) in pattern.trips.iter().enumerate() {
                for (e, entry) in trip.frequency_entries.iter().enumerate() {
                    let headway = entry.headway_seconds.max(1);
                    match entry.phase_source {
                        None => {
                            let offset = rng.gen_range(0..headway);
                            resolved.insert((p, t, e), offset);
                        }
                        Some(source) => {
                            validate_phase_source(layer, source)?;
                            pending.push((p, t, e));
                        }
                    }
                }
            }
        }

        while !pending.is_empty() {
            let before = pending.len();
            let mut still_pending = Vec::new();
            for key in pending {
                let (p, t, e) = key;
                let entry = &layer.patterns[p].trips[t].frequency_entries[e];
                let source = entry
                    .phase_source
                    .expect("pending entries always carry a phase source");
                let source_key = (source.pattern, source.trip, source.entry);
                if let Some(&source_offset) = resolved.get(&source_key) {
                    let headway = entry.headway_seconds.max(1) as i64;
                    let offset = (source_offset as i64 + source.phase_seconds as i64)
                        .rem_euclid(headway) as u32;
                    resolved.insert(key, offset);
                } else {
                    still_pending.push(key);
                }
            }
            if still_pending.len() == before {
                return Err(RaptorError::PhasingCycle(format!(
                    "{} frequency entries could not be resolved: {:?}",
                    still_pending.len(),
                    still_pending
                )));
            }
            pending = still_pending;
        }

        for ((p, t, e), offset) in resolved {
            self.offsets[p][t][e] = offset;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transit_layer::{FrequencyEntry, PhaseSource, PickupDropoff, TransitMode, TripPattern, TripSchedule};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn freq_trip(entries: Vec<FrequencyEntry>) -> TripSchedule {
        TripSchedule {
            arrivals: vec![0, 300],
            departures: vec![0, 300],
            service_code: 0,
            frequency_entries: entries,
        }
    }

    #[test]
    fn unphased_entries_draw_within_headway() {
        let pattern = TripPattern::new(
            vec![0, 1],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: None,
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let layer = TransitLayer::new(vec![pattern], vec![Vec::new(); 2], 2);
        let mut offsets = FrequencyOffsets::new(&layer);
        let mut rng = StdRng::seed_from_u64(7);
        offsets.randomize(&layer, &mut rng).unwrap();
        assert!(offsets.offset(0, 0, 0) < 600);
    }

    #[test]
    fn phased_entry_tracks_source_modulo_headway() {
        let source_pattern = TripPattern::new(
            vec![0, 1],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: None,
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let phased_pattern = TripPattern::new(
            vec![1, 2],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: Some(PhaseSource {
                    pattern: 0,
                    trip: 0,
                    entry: 0,
                    phase_seconds: 0,
                    target_stop: 1,
                }),
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let layer = TransitLayer::new(vec![source_pattern, phased_pattern], vec![Vec::new(); 3], 3);
        let mut offsets = FrequencyOffsets::new(&layer);
        let mut rng = StdRng::seed_from_u64(11);
        offsets.randomize(&layer, &mut rng).unwrap();
        assert_eq!(offsets.offset(0, 0, 0), offsets.offset(1, 0, 0));
    }

    #[test]
    fn self_referential_phase_is_a_cycle() {
        let pattern = TripPattern::new(
            vec![0, 1],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: Some(PhaseSource {
                    pattern: 0,
                    trip: 0,
                    entry: 0,
                    phase_seconds: 0,
                    target_stop: 1,
                }),
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let layer = TransitLayer::new(vec![pattern], vec![Vec::new(); 2], 2);
        let mut offsets = FrequencyOffsets::new(&layer);
        let mut rng = StdRng::seed_from_u64(3);
        let err = offsets.randomize(&layer, &mut rng).unwrap_err();
        assert!(matches!(err, RaptorError::PhasingCycle(_)));
    }

    #[test]
    fn missing_phase_source_entry_is_invalid_input() {
        let pattern = TripPattern::new(
            vec![0, 1],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: Some(PhaseSource {
                    pattern: 0,
                    trip: 0,
                    entry: 5, // no such entry exists on trip 0
                    phase_seconds: 0,
                    target_stop: 1,
                }),
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let layer = TransitLayer::new(vec![pattern], vec![Vec::new(); 2], 2);
        let mut offsets = FrequencyOffsets::new(&layer);
        let mut rng = StdRng::seed_from_u64(4);
        let err = offsets.randomize(&layer, &mut rng).unwrap_err();
        assert!(matches!(err, RaptorError::InvalidInput(_)));
    }

    #[test]
    fn target_stop_off_source_pattern_is_invalid_input() {
        let source_pattern = TripPattern::new(
            vec![0, 1],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: None,
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let phased_pattern = TripPattern::new(
            vec![1, 2],
            vec![PickupDropoff::Regular; 2],
            vec![PickupDropoff::Regular; 2],
            vec![freq_trip(vec![FrequencyEntry {
                start_time: 0,
                end_time: 3600,
                headway_seconds: 600,
                phase_source: Some(PhaseSource {
                    pattern: 0,
                    trip: 0,
                    entry: 0,
                    phase_seconds: 0,
                    target_stop: 2, // not on source_pattern's [0, 1]
                }),
            }])],
            TransitMode::Bus,
        )
        .unwrap();
        let layer = TransitLayer::new(vec![source_pattern, phased_pattern], vec![Vec::new(); 3], 3);
        let mut offsets = FrequencyOffsets::new(&layer);
        let mut rng = StdRng::seed_from_u64(5);
        let err = offsets.randomize(&layer, &mut rng).unwrap_err();
        assert!(matches!(err, RaptorError::InvalidInput(_)));
    }
}
