use chrono::NaiveDate;
use fixedbitset::FixedBitSet;

use crate::model::calendar::Calendar;
use crate::types::{FrequencyEntryIndex, PatternIndex, ServiceCode, StopIndex, Time, TripIndex};
use crate::RaptorError;

/// Whether passengers may board or alight at a stop position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupDropoff {
    None,
    Regular,
}

impl PickupDropoff {
    pub fn allowed(self) -> bool {
        matches!(self, PickupDropoff::Regular)
    }
}

/// Route mode, used by the prefilter's mode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitMode {
    Bus,
    Rail,
    Tram,
    Subway,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
}

/// A frequency window phased off another entry's first vehicle, at a stop
/// the two patterns share.
///
/// See DESIGN.md Open Question 3 for the exact arithmetic this implies.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSource {
    pub pattern: PatternIndex,
    pub trip: TripIndex,
    pub entry: FrequencyEntryIndex,
    pub phase_seconds: i32,
    /// The stop the phase relationship is anchored to; must lie on
    /// `pattern`'s stop sequence.
    pub target_stop: StopIndex,
}

/// One (startTime, endTime, headwaySeconds) window on a frequency trip.
#[derive(Debug, Clone)]
pub struct FrequencyEntry {
    pub start_time: Time,
    pub end_time: Time,
    pub headway_seconds: u32,
    pub phase_source: Option<PhaseSource>,
}

/// A trip's per-stop schedule, or a frequency-based trip's window set.
///
/// `arrivals`/`departures` are always present, one slot per stop position in
/// the owning pattern. `frequency_entries` is empty for a pure scheduled
/// trip; when non-empty, `arrivals`/`departures` hold the relative offsets
/// from the start of a frequency cycle rather than absolute clock times.
#[derive(Debug, Clone)]
pub struct TripSchedule {
    pub arrivals: Vec<Time>,
    pub departures: Vec<Time>,
    pub service_code: ServiceCode,
    pub frequency_entries: Vec<FrequencyEntry>,
}

impl TripSchedule {
    pub fn is_frequency(&self) -> bool {
        !self.frequency_entries.is_empty()
    }
}

/// A unique ordered sequence of stops served by one or more trips.
#[derive(Debug, Clone)]
pub struct TripPattern {
    pub stops: Vec<StopIndex>,
    pub pickup: Vec<PickupDropoff>,
    pub dropoff: Vec<PickupDropoff>,
    pub trips: Vec<TripSchedule>,
    pub mode: TransitMode,
    has_frequencies: bool,
    has_schedules: bool,
}

impl TripPattern {
    pub fn new(
        stops: Vec<StopIndex>,
        pickup: Vec<PickupDropoff>,
        dropoff: Vec<PickupDropoff>,
        trips: Vec<TripSchedule>,
        mode: TransitMode,
    ) -> Result<Self, RaptorError> {
        if stops.len() != pickup.len() || stops.len() != dropoff.len() {
            return Err(RaptorError::InvalidInput(
                "pattern stop/pickup/dropoff length mismatch".into(),
            ));
        }
        for trip in &trips {
            if trip.arrivals.len() != stops.len() || trip.departures.len() != stops.len() {
                return Err(RaptorError::InvalidInput(
                    "trip schedule length does not match pattern stop count".into(),
                ));
            }
        }
        let has_frequencies = trips.iter().any(TripSchedule::is_frequency);
        let has_schedules = trips.iter().any(|t| !t.is_frequency());
        Ok(TripPattern {
            stops,
            pickup,
            dropoff,
            trips,
            mode,
            has_frequencies,
            has_schedules,
        })
    }

    pub fn has_frequencies(&self) -> bool {
        self.has_frequencies
    }

    pub fn has_schedules(&self) -> bool {
        self.has_schedules
    }

    pub fn stop_position(&self, stop: StopIndex) -> Option<usize> {
        self.stops.iter().position(|&s| s == stop)
    }
}

/// A walk transfer from one stop to another.
#[derive(Debug, Clone, Copy)]
pub struct Transfer {
    pub target_stop: StopIndex,
    pub distance_mm: u32,
}

/// The immutable transit network consumed by the routing core.
#[derive(Debug, Clone)]
pub struct TransitLayer {
    pub patterns: Vec<TripPattern>,
    transfers_for_stop: Vec<Vec<Transfer>>,
    patterns_for_stop: Vec<Vec<PatternIndex>>,
    stop_count: usize,
    calendar: Calendar,
    service_code_count: usize,
}

impl TransitLayer {
    pub fn new(
        patterns: Vec<TripPattern>,
        transfers_for_stop: Vec<Vec<Transfer>>,
        stop_count: usize,
    ) -> Self {
        let mut patterns_for_stop = vec![Vec::new(); stop_count];
        for (pattern_idx, pattern) in patterns.iter().enumerate() {
            for &stop in &pattern.stops {
                let bucket = &mut patterns_for_stop[stop];
                if bucket.last() != Some(&pattern_idx) {
                    bucket.push(pattern_idx);
                }
            }
        }
        let service_code_count = patterns
            .iter()
            .flat_map(|p| p.trips.iter())
            .map(|t| t.service_code + 1)
            .max()
            .unwrap_or(0) as usize;
        TransitLayer {
            patterns,
            transfers_for_stop,
            patterns_for_stop,
            stop_count,
            calendar: Calendar::new(),
            service_code_count,
        }
    }

    /// Attaches a runtime calendar, used to answer [`Self::services_active_for_date`].
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn services_active_for_date(&self, date: NaiveDate) -> FixedBitSet {
        self.calendar
            .services_active_for_date(date, self.service_code_count)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    pub fn transfers_for_stop(&self, stop: StopIndex) -> &[Transfer] {
        &self.transfers_for_stop[stop]
    }

    pub fn patterns_for_stop(&self, stop: StopIndex) -> &[PatternIndex] {
        &self.patterns_for_stop[stop]
    }

    pub fn validate_stop(&self, stop: StopIndex) -> Result<(), RaptorError> {
        if stop >= self.stop_count {
            return Err(RaptorError::InvalidInput(format!(
                "stop index {stop} out of range (stop_count = {})",
                self.stop_count
            )));
        }
        Ok(())
    }
}
