use chrono::NaiveDate;
use hashbrown::HashSet;

use crate::constants::{DEFAULT_MONTE_CARLO_DRAWS_PER_MINUTE, DEFAULT_WALK_SPEED_MPS};
use crate::model::transit_layer::TransitMode;
use crate::RaptorError;

/// The boarding strategy a search should use for frequency patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencySearchMode {
    MonteCarlo,
    HalfHeadway,
}

/// Parameters for one origin's search, validated at construction.
#[derive(Debug, Clone)]
pub struct ProfileRequest {
    pub date: NaiveDate,
    pub from_time: u32,
    pub to_time: u32,
    pub max_rides: usize,
    pub max_trip_duration_minutes: u32,
    pub walk_speed_mps: f64,
    pub max_walk_time_minutes: u32,
    pub monte_carlo_draws_per_minute: u32,
    pub lock_schedules: bool,
    pub transit_modes: HashSet<TransitMode>,
}

impl ProfileRequest {
    pub fn new(
        date: NaiveDate,
        from_time: u32,
        to_time: u32,
        transit_modes: HashSet<TransitMode>,
    ) -> Result<Self, RaptorError> {
        let request = ProfileRequest {
            date,
            from_time,
            to_time,
            max_rides: 4,
            max_trip_duration_minutes: 120,
            walk_speed_mps: DEFAULT_WALK_SPEED_MPS,
            max_walk_time_minutes: 20,
            monte_carlo_draws_per_minute: DEFAULT_MONTE_CARLO_DRAWS_PER_MINUTE,
            lock_schedules: false,
            transit_modes,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), RaptorError> {
        if self.transit_modes.is_empty() {
            return Err(RaptorError::InvalidInput(
                "transit_modes must not be empty".into(),
            ));
        }
        if self.to_time <= self.from_time {
            return Err(RaptorError::InvalidInput(
                "to_time must be greater than from_time".into(),
            ));
        }
        if self.walk_speed_mps <= 0.0 {
            return Err(RaptorError::InvalidInput(
                "walk_speed_mps must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn frequency_search_mode(&self) -> FrequencySearchMode {
        if self.monte_carlo_draws_per_minute == 0 {
            FrequencySearchMode::HalfHeadway
        } else {
            FrequencySearchMode::MonteCarlo
        }
    }

    pub fn max_duration_seconds(&self) -> u32 {
        self.max_trip_duration_minutes * 60
    }

    pub fn max_walk_time_seconds(&self) -> u32 {
        self.max_walk_time_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes() -> HashSet<TransitMode> {
        let mut s = HashSet::new();
        s.insert(TransitMode::Bus);
        s
    }

    #[test]
    fn rejects_empty_mode_set() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let err = ProfileRequest::new(date, 0, 3600, HashSet::new()).unwrap_err();
        assert!(matches!(err, RaptorError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_window() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let err = ProfileRequest::new(date, 3600, 3600, modes()).unwrap_err();
        assert!(matches!(err, RaptorError::InvalidInput(_)));
    }

    #[test]
    fn zero_draws_selects_half_headway() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut req = ProfileRequest::new(date, 0, 3600, modes()).unwrap();
        req.monte_carlo_draws_per_minute = 0;
        assert_eq!(req.frequency_search_mode(), FrequencySearchMode::HalfHeadway);
    }
}
