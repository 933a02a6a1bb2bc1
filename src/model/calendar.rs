use chrono::{Datelike, NaiveDate, Weekday};
use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

use crate::types::ServiceCode;

/// Per-service-code validity: a day-of-week mask plus a validity interval
/// and an exception list, the minimum a caller must supply for the core to
/// answer `services_active_for_date` without parsing any feed itself.
#[derive(Debug, Clone)]
pub struct ServiceCalendarEntry {
    pub dow_mask: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub added: Vec<NaiveDate>,
    pub removed: Vec<NaiveDate>,
}

impl ServiceCalendarEntry {
    fn runs_on(&self, date: NaiveDate) -> bool {
        if self.removed.contains(&date) {
            return false;
        }
        if self.added.contains(&date) {
            return true;
        }
        if date < self.start_date || date > self.end_date {
            return false;
        }
        let bit = 1u8 << weekday_index(date.weekday());
        self.dow_mask & bit != 0
    }
}

fn weekday_index(w: Weekday) -> u8 {
    match w {
        Weekday::Mon => 0,
        Weekday::Tue => 1,
        Weekday::Wed => 2,
        Weekday::Thu => 3,
        Weekday::Fri => 4,
        Weekday::Sat => 5,
        Weekday::Sun => 6,
    }
}

/// Minimal runtime calendar owned by the `TransitLayer`.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    entries: HashMap<ServiceCode, ServiceCalendarEntry>,
}

impl Calendar {
    pub fn new() -> Self {
        Calendar {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, service_code: ServiceCode, entry: ServiceCalendarEntry) {
        self.entries.insert(service_code, entry);
    }

    /// Returns the bitset of service codes active on `date`, sized to
    /// `service_code_count` (service codes are dense indices).
    pub fn services_active_for_date(
        &self,
        date: NaiveDate,
        service_code_count: usize,
    ) -> FixedBitSet {
        let mut active = FixedBitSet::with_capacity(service_code_count);
        for (&code, entry) in &self.entries {
            if (code as usize) < service_code_count && entry.runs_on(date) {
                active.insert(code as usize);
            }
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_service_runs_only_on_its_days() {
        let mut cal = Calendar::new();
        cal.insert(
            0,
            ServiceCalendarEntry {
                dow_mask: 1 << weekday_index(Weekday::Mon),
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
                added: vec![],
                removed: vec![],
            },
        );
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        assert!(cal.services_active_for_date(monday, 1).contains(0));
        assert!(!cal.services_active_for_date(tuesday, 1).contains(0));
    }

    #[test]
    fn calendar_exception_removes_a_date() {
        let mut cal = Calendar::new();
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        cal.insert(
            0,
            ServiceCalendarEntry {
                dow_mask: 1 << weekday_index(Weekday::Mon),
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
                added: vec![],
                removed: vec![monday],
            },
        );
        assert!(!cal.services_active_for_date(monday, 1).contains(0));
    }
}
