pub mod calendar;
pub mod request;
pub mod transit_layer;

pub use calendar::{Calendar, ServiceCalendarEntry};
pub use request::{FrequencySearchMode, ProfileRequest};
pub use transit_layer::{
    FrequencyEntry, PhaseSource, PickupDropoff, Transfer, TransitLayer, TransitMode,
    TripPattern, TripSchedule,
};
