//! Convenience re-exports for downstream crates, matching the teacher's
//! own `prelude.rs`.

pub use crate::constants::UNREACHED;
pub use crate::error::RaptorError;
pub use crate::model::{
    Calendar, FrequencyEntry, FrequencySearchMode, PhaseSource, PickupDropoff, ProfileRequest,
    ServiceCalendarEntry, Transfer, TransitLayer, TransitMode, TripPattern, TripSchedule,
};
pub use crate::offsets::FrequencyOffsets;
pub use crate::propagator::{propagate_target, transpose, EgressCost, EgressModeTable};
pub use crate::raptor::{BoardingMode, Leg, LegKind, Path, RaptorEngine, RaptorOutput};
pub use crate::timings::{timed, Timings};
