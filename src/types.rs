//! Dense integer index types used throughout the routing core, mirroring the
//! teacher's `types.rs` alias style.

pub type StopIndex = usize;
pub type PatternIndex = usize;
pub type TripIndex = usize;
pub type FrequencyEntryIndex = usize;
pub type ServiceCode = u32;

/// Seconds after midnight, or a duration in seconds.
pub type Time = u32;
