//! Bit-exact constants shared across the routing core.

/// Retained for API compatibility with the boarding-time formulas it
/// historically appeared alongside; only [`MINIMUM_BOARD_WAIT_SEC`] is
/// actually consulted on the boarding path (see DESIGN.md Open Question 1).
pub const BOARD_SLACK_SECONDS: u32 = 60;

/// Minimum wait enforced between arriving at a stop and boarding a vehicle
/// there, applied uniformly to both scheduled and frequency boarding.
pub const MINIMUM_BOARD_WAIT_SEC: u32 = 60;

/// The range-raptor sweep advances the departure clock by this many seconds
/// per step.
pub const DEPARTURE_STEP_SEC: u32 = 60;

/// Sentinel for "never reached".
pub const UNREACHED: u32 = u32::MAX;

/// R5's own convention for the default Monte-Carlo draw count per minute.
pub const DEFAULT_MONTE_CARLO_DRAWS_PER_MINUTE: u32 = 220;

/// Teacher's walking-speed constant (`WALKING_SPEED` in `ferrobus-core`), in
/// metres per second.
pub const DEFAULT_WALK_SPEED_MPS: f64 = 1.4;
