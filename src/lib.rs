//! Round-based public transit routing core: range-raptor over scheduled
//! and frequency-based services, with Monte-Carlo phase randomization and
//! an egress-propagation stage.
//!
//! Building the [`model::TransitLayer`] from GTFS/OSM feeds, computing
//! access times from an origin, and building egress cost tables on a
//! destination point set are all external collaborators; this crate
//! consumes their outputs.

pub mod constants;
pub mod error;
pub mod model;
pub mod offsets;
pub mod prelude;
pub mod propagator;
pub mod raptor;
pub mod timings;
pub mod types;

pub use constants::UNREACHED;
pub use error::RaptorError;
pub use model::{ProfileRequest, TransitLayer};
pub use offsets::FrequencyOffsets;
pub use propagator::{propagate_target, transpose, EgressCost, EgressModeTable};
pub use raptor::{RaptorEngine, RaptorOutput};
pub use timings::Timings;
