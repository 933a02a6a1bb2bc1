pub mod board;
pub mod engine;
pub mod path;
pub mod prefilter;
pub mod scan;
pub mod state;

pub use board::BoardingMode;
pub use engine::{RaptorEngine, RaptorOutput};
pub use path::{reconstruct_path, Leg, LegKind, Path};
pub use prefilter::{prefilter, RunningPatterns};
pub use state::{RaptorState, RoundChain};
