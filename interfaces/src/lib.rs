pub mod baseline;
pub mod defs;
pub mod state;

pub use baseline::{BroadcastEventBus, BroadcastQuerySource, FixedFrameRateResolver, WatchConfigSource};
pub use defs::*;
pub use state::InMemorySelection;
