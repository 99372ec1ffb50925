pub mod types;
pub mod config;
pub mod traits;
pub mod transport;
pub mod client;
pub mod utils;
pub mod aggregators;
pub mod submission;
pub mod lifecycle;

pub use types::*;
pub use config::{ActiveConfig, ConfigSnapshot};
pub use traits::Transport;
pub use transport::{HttpTransport, TransportConfig};
pub use client::CompetitionClient;
pub use aggregators::{Debouncer, InteractionWindow, RESULT_DEBOUNCE};
pub use submission::NOTIFICATION_DURATION;
pub use lifecycle::{Collaborators, LifecycleController};
