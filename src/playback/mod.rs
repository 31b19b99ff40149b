#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod events;
pub mod state;

pub use controller::{PlaybackCoordinator, PlaybackSnapshot};
pub use events::{PlaybackEvents, TriggerOutcome};
pub use state::PlaybackState;
