//! Concrete backends: one over the host media element (Local and Direct),
//! one over the embedded video-platform player.

mod embedded;
mod media;

pub use embedded::EmbeddedBackend;
pub use media::MediaElementBackend;
