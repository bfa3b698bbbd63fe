//! VJ model for TCR alpha chain and IG light chains

pub mod event;
pub mod model;

// Re-exporting for public API
pub use self::event::StaticEvent;
pub use self::model::Model;
