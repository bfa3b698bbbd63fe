//! VDJ model for TCR beta chain and IGH heavy chain

pub mod event;
pub mod model;

// Re-exporting for public API
pub use self::event::StaticEvent;
pub use self::model::{Generative, Model};
