//! Generation rotation: slots, promotion, and background warming

mod rotator;
mod slots;
mod warmer;

pub use rotator::{GenerationPointer, Rotator};
pub use slots::SlotPaths;
pub use warmer::Warmer;
