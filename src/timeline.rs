pub mod clip;
pub mod concat;

pub use clip::{TimedClip, assemble};
pub use concat::{Timeline, compose_onto_canvas};
