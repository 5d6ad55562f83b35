//! Audio pipeline: PCM buffers, the clip library, sequence assembly, and
//! playout to the repeater nodes.

pub mod assembler;
pub mod buffer;
pub mod clips;
pub mod playout;

pub use assembler::{Assembly, AssemblyMode, AudioAssembler};
pub use buffer::AudioBuffer;
pub use clips::{ClipSource, SoundLibrary};
pub use playout::Playout;
