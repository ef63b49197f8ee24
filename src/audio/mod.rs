pub mod buffer;
pub mod chain;
pub mod engine;
pub mod parameters;
pub mod preset;

pub use buffer::{AudioBuffer, AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
pub use chain::{EffectChain, SharedNode};
pub use engine::{EffectEngine, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
pub use parameters::{parse_key, ParameterManager};
pub use preset::{OutputEq, Preset, PresetEntry, PresetError, PresetStore};
