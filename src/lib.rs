// GearboxFX - guitar effect engine
//
// Serial effect chains built from a registry of fourteen effect types, driven
// block by block from an audio callback while a control thread edits
// parameters and structure. Presets are JSON documents.

pub mod audio;
pub mod dsp;
pub mod effects;
pub mod io;

// Re-export commonly used types
pub use audio::{
    AudioBuffer, AudioBufferView, AudioBufferViewMut, EffectChain, EffectEngine, OutputEq,
    ParameterManager, Preset, PresetError, PresetStore, SharedNode,
};
pub use effects::{Effect, EffectNode, EffectProcessor, EffectRegistry, ParamError};
