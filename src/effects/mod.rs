pub mod effect_trait;
pub mod node;
pub mod registry;

pub mod chorus;
pub mod clean_boost;
pub mod compressor;
pub mod delay;
pub mod distortion;
pub mod eq;
pub mod flanger;
pub mod noise_gate;
pub mod overdrive;
pub mod phaser;
pub mod pitch_shifter;
pub mod reverb;
pub mod tremolo;
pub mod volume;

pub use effect_trait::{EffectProcessor, ParamDef, ParamSet, ParamUnit};
pub use node::{Effect, EffectNode, ParamError};
pub use registry::{display_label, EffectCategory, EffectFactory, EffectRegistry};

pub use chorus::Chorus;
pub use clean_boost::CleanBoost;
pub use compressor::Compressor;
pub use delay::Delay;
pub use distortion::Distortion;
pub use eq::ParametricEq;
pub use flanger::Flanger;
pub use noise_gate::NoiseGate;
pub use overdrive::Overdrive;
pub use phaser::Phaser;
pub use pitch_shifter::PitchShifter;
pub use reverb::Reverb;
pub use tremolo::Tremolo;
pub use volume::Volume;
