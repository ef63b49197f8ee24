use crate::audio::chain::EffectChain;
use crate::effects::{EffectNode, EffectRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const KNOWN_FIELDS: [&str; 7] = [
    "preset_id",
    "format_version",
    "name",
    "routing_mode",
    "output_eq",
    "output_volume",
    "effect_chain",
];

/// Preset load or save failure
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Three-band output trim in dB
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputEq {
    #[serde(default)]
    pub bass_db: f32,
    #[serde(default)]
    pub mid_db: f32,
    #[serde(default)]
    pub treble_db: f32,
}

/// Preset metadata and output-stage settings
///
/// `raw` keeps the document as parsed so fields this crate does not know
/// about survive a save.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub preset_id: String,
    pub format_version: String,
    pub name: String,
    pub routing_mode: String,
    pub output_eq: OutputEq,
    pub output_volume: f32,
    pub raw: Value,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            preset_id: String::new(),
            format_version: default_format_version(),
            name: default_name(),
            routing_mode: default_routing_mode(),
            output_eq: OutputEq::default(),
            output_volume: default_output_volume(),
            raw: Value::Null,
        }
    }
}

fn default_format_version() -> String {
    "1.0".to_string()
}

fn default_name() -> String {
    "Unnamed".to_string()
}

fn default_routing_mode() -> String {
    "serial".to_string()
}

fn default_output_volume() -> f32 {
    0.85
}

fn default_enabled() -> bool {
    true
}

/// Top-level document as read from disk
#[derive(Debug, Deserialize)]
struct PresetDocument {
    #[serde(default)]
    preset_id: String,
    #[serde(default = "default_format_version")]
    format_version: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_routing_mode")]
    routing_mode: String,
    #[serde(default)]
    output_eq: OutputEq,
    #[serde(default = "default_output_volume")]
    output_volume: f32,
    #[serde(default)]
    effect_chain: Option<Value>,
}

/// One `effect_chain` entry
#[derive(Debug, Deserialize)]
struct NodeEntry {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    type_id: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Serialize)]
struct NodeEntryOut {
    id: String,
    #[serde(rename = "type")]
    type_id: String,
    enabled: bool,
    params: Map<String, Value>,
}

#[derive(Serialize)]
struct PresetDocumentOut<'a> {
    preset_id: &'a str,
    format_version: &'a str,
    name: &'a str,
    routing_mode: &'a str,
    output_eq: OutputEq,
    output_volume: f32,
    effect_chain: Vec<NodeEntryOut>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A preset file found by [`PresetStore::scan_directory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetEntry {
    pub name: String,
    pub path: PathBuf,
}

/// JSON preset reader and writer
pub struct PresetStore;

impl PresetStore {
    /// Parse a preset file and rebuild `chain` from it
    ///
    /// Nothing in the chain changes unless the file is read and parsed.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        chain: &EffectChain,
        registry: &EffectRegistry,
    ) -> Result<Preset, PresetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            log::error!("PresetStore: cannot open '{}': {}", path.display(), source);
            PresetError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::load_from_str(&text, chain, registry)
    }

    pub fn load_from_str(
        json: &str,
        chain: &EffectChain,
        registry: &EffectRegistry,
    ) -> Result<Preset, PresetError> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            log::error!("PresetStore: JSON parse error: {}", e);
            PresetError::Parse(e)
        })?;
        Self::load_from_value(value, chain, registry)
    }

    /// Build a preset from a parsed document and install its effects
    ///
    /// Entries with unknown types, or that are not well-formed objects, are
    /// skipped with a warning. The chain is replaced in a single structural
    /// edit and prepared at its current configuration.
    pub fn load_from_value(
        value: Value,
        chain: &EffectChain,
        registry: &EffectRegistry,
    ) -> Result<Preset, PresetError> {
        let document = PresetDocument::deserialize(&value).map_err(|e| {
            log::error!("PresetStore: invalid preset document: {}", e);
            PresetError::Parse(e)
        })?;

        if document.routing_mode != "serial" {
            log::warn!(
                "Preset '{}': routing mode '{}' is processed as serial",
                document.name,
                document.routing_mode
            );
        }

        let mut nodes = Vec::new();
        match document.effect_chain.as_ref().and_then(Value::as_array) {
            Some(entries) => {
                for entry in entries {
                    if let Some(node) = Self::build_node(&document.name, entry, registry) {
                        nodes.push(node);
                    }
                }
            }
            None => log::warn!("Preset '{}': no effect_chain array", document.name),
        }

        log::info!("Loaded preset '{}' with {} effects", document.name, nodes.len());
        chain.replace_all(nodes);

        Ok(Preset {
            preset_id: document.preset_id,
            format_version: document.format_version,
            name: document.name,
            routing_mode: document.routing_mode,
            output_eq: document.output_eq,
            output_volume: document.output_volume,
            raw: value,
        })
    }

    fn build_node(preset_name: &str, entry: &Value, registry: &EffectRegistry) -> Option<EffectNode> {
        let entry = match NodeEntry::deserialize(entry) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Preset '{}': skipping malformed effect entry: {}", preset_name, e);
                return None;
            }
        };

        let Some(mut node) = registry.create(&entry.type_id) else {
            log::warn!("Preset '{}': unknown effect type '{}'", preset_name, entry.type_id);
            return None;
        };

        node.set_id(entry.id);
        node.set_enabled(entry.enabled);
        if let Some(params) = entry.params.as_ref().and_then(Value::as_object) {
            node.load_params(params);
        }
        Some(node)
    }

    /// Serialize the preset and the chain's current nodes, in chain order
    pub fn to_json_string(preset: &Preset, chain: &EffectChain) -> Result<String, PresetError> {
        // Each node is locked only while its entry is copied out
        let effect_chain: Vec<NodeEntryOut> = chain
            .nodes()
            .iter()
            .map(|node| {
                let node = node.lock();
                NodeEntryOut {
                    id: node.id().to_string(),
                    type_id: node.type_id().to_string(),
                    enabled: node.is_enabled(),
                    params: node.save_params(),
                }
            })
            .collect();

        let extra = match &preset.raw {
            Value::Object(fields) => fields
                .iter()
                .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => Map::new(),
        };

        let document = PresetDocumentOut {
            preset_id: &preset.preset_id,
            format_version: &preset.format_version,
            name: &preset.name,
            routing_mode: &preset.routing_mode,
            output_eq: preset.output_eq,
            output_volume: preset.output_volume,
            effect_chain,
            extra,
        };

        serde_json::to_string_pretty(&document).map_err(PresetError::Serialize)
    }

    /// Write the preset to `path`
    ///
    /// A failed write may leave a partial file behind.
    pub fn save_to_file(
        path: impl AsRef<Path>,
        preset: &Preset,
        chain: &EffectChain,
    ) -> Result<(), PresetError> {
        let path = path.as_ref();
        let json = Self::to_json_string(preset, chain)?;
        fs::write(path, json).map_err(|source| {
            log::error!("PresetStore: cannot write '{}': {}", path.display(), source);
            PresetError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        log::info!("Saved preset '{}' to {}", preset.name, path.display());
        Ok(())
    }

    /// List `*.json` files in a directory, sorted by file stem
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn scan_directory(dir: impl AsRef<Path>) -> Vec<PresetEntry> {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("PresetStore: cannot scan '{}': {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut presets: Vec<PresetEntry> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some(PresetEntry { name, path })
            })
            .collect();
        presets.sort_by(|a, b| a.name.cmp(&b.name));
        presets
    }
}
