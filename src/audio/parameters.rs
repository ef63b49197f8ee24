use crate::audio::chain::EffectChain;
use crate::effects::ParamError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Split `"<effect id>.<param>"` at the last dot
///
/// Effect ids may contain dots; parameter names never do.
pub fn parse_key(key: &str) -> Result<(&str, &str), ParamError> {
    match key.rsplit_once('.') {
        Some((effect_id, param)) if !effect_id.is_empty() && !param.is_empty() => {
            Ok((effect_id, param))
        }
        _ => Err(ParamError::MalformedKey(key.to_string())),
    }
}

/// String-keyed parameter access routed into an attached chain
///
/// Keeps a cache of the last value written through it per key. The cache is
/// not refreshed by edits made directly on nodes; call
/// [`ParameterManager::sync_from_chain`] after such edits or structural changes.
#[derive(Default)]
pub struct ParameterManager {
    chain: RwLock<Weak<EffectChain>>,
    cache: Mutex<HashMap<String, f32>>,
}

impl ParameterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route future edits to `chain` without taking ownership of it
    pub fn attach_chain(&self, chain: &Arc<EffectChain>) {
        *self.chain.write() = Arc::downgrade(chain);
    }

    /// Clamp and apply a value to the addressed node
    ///
    /// The cache records the value the node actually stored after clamping.
    pub fn set(&self, key: &str, value: f32) -> Result<(), ParamError> {
        let chain = self.chain.read().upgrade().ok_or(ParamError::Unattached)?;
        let (effect_id, param) = parse_key(key)?;
        let node = chain
            .find_node(effect_id)
            .ok_or_else(|| ParamError::UnknownEffect(effect_id.to_string()))?;

        let stored = {
            let mut node = node.lock();
            if !node.set_param(param, value) {
                return Err(ParamError::UnknownParam(param.to_string()));
            }
            node.get_param(param)?
        };

        self.cache.lock().insert(key.to_string(), stored);
        Ok(())
    }

    /// Last value written through this manager, or gathered by a sync
    pub fn get(&self, key: &str) -> Option<f32> {
        self.cache.lock().get(key).copied()
    }

    /// Rebuild the cache from every node's current values
    ///
    /// With duplicate node ids the later node wins.
    pub fn sync_from_chain(&self) {
        let Some(chain) = self.chain.read().upgrade() else {
            self.cache.lock().clear();
            return;
        };

        let mut values = HashMap::new();
        for node in chain.nodes() {
            let node = node.lock();
            for (def, value) in node.params().iter() {
                values.insert(format!("{}.{}", node.id(), def.name), value);
            }
        }

        *self.cache.lock() = values;
    }

    /// Copy of the whole cache
    pub fn snapshot(&self) -> HashMap<String, f32> {
        self.cache.lock().clone()
    }
}
