use crate::audio::buffer::{AudioBuffer, AudioBufferView, AudioBufferViewMut, MAX_CHANNELS};
use crate::effects::effect_trait::FALLBACK_SAMPLE_RATE;
use crate::effects::EffectNode;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Reference-counted node handle
///
/// A control surface may keep one across structural edits; a removed node
/// simply stops being processed.
pub type SharedNode = Arc<Mutex<EffectNode>>;

struct ChainState {
    nodes: Vec<SharedNode>,
    sample_rate: f32,
    max_block_size: usize,
}

struct ScratchBuffers {
    ping: AudioBuffer,
    pong: AudioBuffer,
}

/// Ordered effect nodes processed in series through two scratch buffers
///
/// Structural edits take the write lock. The audio thread only ever
/// *tries* to take the read lock and the scratch lock; when either is
/// contended it outputs silence for that block instead of waiting.
pub struct EffectChain {
    state: RwLock<ChainState>,
    scratch: Mutex<ScratchBuffers>,
}

impl EffectChain {
    /// Create an empty, unprepared chain
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ChainState {
                nodes: Vec::new(),
                sample_rate: FALLBACK_SAMPLE_RATE,
                max_block_size: 0,
            }),
            scratch: Mutex::new(ScratchBuffers {
                ping: AudioBuffer::default(),
                pong: AudioBuffer::default(),
            }),
        }
    }

    /// Size the scratch buffers and prepare every node
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `max_block_size` - Largest block `process` will be asked for
    pub fn prepare(&self, sample_rate: f32, max_block_size: usize) {
        let mut state = self.state.write();
        state.sample_rate = sample_rate;
        state.max_block_size = max_block_size;

        {
            let mut scratch = self.scratch.lock();
            scratch.ping.resize(MAX_CHANNELS, max_block_size);
            scratch.pong.resize(MAX_CHANNELS, max_block_size);
        }

        for node in &state.nodes {
            node.lock().prepare(sample_rate, max_block_size);
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.state.read().sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.state.read().max_block_size
    }

    /// Prepare and append a node
    ///
    /// # Returns
    /// Shared handle to the node now owned by the chain
    pub fn add_node(&self, node: EffectNode) -> SharedNode {
        let mut state = self.state.write();
        let shared = Self::adopt(&state, node);
        log::debug!("Chain: added '{}'", shared.lock().id());
        state.nodes.push(Arc::clone(&shared));
        shared
    }

    /// Prepare and insert a node, clamping `index` into `[0, len]`
    pub fn insert_node(&self, index: usize, node: EffectNode) -> SharedNode {
        let mut state = self.state.write();
        let index = index.min(state.nodes.len());
        let shared = Self::adopt(&state, node);
        log::debug!("Chain: inserted '{}' at {}", shared.lock().id(), index);
        state.nodes.insert(index, Arc::clone(&shared));
        shared
    }

    /// Remove the first node with this id and reset it
    ///
    /// # Returns
    /// `false` if no node has this id
    pub fn remove_node(&self, id: &str) -> bool {
        let mut state = self.state.write();
        match Self::position(&state.nodes, id) {
            Some(index) => {
                let removed = state.nodes.remove(index);
                removed.lock().reset();
                log::debug!("Chain: removed '{}'", id);
                true
            }
            None => false,
        }
    }

    /// Swap the first node with this id for `node`
    ///
    /// The outgoing node is reset, the incoming one prepared.
    pub fn replace_node(&self, id: &str, node: EffectNode) -> bool {
        let mut state = self.state.write();
        match Self::position(&state.nodes, id) {
            Some(index) => {
                let shared = Self::adopt(&state, node);
                let old = std::mem::replace(&mut state.nodes[index], shared);
                old.lock().reset();
                log::debug!("Chain: replaced '{}'", id);
                true
            }
            None => false,
        }
    }

    /// Move the first node with this id to `new_index`, clamped to the chain
    ///
    /// The node keeps its state.
    pub fn move_node(&self, id: &str, new_index: usize) -> bool {
        let mut state = self.state.write();
        match Self::position(&state.nodes, id) {
            Some(index) => {
                let node = state.nodes.remove(index);
                let new_index = new_index.min(state.nodes.len());
                state.nodes.insert(new_index, node);
                log::debug!("Chain: moved '{}' from {} to {}", id, index, new_index);
                true
            }
            None => false,
        }
    }

    /// First node with this id
    pub fn find_node(&self, id: &str) -> Option<SharedNode> {
        let state = self.state.read();
        Self::position(&state.nodes, id).map(|index| Arc::clone(&state.nodes[index]))
    }

    /// Snapshot of the node handles in signal-flow order
    pub fn nodes(&self) -> Vec<SharedNode> {
        self.state.read().nodes.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    /// Reset and drop every node
    pub fn clear(&self) {
        let mut state = self.state.write();
        for node in state.nodes.drain(..) {
            node.lock().reset();
        }
    }

    /// Replace the whole node list in one structural edit
    ///
    /// Outgoing nodes are reset; incoming nodes are prepared at the chain's
    /// configuration.
    pub fn replace_all(&self, nodes: Vec<EffectNode>) {
        let mut state = self.state.write();
        for node in state.nodes.drain(..) {
            node.lock().reset();
        }
        let adopted: Vec<SharedNode> = nodes.into_iter().map(|node| Self::adopt(&state, node)).collect();
        state.nodes = adopted;
    }

    /// Run one block through the chain
    ///
    /// An empty chain copies input to output. Otherwise the input is copied
    /// into scratch, each enabled node processes scratch A into scratch B (a
    /// disabled node is a plain copy), the roles swap, and the last result is
    /// copied out.
    ///
    /// Outputs silence, without waiting, if a structural edit holds the chain,
    /// if `num_samples` exceeds the prepared block size, or if there are more
    /// than `MAX_CHANNELS` channels.
    pub fn process(
        &self,
        input: AudioBufferView<'_>,
        output: &mut AudioBufferViewMut<'_>,
        num_samples: usize,
    ) {
        // Never block the audio thread on a structural edit; drop the block instead
        let Some(state) = self.state.try_read() else {
            output.clear();
            return;
        };

        if state.nodes.is_empty() {
            output.copy_from(&input, num_samples);
            return;
        }

        let Some(mut scratch) = self.scratch.try_lock() else {
            output.clear();
            return;
        };

        let channels = input.num_channels().min(output.num_channels());
        if channels > MAX_CHANNELS || num_samples > scratch.ping.num_samples() {
            output.clear();
            return;
        }

        let ScratchBuffers { ping, pong } = &mut *scratch;
        let mut src = ping;
        let mut dst = pong;
        src.view_prefix_mut(channels, num_samples).copy_from(&input, num_samples);

        for node in &state.nodes {
            let mut node = node.lock();
            let source = src.view_prefix(channels, num_samples);
            let mut dest = dst.view_prefix_mut(channels, num_samples);
            if node.is_enabled() {
                node.process(source, &mut dest, num_samples);
            } else {
                dest.copy_from(&source, num_samples);
            }
            std::mem::swap(&mut src, &mut dst);
        }

        output.copy_from(&src.view_prefix(channels, num_samples), num_samples);
    }

    fn adopt(state: &ChainState, mut node: EffectNode) -> SharedNode {
        node.prepare(state.sample_rate, state.max_block_size);
        Arc::new(Mutex::new(node))
    }

    fn position(nodes: &[SharedNode], id: &str) -> Option<usize> {
        nodes.iter().position(|node| node.lock().id() == id)
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectRegistry;

    fn node(registry: &EffectRegistry, type_id: &str, id: &str) -> EffectNode {
        registry.create(type_id).expect("registered type").with_id(id)
    }

    fn ids(chain: &EffectChain) -> Vec<String> {
        chain.nodes().iter().map(|n| n.lock().id().to_string()).collect()
    }

    #[test]
    fn insert_clamps_and_move_reorders() {
        let registry = EffectRegistry::with_builtin_effects();
        let chain = EffectChain::new();
        chain.prepare(48000.0, 64);
        chain.add_node(node(&registry, "gain.clean_boost", "a"));
        chain.insert_node(99, node(&registry, "gain.overdrive", "b"));
        chain.insert_node(0, node(&registry, "time.delay", "c"));
        assert_eq!(ids(&chain), vec!["c", "a", "b"]);

        assert!(chain.move_node("c", 10));
        assert_eq!(ids(&chain), vec!["a", "b", "c"]);
        assert!(!chain.move_node("missing", 0));
    }

    #[test]
    fn oversized_block_outputs_silence() {
        let registry = EffectRegistry::with_builtin_effects();
        let chain = EffectChain::new();
        chain.prepare(48000.0, 16);
        chain.add_node(node(&registry, "gain.clean_boost", "boost"));

        let input = AudioBuffer::from_channels(&[vec![0.5; 32]]);
        let mut output = AudioBuffer::from_channels(&[vec![1.0; 32]]);
        chain.process(input.view(), &mut output.view_mut(), 32);
        assert!(output.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn held_write_lock_outputs_silence() {
        let registry = EffectRegistry::with_builtin_effects();
        let chain = EffectChain::new();
        chain.prepare(48000.0, 16);
        chain.add_node(node(&registry, "gain.clean_boost", "boost"));

        let input = AudioBuffer::from_channels(&[vec![0.5; 16]]);
        let mut output = AudioBuffer::from_channels(&[vec![1.0; 16]]);
        let guard = chain.state.write();
        chain.process(input.view(), &mut output.view_mut(), 16);
        drop(guard);
        assert!(output.channel(0).iter().all(|&s| s == 0.0));

        chain.process(input.view(), &mut output.view_mut(), 16);
        assert!(output.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }
}
