use gearbox_fx::audio::{EffectChain, ParameterManager};
use gearbox_fx::effects::{EffectRegistry, ParamError};
use std::sync::Arc;

fn attached() -> (Arc<EffectChain>, ParameterManager) {
    let registry = EffectRegistry::with_builtin_effects();
    let chain = Arc::new(EffectChain::new());
    chain.prepare(48000.0, 256);
    for (type_id, id) in [
        ("gain.overdrive", "drive"),
        ("time.delay", "delay"),
        ("gain.clean_boost", "amp.left"),
    ] {
        chain.add_node(registry.create(type_id).expect("registered type").with_id(id));
    }

    let manager = ParameterManager::new();
    manager.attach_chain(&chain);
    (chain, manager)
}

#[test]
fn test_set_routes_to_node() {
    let (chain, manager) = attached();
    assert_eq!(manager.set("drive.gain", 0.9), Ok(()));

    let node = chain.find_node("drive").expect("drive node");
    assert_eq!(node.lock().get_param("gain"), Ok(0.9));
    assert_eq!(manager.get("drive.gain"), Some(0.9));
}

#[test]
fn test_cache_holds_clamped_value() {
    let (chain, manager) = attached();
    assert_eq!(manager.set("delay.feedback", 5.0), Ok(()));
    assert_eq!(manager.get("delay.feedback"), Some(0.99));
    assert_eq!(
        chain.find_node("delay").expect("delay node").lock().get_param("feedback"),
        Ok(0.99)
    );
}

#[test]
fn test_addressing_errors() {
    let (_chain, manager) = attached();
    assert_eq!(
        manager.set("reverb.mix", 0.5),
        Err(ParamError::UnknownEffect("reverb".to_string()))
    );
    assert_eq!(
        manager.set("drive.sparkle", 0.5),
        Err(ParamError::UnknownParam("sparkle".to_string()))
    );
    assert_eq!(
        manager.set("drive", 0.5),
        Err(ParamError::MalformedKey("drive".to_string()))
    );
    assert_eq!(manager.get("drive.sparkle"), None);
}

#[test]
fn test_dotted_effect_ids() {
    let (chain, manager) = attached();
    assert_eq!(manager.set("amp.left.gain_db", 3.0), Ok(()));
    assert_eq!(
        chain.find_node("amp.left").expect("boost node").lock().get_param("gain_db"),
        Ok(3.0)
    );
}

#[test]
fn test_get_is_empty_before_any_write() {
    let (_chain, manager) = attached();
    assert_eq!(manager.get("drive.gain"), None);
    assert!(manager.snapshot().is_empty());
}

#[test]
fn test_sync_picks_up_direct_node_edits() {
    let (chain, manager) = attached();
    chain
        .find_node("delay")
        .expect("delay node")
        .lock()
        .set_param("time_ms", 750.0);
    assert_eq!(manager.get("delay.time_ms"), None);

    manager.sync_from_chain();
    assert_eq!(manager.get("delay.time_ms"), Some(750.0));
    assert_eq!(manager.get("drive.level"), Some(0.7));
    assert_eq!(manager.get("amp.left.gain_db"), Some(0.0));
    // overdrive 3 + delay 5 + boost 1
    assert_eq!(manager.snapshot().len(), 9);
}

#[test]
fn test_sync_drops_removed_nodes() {
    let (chain, manager) = attached();
    manager.sync_from_chain();
    assert!(manager.get("drive.tone").is_some());

    assert!(chain.remove_node("drive"));
    manager.sync_from_chain();
    assert_eq!(manager.get("drive.tone"), None);
}

#[test]
fn test_dropped_chain_detaches_manager() {
    let (chain, manager) = attached();
    assert_eq!(manager.set("drive.gain", 0.2), Ok(()));

    drop(chain);
    assert_eq!(manager.set("drive.gain", 0.3), Err(ParamError::Unattached));

    manager.sync_from_chain();
    assert_eq!(manager.get("drive.gain"), None);
}

#[test]
fn test_reattach_routes_to_new_chain() {
    let (_old, manager) = attached();
    let (new_chain, _) = attached();
    manager.attach_chain(&new_chain);

    assert_eq!(manager.set("drive.tone", 0.1), Ok(()));
    assert_eq!(
        new_chain.find_node("drive").expect("drive node").lock().get_param("tone"),
        Ok(0.1)
    );
}
