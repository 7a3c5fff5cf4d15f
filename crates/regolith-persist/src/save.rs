//! Snapshot envelope, save/load, and the autosave policy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use regolith_sim::{InteractionState, SimState};
use regolith_voxel::{ChunkMeshDiff, MeshDiffKind, push_mesh_diff};

use crate::migrate::migrate_state;
use crate::store::{KeyValueStore, StoreError};

/// Version written by [`save_sim`] and [`export_snapshot`].
pub const CURRENT_VERSION: u32 = 4;

/// Errors from saving. Loading never errors on content; a bad payload loads
/// as `None`.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Failed to serialize the snapshot to JSON.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The backing store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The on-disk envelope: a version tag around an opaque state payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    /// Wall-clock label supplied by the driver; the core never reads a clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub state: Value,
}

/// Strips transient per-session data before serialization.
///
/// Dev flags, dirty flags, pending mesh diffs, and the interaction target are
/// all recomputed or re-granted at runtime and never persist.
pub fn sanitize_state(mut state: SimState) -> SimState {
    state.player.dev_creative = false;
    state.player.dev_fly = false;
    state.player.dev_noclip = false;
    state.world.mesh_diffs.clear();
    for chunk in state.world.chunks.values_mut() {
        chunk.dirty = false;
    }
    state.interaction = InteractionState::default();
    state
}

/// Prepares a freshly loaded state for the renderer: every visible chunk is
/// re-dirtied and queued for a mesh rebuild.
pub fn rehydrate_state(mut state: SimState) -> SimState {
    state.world.mesh_diffs.clear();
    let visible = state.world.visible_chunk_keys.clone();
    for id in visible {
        if let Some(chunk) = state.world.chunks.get_mut(&id) {
            chunk.dirty = true;
            push_mesh_diff(
                &mut state.world.mesh_diffs,
                ChunkMeshDiff {
                    chunk_id: id,
                    kind: MeshDiffKind::Rebuild,
                },
            );
        }
    }
    state
}

/// Serializes a sanitized snapshot of the state to a JSON string.
pub fn export_snapshot(state: &SimState, created_at: Option<&str>) -> Result<String, PersistError> {
    let clean = sanitize_state(state.clone());
    let snapshot = Snapshot {
        version: CURRENT_VERSION,
        created_at: created_at.map(str::to_owned),
        state: serde_json::to_value(&clean).map_err(PersistError::Encode)?,
    };
    serde_json::to_string(&snapshot).map_err(PersistError::Encode)
}

/// Parses a snapshot string of any known version into a ready-to-run state.
pub fn import_snapshot(text: &str) -> Option<SimState> {
    let snapshot: Snapshot = match serde_json::from_str(text) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            log::warn!("snapshot rejected: {err}");
            return None;
        }
    };
    migrate_state(snapshot.version, snapshot.state).map(rehydrate_state)
}

/// Writes a sanitized snapshot under `key`.
pub fn save_sim(
    store: &mut dyn KeyValueStore,
    key: &str,
    state: &SimState,
    created_at: Option<&str>,
) -> Result<(), PersistError> {
    let text = export_snapshot(state, created_at)?;
    store.set(key, &text)?;
    log::debug!("saved {key} at tick {}", state.tick);
    Ok(())
}

/// Loads and migrates the snapshot under `key`.
///
/// `Ok(None)` covers both a missing key and an unreadable payload; only a
/// store-level read failure is an error.
pub fn load_sim(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<SimState>, PersistError> {
    match store.get(key)? {
        Some(text) => Ok(import_snapshot(&text)),
        None => Ok(None),
    }
}

/// Saves when the tick lands on the autosave interval.
///
/// Failures are logged and swallowed; a full or broken store must never stop
/// the simulation. Returns whether a save was written.
pub fn autosave(
    store: &mut dyn KeyValueStore,
    key: &str,
    state: &SimState,
    interval_ticks: u64,
) -> bool {
    if interval_ticks == 0 || state.tick == 0 || state.tick % interval_ticks != 0 {
        return false;
    }
    match save_sim(store, key, state, None) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("autosave failed: {err}");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use regolith_sim::create_initial_state;

    fn dirty_state() -> SimState {
        let mut state = create_initial_state(1337);
        state.player.dev_creative = true;
        state.player.dev_fly = true;
        state
    }

    #[test]
    fn test_sanitize_strips_session_data() {
        let clean = sanitize_state(dirty_state());
        assert!(!clean.player.dev_creative);
        assert!(!clean.player.dev_fly);
        assert!(clean.world.mesh_diffs.is_empty());
        assert!(clean.world.chunks.values().all(|c| !c.dirty));
        assert_eq!(clean.interaction, InteractionState::default());
    }

    #[test]
    fn test_rehydrate_queues_rebuild_for_every_visible_chunk() {
        let state = rehydrate_state(sanitize_state(create_initial_state(1337)));
        assert_eq!(
            state.world.mesh_diffs.len(),
            state.world.visible_chunk_keys.len()
        );
        assert!(
            state
                .world
                .mesh_diffs
                .iter()
                .all(|d| d.kind == MeshDiffKind::Rebuild)
        );
        for id in &state.world.visible_chunk_keys {
            assert!(state.world.chunks[id].dirty);
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = MemoryStore::default();
        let state = dirty_state();
        save_sim(&mut store, "slot-1", &state, Some("2026-08-23T12:00:00Z")).unwrap();

        let loaded = load_sim(&store, "slot-1").unwrap().expect("state loads");
        // Load == sanitize + rehydrate of what was saved.
        assert_eq!(loaded, rehydrate_state(sanitize_state(state)));
    }

    #[test]
    fn test_load_missing_key_is_none() {
        let store = MemoryStore::default();
        assert!(load_sim(&store, "nothing").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_payload_loads_as_none() {
        let mut store = MemoryStore::default();
        store.set("slot-1", "not json at all").unwrap();
        assert!(load_sim(&store, "slot-1").unwrap().is_none());

        store.set("slot-1", "{\"version\": 73, \"state\": {}}").unwrap();
        assert!(load_sim(&store, "slot-1").unwrap().is_none());
    }

    #[test]
    fn test_export_import_matches_save_load() {
        let state = create_initial_state(7);
        let text = export_snapshot(&state, None).unwrap();
        let imported = import_snapshot(&text).expect("imports");

        let mut store = MemoryStore::default();
        save_sim(&mut store, "slot-1", &state, None).unwrap();
        let loaded = load_sim(&store, "slot-1").unwrap().unwrap();
        assert_eq!(imported, loaded);
    }

    #[test]
    fn test_autosave_cadence() {
        let mut store = MemoryStore::default();
        let mut state = create_initial_state(1);

        state.tick = 0;
        assert!(!autosave(&mut store, "auto", &state, 300));
        state.tick = 299;
        assert!(!autosave(&mut store, "auto", &state, 300));
        state.tick = 300;
        assert!(autosave(&mut store, "auto", &state, 300));
        assert!(load_sim(&store, "auto").unwrap().is_some());
        // Interval 0 disables autosave entirely.
        assert!(!autosave(&mut store, "auto", &state, 0));
    }

    #[test]
    fn test_autosave_swallows_store_failure() {
        struct FailingStore;
        impl KeyValueStore for FailingStore {
            fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Ok(None)
            }
            fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::WriteError(std::io::Error::other("quota")))
            }
            fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let mut store = FailingStore;
        let mut state = create_initial_state(1);
        state.tick = 300;
        assert!(!autosave(&mut store, "auto", &state, 300));
    }
}
