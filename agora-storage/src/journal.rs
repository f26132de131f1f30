use borsh::BorshDeserialize;

use agora_engine::engine::EngineSnapshot;
use agora_types::primitives::Sequence;
use agora_types::transition::Transition;

use crate::error::StorageError;
use crate::traits::KvStore;

const TRANSITION_PREFIX: &[u8] = b"journal:transition:";
const SNAPSHOT_KEY: &[u8] = b"engine:snapshot";
const SCHEMA_KEY: &[u8] = b"journal:schema";

/// Bumped whenever the encoding of persisted transitions or snapshots
/// changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Persistence layer for the engine: an append-only journal of accepted
/// transitions keyed by sequence number, plus a periodic full snapshot.
/// Recovery loads the snapshot and replays journal entries past it.
pub struct JournalStore<S: KvStore> {
    store: S,
}

impl<S: KvStore> JournalStore<S> {
    /// Wrap a KvStore, stamping the schema version on first use and
    /// refusing to open a store written by an incompatible version.
    pub fn new(store: S) -> Result<Self, StorageError> {
        match store.get(SCHEMA_KEY)? {
            Some(bytes) => {
                let raw: [u8; 4] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| StorageError::DeserializationError {
                            reason: "schema version is not 4 bytes".to_string(),
                        })?;
                let found = u32::from_be_bytes(raw);
                if found != SCHEMA_VERSION {
                    return Err(StorageError::SchemaMismatch {
                        found,
                        expected: SCHEMA_VERSION,
                    });
                }
            }
            None => {
                store.put(SCHEMA_KEY, &SCHEMA_VERSION.to_be_bytes())?;
            }
        }
        Ok(Self { store })
    }

    /// Record one accepted transition under its sequence number.
    pub fn append_transition(
        &self,
        sequence: Sequence,
        transition: &Transition,
    ) -> Result<(), StorageError> {
        let value =
            borsh::to_vec(transition).map_err(|e| StorageError::SerializationError {
                reason: e.to_string(),
            })?;
        self.store.put(&transition_key(sequence), &value)
    }

    /// Load all journaled transitions with sequence >= `from`, in order.
    pub fn load_transitions_from(
        &self,
        from: Sequence,
    ) -> Result<Vec<(Sequence, Transition)>, StorageError> {
        let mut entries = Vec::new();
        for (key, value) in self.store.prefix_scan(TRANSITION_PREFIX)? {
            let sequence = decode_sequence(&key)?;
            if sequence < from {
                continue;
            }
            let transition = Transition::try_from_slice(&value).map_err(|e| {
                StorageError::DeserializationError {
                    reason: e.to_string(),
                }
            })?;
            entries.push((sequence, transition));
        }
        Ok(entries)
    }

    /// The highest journaled sequence number, if any.
    pub fn latest_sequence(&self) -> Result<Option<Sequence>, StorageError> {
        let entries = self.store.prefix_scan(TRANSITION_PREFIX)?;
        match entries.last() {
            Some((key, _)) => Ok(Some(decode_sequence(key)?)),
            None => Ok(None),
        }
    }

    /// Drop journal entries with sequence <= `through`. Called after a
    /// snapshot covering them has been persisted.
    pub fn prune_transitions_through(&self, through: Sequence) -> Result<usize, StorageError> {
        let mut pruned = 0;
        for (key, _) in self.store.prefix_scan(TRANSITION_PREFIX)? {
            if decode_sequence(&key)? <= through {
                self.store.delete(&key)?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    /// Persist a full engine snapshot, replacing any previous one.
    pub fn save_snapshot(&self, snapshot: &EngineSnapshot) -> Result<(), StorageError> {
        let value = borsh::to_vec(snapshot).map_err(|e| StorageError::SerializationError {
            reason: e.to_string(),
        })?;
        self.store.put(SNAPSHOT_KEY, &value)
    }

    /// Load the persisted engine snapshot.
    pub fn load_snapshot(&self) -> Result<Option<EngineSnapshot>, StorageError> {
        match self.store.get(SNAPSHOT_KEY)? {
            Some(bytes) => {
                let snapshot = EngineSnapshot::try_from_slice(&bytes).map_err(|e| {
                    StorageError::DeserializationError {
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}

fn transition_key(sequence: Sequence) -> Vec<u8> {
    // Big-endian sequence bytes keep the scan in numeric order.
    let mut key = Vec::with_capacity(TRANSITION_PREFIX.len() + std::mem::size_of::<u64>());
    key.extend_from_slice(TRANSITION_PREFIX);
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

fn decode_sequence(key: &[u8]) -> Result<Sequence, StorageError> {
    let raw: [u8; 8] = key[TRANSITION_PREFIX.len()..].try_into().map_err(|_| {
        StorageError::DeserializationError {
            reason: "journal key does not end in 8 sequence bytes".to_string(),
        }
    })?;
    Ok(Sequence::from_be_bytes(raw))
}
