//! Background persistence for cart snapshots.
//!
//! Mutations publish the serialized cart into a watch channel and return
//! immediately. A single task drains the channel and writes the newest
//! snapshot, so writes land in mutation order and intermediate snapshots may
//! be skipped when the store is slower than the mutations.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error};

use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    generation: u64,
    payload: Option<String>,
}

/// Handle to the writer task. The task exits once this handle is dropped and
/// the last published snapshot has been written.
#[derive(Debug)]
pub(crate) struct PersistWriter {
    pending: watch::Sender<Snapshot>,
    written: watch::Receiver<u64>,
}

impl PersistWriter {
    /// Spawn the writer task for `key` on the current Tokio runtime.
    pub(crate) fn spawn<S: KeyValueStore>(storage: Arc<S>, key: String) -> Self {
        let (pending, mut rx) = watch::channel(Snapshot::default());
        let (written_tx, written) = watch::channel(0_u64);

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Snapshot {
                    generation,
                    payload,
                } = rx.borrow_and_update().clone();

                if let Some(payload) = payload {
                    match storage.set(&key, payload).await {
                        Ok(()) => debug!(key = %key, generation, "Cart persisted"),
                        Err(e) => error!(key = %key, generation, error = %e, "Failed to persist cart"),
                    }
                }
                written_tx.send_replace(generation);
            }
            debug!(key = %key, "Cart writer stopped");
        });

        Self { pending, written }
    }

    /// Queue `payload` as the next value to write.
    pub(crate) fn publish(&self, payload: String) {
        self.pending.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.payload = Some(payload);
        });
    }

    /// Wait until everything published so far has been attempted.
    pub(crate) async fn flush(&self) {
        let target = self.pending.borrow().generation;
        let mut written = self.written.clone();
        if written.wait_for(|&done| done >= target).await.is_err() {
            debug!(target, "Cart writer gone before flush completed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_flush_without_writes_returns() {
        let writer = PersistWriter::spawn(Arc::new(MemoryStore::new()), "k".to_string());
        writer.flush().await;
    }

    #[tokio::test]
    async fn test_last_published_value_wins() {
        let storage = MemoryStore::new();
        let writer = PersistWriter::spawn(Arc::new(storage.clone()), "k".to_string());

        for i in 0..50 {
            writer.publish(format!("v{i}"));
        }
        writer.flush().await;

        assert_eq!(storage.peek("k").as_deref(), Some("v49"));
    }

    #[tokio::test]
    async fn test_pending_write_survives_drop() {
        let storage = MemoryStore::new();
        let writer = PersistWriter::spawn(Arc::new(storage.clone()), "k".to_string());
        let mut written = writer.written.clone();

        writer.publish("final".to_string());
        drop(writer);

        // Sender side closes once the task exits after its last write.
        while written.changed().await.is_ok() {}
        assert_eq!(storage.peek("k").as_deref(), Some("final"));
    }
}
