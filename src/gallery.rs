//! Gallery list state: one owned mapping fed by two producers.
//!
//! The polled list fetch and the live notification channel both write
//! into an [`ImageIndex`], merging by asset id with last-write-wins per
//! field. Neither producer assumes anything about the other's ordering
//! or delivery guarantees: a notification may arrive for an asset the
//! list has not shown yet, and a poll may repeat state a notification
//! already applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::cancel::CancelToken;
use crate::client::{ApiClient, ImageMeta, ImageRecord, ImageStatus};
use crate::notify::StatusUpdate;

/// Owned mapping of asset id to the latest known record.
#[derive(Debug, Default)]
pub struct ImageIndex {
    entries: HashMap<i64, ImageRecord>,
}

impl ImageIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a polled list snapshot. Records present in the snapshot
    /// replace the stored ones wholesale; entries the snapshot does not
    /// mention are kept (the backend offers no delete operation, so
    /// absence means "not in this page of truth", not removal).
    pub fn sync_list(&mut self, records: Vec<ImageRecord>) {
        for record in records {
            self.entries.insert(record.id, record);
        }
    }

    /// Merge one out-of-band status update by id.
    ///
    /// Known assets get the new status and a field-wise meta merge; an
    /// unknown id inserts a placeholder record that the next list poll
    /// fills in.
    pub fn apply_update(&mut self, update: &StatusUpdate) {
        match self.entries.get_mut(&update.id) {
            Some(record) => {
                record.status = update.status;
                if let Some(incoming) = &update.meta {
                    merge_meta(&mut record.meta, incoming);
                }
            }
            None => {
                self.entries.insert(
                    update.id,
                    ImageRecord {
                        id: update.id,
                        filename: String::new(),
                        original_name: None,
                        status: update.status,
                        thumbnail_url: None,
                        meta: update.meta.clone(),
                    },
                );
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&ImageRecord> {
        self.entries.get(&id)
    }

    /// Records ordered by id for stable display.
    #[must_use]
    pub fn records(&self) -> Vec<&ImageRecord> {
        let mut records: Vec<&ImageRecord> = self.entries.values().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids still waiting on the processing pipeline.
    #[must_use]
    pub fn unfinished(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .entries
            .values()
            .filter(|r| {
                matches!(r.status, ImageStatus::Pending | ImageStatus::Processing)
            })
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Field-wise last-write-wins merge of incoming meta into the stored
/// record: present fields overwrite, absent fields keep their value.
fn merge_meta(existing: &mut Option<ImageMeta>, incoming: &ImageMeta) {
    let merged = existing.get_or_insert_with(ImageMeta::default);
    if incoming.bounds.is_some() {
        merged.bounds = incoming.bounds;
    }
    if incoming.thumbnail_url.is_some() {
        merged.thumbnail_url = incoming.thumbnail_url.clone();
    }
    for (key, value) in &incoming.extra {
        merged.extra.insert(key.clone(), value.clone());
    }
}

/// Poll the list endpoint on the configured interval until cancelled.
///
/// Fetch failures are logged and the prior index state stays visible; a
/// transient blip never blanks the gallery.
pub async fn run_poll_loop(client: ApiClient, index: Arc<Mutex<ImageIndex>>, token: CancelToken) {
    let mut ticker = tokio::time::interval(client.config().poll_interval);
    loop {
        ticker.tick().await;
        if token.is_cancelled() {
            break;
        }
        match client.list_images().await {
            Ok(records) => {
                if token.is_cancelled() {
                    break;
                }
                index.lock().unwrap().sync_list(records);
            }
            Err(e) => {
                warn!(error = %e, "image list poll failed; keeping previous state");
            }
        }
    }
}

/// Drain the notification channel into the index until it closes or the
/// token cancels.
pub async fn run_notification_loop(
    mut channel: crate::notify::NotificationChannel,
    index: Arc<Mutex<ImageIndex>>,
    token: CancelToken,
) {
    while let Some(update) = channel.recv().await {
        if token.is_cancelled() {
            break;
        }
        index.lock().unwrap().apply_update(&update);
    }
}
