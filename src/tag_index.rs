//! # Tag Index Module
//!
//! Maps a tag to the ordered list of stickers filed under it. Tags are
//! normalized to Unicode NFC before every read or write, so canonically
//! equivalent spellings share one entry. No trimming or case folding is done.
//!
//! Entries are stored as a JSON array of sticker identifiers. The encoding
//! escapes every character, so identifiers containing commas, quotes or any
//! other separator round-trip unchanged.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use unicode_normalization::UnicodeNormalization;

use crate::db::TagStore;
use crate::errors::StoreError;

/// Opaque sticker identifier issued by Telegram
pub type StickerRef = String;

/// Normalize a tag to its NFC form
pub fn normalize_tag(tag: &str) -> String {
    tag.nfc().collect()
}

/// Persisted value of a tag: stickers in insertion order, without duplicates
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagEntry {
    stickers: Vec<StickerRef>,
}

impl TagEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stickers(&self) -> &[StickerRef] {
        &self.stickers
    }

    pub fn into_stickers(self) -> Vec<StickerRef> {
        self.stickers
    }

    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    pub fn contains(&self, sticker: &str) -> bool {
        self.stickers.iter().any(|s| s == sticker)
    }

    /// Append `sticker` unless an identical identifier is already present.
    ///
    /// Returns `true` if the entry changed.
    pub fn push_unique(&mut self, sticker: StickerRef) -> bool {
        if self.contains(&sticker) {
            return false;
        }
        self.stickers.push(sticker);
        true
    }

    /// Serialize the entry for the store
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize a stored entry. Empty input decodes as an empty entry.
    pub fn decode(tag: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|e| StoreError::CorruptEntry {
            tag: tag.to_string(),
            reason: e.to_string(),
        })
    }
}

impl From<Vec<StickerRef>> for TagEntry {
    fn from(stickers: Vec<StickerRef>) -> Self {
        let mut entry = TagEntry::new();
        for sticker in stickers {
            entry.push_unique(sticker);
        }
        entry
    }
}

/// Tag index engine. The only component that mutates the tag store.
#[derive(Clone)]
pub struct TagIndex {
    store: Arc<dyn TagStore>,
}

impl TagIndex {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// File `sticker` under `tag`.
    ///
    /// Runs as one store transaction: read the entry, append the sticker if it
    /// is not already there, write it back. Adding a sticker twice leaves a
    /// single occurrence. Returns `false` when the sticker was already filed
    /// under the tag and nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the transaction fails or the stored entry is
    /// corrupt. Nothing is written in that case.
    pub async fn add_sticker(&self, tag: &str, sticker: &str) -> Result<bool, StoreError> {
        let key = normalize_tag(tag);
        let entry_tag = key.clone();
        let sticker = sticker.to_string();

        let result = self
            .store
            .update(
                &key,
                Box::new(
                    move |current: Option<&[u8]>| -> Result<Option<Vec<u8>>, StoreError> {
                        let mut entry = match current {
                            Some(bytes) => TagEntry::decode(&entry_tag, bytes)?,
                            None => TagEntry::new(),
                        };
                        if !entry.push_unique(sticker) {
                            return Ok(None);
                        }
                        entry.encode().map(Some)
                    },
                ),
            )
            .await;

        match &result {
            Ok(true) => info!(tag = %key, "Sticker added to tag"),
            Ok(false) => debug!(tag = %key, "Sticker already filed under tag"),
            Err(e) => error!(tag = %key, error = %e, kind = e.kind(), "Failed to add sticker to tag"),
        }
        result
    }

    /// Remove `tag` and every sticker filed under it. Deleting an unknown tag succeeds.
    pub async fn delete_tag(&self, tag: &str) -> Result<(), StoreError> {
        let key = normalize_tag(tag);
        let result = self.store.delete(&key).await;

        match &result {
            Ok(()) => info!(tag = %key, "Tag deleted"),
            Err(e) => error!(tag = %key, error = %e, kind = e.kind(), "Failed to delete tag"),
        }
        result
    }

    /// Stickers filed under `tag` in insertion order.
    ///
    /// An unknown tag yields an empty list; only store failures are errors.
    pub async fn lookup(&self, tag: &str) -> Result<Vec<StickerRef>, StoreError> {
        let key = normalize_tag(tag);
        let result = match self.store.get(&key).await {
            Ok(Some(bytes)) => TagEntry::decode(&key, &bytes).map(TagEntry::into_stickers),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        match &result {
            Ok(stickers) => debug!(tag = %key, results = stickers.len(), "Tag lookup completed"),
            Err(e) => error!(tag = %key, error = %e, kind = e.kind(), "Failed to look up tag"),
        }
        result
    }
}
