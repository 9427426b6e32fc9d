//! In-memory media for the lifetime of the process.
//!
//! Uploaded form images and downloaded videos are kept here and served from
//! `/media/{id}`. Removing an entry revokes its preview URL.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type MediaId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Upload,
    Video,
}

#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub id: MediaId,
    pub kind: MediaKind,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<Vec<u8>>,
    pub etag: String,
    pub created_at: DateTime<Utc>,
}

impl MediaEntry {
    pub fn preview_url(&self) -> String {
        preview_url(&self.id)
    }
}

/// Uploaded file with its preview URL, as returned to the form.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub id: MediaId,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
    pub preview_url: String,
}

impl From<&MediaEntry> for UploadedImage {
    fn from(entry: &MediaEntry) -> Self {
        Self {
            id: entry.id.clone(),
            file_name: entry.file_name.clone(),
            mime_type: entry.mime_type.clone(),
            size: entry.bytes.len(),
            preview_url: entry.preview_url(),
        }
    }
}

pub fn preview_url(id: &str) -> String {
    format!("/media/{}", id)
}

#[derive(Default)]
pub struct MediaStore {
    entries: RwLock<HashMap<MediaId, MediaEntry>>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        kind: MediaKind,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> MediaEntry {
        let entry = MediaEntry {
            id: Uuid::new_v4().to_string(),
            kind,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            etag: hex::encode(Sha256::digest(&bytes)),
            bytes: Arc::new(bytes),
            created_at: Utc::now(),
        };

        self.entries
            .write()
            .await
            .insert(entry.id.clone(), entry.clone());
        tracing::debug!("📁 Stored {:?} media {} ({} bytes)", kind, entry.id, entry.bytes.len());
        entry
    }

    pub async fn get(&self, id: &str) -> Option<MediaEntry> {
        self.entries.read().await.get(id).cloned()
    }

    /// Remove an entry; its preview URL stops resolving. Returns false if it was already gone.
    pub async fn revoke(&self, id: &str) -> bool {
        let removed = self.entries.write().await.remove(id).is_some();
        if removed {
            tracing::debug!("🗑️ Revoked media {}", id);
        }
        removed
    }

    /// Drop entries of `kind` stored before `cutoff`. Returns how many were removed.
    pub async fn prune_before(&self, kind: MediaKind, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.kind != kind || entry.created_at >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("🗑️ Pruned {} stale {:?} media", removed, kind);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// MIME type for an image upload, from the declared content type or the file extension.
pub fn image_mime_type(file_name: &str, declared: Option<&str>) -> Option<String> {
    if let Some(declared) = declared.filter(|d| d.starts_with("image/")) {
        return Some(declared.to_string());
    }

    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mime_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoke_releases_preview() {
        let store = MediaStore::new();
        let entry = store
            .insert(MediaKind::Upload, "pack.png", "image/png", vec![1, 2, 3])
            .await;

        assert_eq!(entry.preview_url(), format!("/media/{}", entry.id));
        assert!(store.get(&entry.id).await.is_some());

        assert!(store.revoke(&entry.id).await);
        assert!(store.get(&entry.id).await.is_none());
        assert!(!store.revoke(&entry.id).await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_prune_only_touches_stale_entries_of_kind() {
        let store = MediaStore::new();
        let upload = store.insert(MediaKind::Upload, "a.png", "image/png", vec![1]).await;
        let video = store.insert(MediaKind::Video, "a.mp4", "video/mp4", vec![2]).await;

        assert_eq!(store.prune_before(MediaKind::Upload, upload.created_at).await, 0);

        let later = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.prune_before(MediaKind::Upload, later).await, 1);
        assert!(store.get(&upload.id).await.is_none());
        assert!(store.get(&video.id).await.is_some());
    }

    #[tokio::test]
    async fn test_etag_is_content_hash() {
        let store = MediaStore::new();
        let a = store.insert(MediaKind::Video, "a.mp4", "video/mp4", b"same".to_vec()).await;
        let b = store.insert(MediaKind::Video, "b.mp4", "video/mp4", b"same".to_vec()).await;
        assert_ne!(a.id, b.id);
        assert_eq!(a.etag, b.etag);
        assert_eq!(a.etag.len(), 64);
    }

    #[test]
    fn test_image_mime_type_detection() {
        assert_eq!(image_mime_type("x.bin", Some("image/webp")).as_deref(), Some("image/webp"));
        assert_eq!(image_mime_type("photo.JPG", None).as_deref(), Some("image/jpeg"));
        assert_eq!(
            image_mime_type("photo.png", Some("application/octet-stream")).as_deref(),
            Some("image/png")
        );
        assert_eq!(image_mime_type("notes.pdf", Some("application/pdf")), None);
    }
}
