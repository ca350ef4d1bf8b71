use bytes::Bytes;
use dashmap::DashMap;
use mime::Mime;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

pub const TEMP_URL_SCHEME: &str = "blob:";

/// Whether `url` points at session-local content rather than a stored file.
pub fn is_temporary(url: &str) -> bool {
    url.starts_with(TEMP_URL_SCHEME)
}

#[derive(Default)]
struct Inner {
    entries: DashMap<String, (Bytes, Option<Mime>)>,
    revoked: AtomicUsize,
}

/// Session-local store backing `blob:` urls for not-yet-confirmed uploads.
///
/// Cloning shares the same store.
#[derive(Clone, Default)]
pub struct TempUrlRegistry {
    inner: Arc<Inner>,
}

impl TempUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` and returns the handle owning the new url.
    pub fn create(&self, bytes: Bytes, content_type: Option<Mime>) -> TempUrl {
        let url = format!("{TEMP_URL_SCHEME}{}", Uuid::new_v4());
        self.inner
            .entries
            .insert(url.clone(), (bytes, content_type));
        tracing::trace!(%url, "created temporary url");

        TempUrl {
            handle: Arc::new(Handle {
                url,
                registry: self.clone(),
            }),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<(Bytes, Option<Mime>)> {
        self.inner
            .entries
            .get(url)
            .map(|entry| entry.value().clone())
    }

    /// Frees `url`. Returns false if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.inner.entries.remove(url).is_some();
        if removed {
            self.inner.revoked.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(%url, "revoked temporary url");
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.inner.entries.len()
    }

    /// Number of urls released so far.
    pub fn revoked_count(&self) -> usize {
        self.inner.revoked.load(Ordering::Relaxed)
    }
}

struct Handle {
    url: String,
    registry: TempUrlRegistry,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

/// Reference-counted `blob:` url. Revoked when the last clone is dropped.
#[derive(Clone)]
pub struct TempUrl {
    handle: Arc<Handle>,
}

impl TempUrl {
    pub fn as_str(&self) -> &str {
        &self.handle.url
    }
}

impl fmt::Debug for TempUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TempUrl").field(&self.handle.url).finish()
    }
}

impl PartialEq for TempUrl {
    fn eq(&self, other: &Self) -> bool {
        self.handle.url == other.handle.url
    }
}

impl Eq for TempUrl {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_unique_and_resolvable() {
        let registry = TempUrlRegistry::new();
        let a = registry.create(Bytes::from_static(b"a"), Some(mime::IMAGE_PNG));
        let b = registry.create(Bytes::from_static(b"b"), None);

        assert_ne!(a, b);
        assert!(is_temporary(a.as_str()));
        assert_eq!(registry.live_count(), 2);

        let (bytes, content_type) = registry.resolve(a.as_str()).unwrap();
        assert_eq!(&bytes[..], b"a");
        assert_eq!(content_type, Some(mime::IMAGE_PNG));
    }

    #[test]
    fn released_once_when_last_clone_drops() {
        let registry = TempUrlRegistry::new();
        let url = registry.create(Bytes::from_static(b"a"), None);
        let raw = url.as_str().to_string();
        let copy = url.clone();

        drop(url);
        assert!(registry.resolve(&raw).is_some());
        assert_eq!(registry.revoked_count(), 0);

        drop(copy);
        assert!(registry.resolve(&raw).is_none());
        assert_eq!(registry.revoked_count(), 1);
    }

    #[test]
    fn explicit_revoke_is_not_repeated_by_drop() {
        let registry = TempUrlRegistry::new();
        let url = registry.create(Bytes::from_static(b"a"), None);

        assert!(registry.revoke(url.as_str()));
        assert!(!registry.revoke(url.as_str()));
        drop(url);

        assert_eq!(registry.revoked_count(), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn stored_urls_are_not_temporary() {
        assert!(!is_temporary("/img/cat.png"));
    }
}
