//! One identity map: a per-inheritance-root cache from primary key to the
//! live in-memory instance.
//!
//! The seven cache types share this one structure; the eviction policy
//! selects the backing store. Weak-flavored policies hold
//! [`std::sync::Weak`] handles and count an entry as live only while the
//! application still holds the object; the SoftWeak/HardWeak flavors add a
//! bounded LRU buffer of strong handles over the most recently touched
//! objects.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use lru::LruCache;

use crate::catalog::ClassId;
use crate::policy::CachePolicy;

/// Composite primary key identifying one cached object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Creates a key from its parts.
    pub fn new<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// The key's parts, in declaration order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(part: &str) -> Self {
        Self(vec![part.to_string()])
    }
}

impl From<String> for CacheKey {
    fn from(part: String) -> Self {
        Self(vec![part])
    }
}

impl From<u64> for CacheKey {
    fn from(part: u64) -> Self {
        Self(vec![part.to_string()])
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

#[derive(Debug)]
struct StrongEntry<V> {
    class: ClassId,
    object: Arc<V>,
}

#[derive(Debug)]
struct WeakEntry<V> {
    class: ClassId,
    object: Weak<V>,
}

enum Store<V> {
    /// Nothing is retained; every lookup misses.
    Disabled,
    /// Objects held strongly until invalidated (Full, Soft).
    Strong(HashMap<CacheKey, StrongEntry<V>>),
    /// At most `max_size` objects, least recently used evicted first.
    Bounded(LruCache<CacheKey, StrongEntry<V>>),
    /// Weak handles, optionally shadowed by a strong retention buffer.
    Weak {
        entries: HashMap<CacheKey, WeakEntry<V>>,
        retained: Option<LruCache<CacheKey, Arc<V>>>,
    },
}

/// A per-class cache from primary key to live instance.
///
/// One instance exists per inheritance root; objects of subclasses live in
/// the root's map, each entry remembering its concrete class so per-class
/// sizing and invalidation can filter without double counting.
pub struct IdentityMap<V> {
    policy: CachePolicy,
    store: Store<V>,
}

impl<V> IdentityMap<V> {
    /// Creates a map with the given eviction policy.
    pub fn new(policy: CachePolicy) -> Self {
        let store = match policy {
            CachePolicy::None => Store::Disabled,
            CachePolicy::Full | CachePolicy::Soft => Store::Strong(HashMap::new()),
            CachePolicy::Cache { max_size } => Store::Bounded(LruCache::new(bounded(max_size))),
            CachePolicy::Weak => Store::Weak {
                entries: HashMap::new(),
                retained: None,
            },
            CachePolicy::SoftWeak { max_size } | CachePolicy::HardWeak { max_size } => {
                Store::Weak {
                    entries: HashMap::new(),
                    retained: Some(LruCache::new(bounded(max_size))),
                }
            }
        };
        Self { policy, store }
    }

    /// The eviction policy of this map.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// The configured maximum size, for bounded policies.
    pub fn max_size(&self) -> Option<usize> {
        self.policy.configured_size()
    }

    /// Stores an object under its primary key, recording its concrete class.
    pub fn put(&mut self, key: CacheKey, class: ClassId, object: Arc<V>) {
        match &mut self.store {
            Store::Disabled => {}
            Store::Strong(map) => {
                map.insert(key, StrongEntry { class, object });
            }
            Store::Bounded(cache) => {
                cache.put(key, StrongEntry { class, object });
            }
            Store::Weak { entries, retained } => {
                entries.insert(
                    key.clone(),
                    WeakEntry {
                        class,
                        object: Arc::downgrade(&object),
                    },
                );
                if let Some(buffer) = retained {
                    buffer.put(key, object);
                }
            }
        }
    }

    /// Looks up an object by key.
    ///
    /// A hit promotes the entry in LRU-ordered stores. A weak entry whose
    /// object has been dropped is removed and reported as a miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<V>> {
        match &mut self.store {
            Store::Disabled => None,
            Store::Strong(map) => map.get(key).map(|e| Arc::clone(&e.object)),
            Store::Bounded(cache) => cache.get(key).map(|e| Arc::clone(&e.object)),
            Store::Weak { entries, retained } => {
                let object = entries.get(key).and_then(|e| e.object.upgrade());
                match object {
                    Some(object) => {
                        if let Some(buffer) = retained {
                            buffer.put(key.clone(), Arc::clone(&object));
                        }
                        Some(object)
                    }
                    None => {
                        entries.remove(key);
                        if let Some(buffer) = retained {
                            buffer.pop(key);
                        }
                        None
                    }
                }
            }
        }
    }

    /// Removes one entry, returning the object when it was live.
    pub fn remove(&mut self, key: &CacheKey) -> Option<Arc<V>> {
        match &mut self.store {
            Store::Disabled => None,
            Store::Strong(map) => map.remove(key).map(|e| e.object),
            Store::Bounded(cache) => cache.pop(key).map(|e| e.object),
            Store::Weak { entries, retained } => {
                if let Some(buffer) = retained {
                    buffer.pop(key);
                }
                entries.remove(key).and_then(|e| e.object.upgrade())
            }
        }
    }

    /// The number of live entries.
    pub fn len(&self) -> usize {
        match &self.store {
            Store::Disabled => 0,
            Store::Strong(map) => map.len(),
            Store::Bounded(cache) => cache.len(),
            Store::Weak { entries, .. } => entries
                .values()
                .filter(|e| e.object.strong_count() > 0)
                .count(),
        }
    }

    /// Returns true if the map holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of live entries whose concrete class is in `classes`.
    pub fn size_for(&self, classes: &HashSet<ClassId>) -> usize {
        match &self.store {
            Store::Disabled => 0,
            Store::Strong(map) => map.values().filter(|e| classes.contains(&e.class)).count(),
            Store::Bounded(cache) => cache
                .iter()
                .filter(|(_, e)| classes.contains(&e.class))
                .count(),
            Store::Weak { entries, .. } => entries
                .values()
                .filter(|e| classes.contains(&e.class) && e.object.strong_count() > 0)
                .count(),
        }
    }

    /// Evicts every entry whose concrete class is in `classes`, returning
    /// how many entries were dropped.
    pub fn evict_classes(&mut self, classes: &HashSet<ClassId>) -> usize {
        match &mut self.store {
            Store::Disabled => 0,
            Store::Strong(map) => {
                let before = map.len();
                map.retain(|_, e| !classes.contains(&e.class));
                before - map.len()
            }
            Store::Bounded(cache) => {
                let doomed: Vec<CacheKey> = cache
                    .iter()
                    .filter(|(_, e)| classes.contains(&e.class))
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in &doomed {
                    cache.pop(key);
                }
                doomed.len()
            }
            Store::Weak { entries, retained } => {
                let doomed: Vec<CacheKey> = entries
                    .iter()
                    .filter(|(_, e)| classes.contains(&e.class))
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in &doomed {
                    entries.remove(key);
                    if let Some(buffer) = retained {
                        buffer.pop(key);
                    }
                }
                doomed.len()
            }
        }
    }

    /// Drops every entry, returning how many were held.
    pub fn clear(&mut self) -> usize {
        match &mut self.store {
            Store::Disabled => 0,
            Store::Strong(map) => {
                let count = map.len();
                map.clear();
                count
            }
            Store::Bounded(cache) => {
                let count = cache.len();
                cache.clear();
                count
            }
            Store::Weak { entries, retained } => {
                let count = entries.len();
                entries.clear();
                if let Some(buffer) = retained {
                    buffer.clear();
                }
                count
            }
        }
    }

    /// The keys of all live entries.
    pub fn keys(&self) -> Vec<CacheKey> {
        match &self.store {
            Store::Disabled => Vec::new(),
            Store::Strong(map) => map.keys().cloned().collect(),
            Store::Bounded(cache) => cache.iter().map(|(k, _)| k.clone()).collect(),
            Store::Weak { entries, .. } => entries
                .iter()
                .filter(|(_, e)| e.object.strong_count() > 0)
                .map(|(k, _)| k.clone())
                .collect(),
        }
    }

    /// Key/object pairs for all live entries, for diagnostics.
    pub fn entries(&self) -> Vec<(CacheKey, Arc<V>)> {
        match &self.store {
            Store::Disabled => Vec::new(),
            Store::Strong(map) => map
                .iter()
                .map(|(k, e)| (k.clone(), Arc::clone(&e.object)))
                .collect(),
            Store::Bounded(cache) => cache
                .iter()
                .map(|(k, e)| (k.clone(), Arc::clone(&e.object)))
                .collect(),
            Store::Weak { entries, .. } => entries
                .iter()
                .filter_map(|(k, e)| e.object.upgrade().map(|o| (k.clone(), o)))
                .collect(),
        }
    }

    /// Releases soft retention, standing in for the memory reclaimer.
    ///
    /// `Soft` maps drop everything; `SoftWeak` maps drop only the strong
    /// buffer (the weak handles stay); `HardWeak` and the rest are
    /// unaffected.
    pub fn release_soft_references(&mut self) {
        match self.policy {
            CachePolicy::Soft => {
                if let Store::Strong(map) = &mut self.store {
                    map.clear();
                }
            }
            CachePolicy::SoftWeak { .. } => {
                if let Store::Weak {
                    retained: Some(buffer),
                    ..
                } = &mut self.store
                {
                    buffer.clear();
                }
            }
            _ => {}
        }
    }
}

impl<V> std::fmt::Debug for IdentityMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityMap")
            .field("policy", &self.policy)
            .field("live", &self.len())
            .finish()
    }
}

fn bounded(max_size: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_size.max(1)).expect("max(1) is non-zero")
}
