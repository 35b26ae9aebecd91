//! Registry of identity maps, one per inheritance root.
//!
//! Structure shared across threads: a registry-level `RwLock` guards the
//! class→map table (write-locked only when a new mapped class arrives),
//! and each map sits behind its own `Mutex` serializing cache mutation for
//! that inheritance root. Enumeration and aggregate sizing take the read
//! lock for a consistent snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::{ClassCatalog, ClassId};
use crate::error::{RuntimeError, RuntimeResult};
use crate::identity_map::{CacheKey, IdentityMap};
use crate::policy::CachePolicy;

struct RegistryInner<V> {
    /// Maps keyed by inheritance root.
    maps: HashMap<ClassId, Arc<Mutex<IdentityMap<V>>>>,
    /// Roots in the order their entries were first created.
    registered: Vec<ClassId>,
}

/// Thread-safe registry of identity maps.
///
/// Every mapped class resolves to exactly one owning entry: lookups for a
/// subclass land in the nearest mapped ancestor's cache, and subclasses
/// never allocate a second entry.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use jpql_runtime::{CachePolicy, ClassCatalog, IdentityMapRegistry};
///
/// let mut catalog = ClassCatalog::new();
/// catalog.register("com.acme.Employee", None).unwrap();
///
/// let registry: IdentityMapRegistry<String> =
///     IdentityMapRegistry::new(Arc::new(catalog));
/// registry
///     .get_or_create("com.acme.Employee", CachePolicy::Full)
///     .unwrap();
///
/// registry
///     .put("com.acme.Employee", "1".into(), Arc::new("Alice".to_string()))
///     .unwrap();
/// assert_eq!(registry.size_of("com.acme.Employee", false).unwrap(), 1);
/// ```
pub struct IdentityMapRegistry<V> {
    catalog: Arc<ClassCatalog>,
    inner: RwLock<RegistryInner<V>>,
}

impl<V: Send + Sync + 'static> IdentityMapRegistry<V> {
    /// Creates an empty registry over a class catalog.
    pub fn new(catalog: Arc<ClassCatalog>) -> Self {
        Self {
            catalog,
            inner: RwLock::new(RegistryInner {
                maps: HashMap::new(),
                registered: Vec::new(),
            }),
        }
    }

    /// The catalog this registry resolves class names against.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Returns the identity map owning `class_name`, creating it when the
    /// class's inheritance root has none yet.
    ///
    /// A subclass request resolves to the root's entry. A request whose
    /// cache type diverges from an existing entry's is a
    /// [`RuntimeError::CacheInvariant`].
    pub fn get_or_create(
        &self,
        class_name: &str,
        policy: CachePolicy,
    ) -> RuntimeResult<Arc<Mutex<IdentityMap<V>>>> {
        let class = self.catalog.resolve(class_name)?;
        let root = self.catalog.root_of(class);

        if let Some(map) = self.inner.read().maps.get(&root) {
            self.check_invariant(class_name, root, &policy, map)?;
            return Ok(Arc::clone(map));
        }

        let mut inner = self.inner.write();
        // Double-checked: another thread may have created the entry while
        // the write lock was awaited.
        if let Some(map) = inner.maps.get(&root) {
            self.check_invariant(class_name, root, &policy, map)?;
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(Mutex::new(IdentityMap::new(policy)));
        inner.maps.insert(root, Arc::clone(&map));
        inner.registered.push(root);
        Ok(map)
    }

    fn check_invariant(
        &self,
        class_name: &str,
        root: ClassId,
        requested: &CachePolicy,
        existing: &Arc<Mutex<IdentityMap<V>>>,
    ) -> RuntimeResult<()> {
        let installed = *existing.lock().policy();
        if installed.cache_type_name() != requested.cache_type_name() {
            return Err(RuntimeError::CacheInvariant {
                class: class_name.to_string(),
                root: self.catalog.name(root).to_string(),
                expected: installed.cache_type_name().to_string(),
                actual: requested.cache_type_name().to_string(),
            });
        }
        Ok(())
    }

    /// Returns the identity map owning `class_name`.
    ///
    /// Fails with [`RuntimeError::UnmappedClass`] when neither the class
    /// nor any ancestor owns an entry.
    pub fn identity_map(&self, class_name: &str) -> RuntimeResult<Arc<Mutex<IdentityMap<V>>>> {
        let class = self.catalog.resolve(class_name)?;
        let root = self.catalog.root_of(class);
        self.inner
            .read()
            .maps
            .get(&root)
            .cloned()
            .ok_or_else(|| RuntimeError::UnmappedClass(class_name.to_string()))
    }

    /// Caches an object of concrete class `class_name` under `key`.
    pub fn put(&self, class_name: &str, key: CacheKey, object: Arc<V>) -> RuntimeResult<()> {
        let class = self.catalog.resolve(class_name)?;
        let map = self.identity_map(class_name)?;
        map.lock().put(key, class, object);
        Ok(())
    }

    /// Looks up a cached object by class and key.
    ///
    /// The lookup resolves to the inheritance root's cache; `None` is a
    /// cache miss and the caller re-fetches from the backing store.
    pub fn get(&self, class_name: &str, key: &CacheKey) -> RuntimeResult<Option<Arc<V>>> {
        let map = self.identity_map(class_name)?;
        let object = map.lock().get(key);
        Ok(object)
    }

    /// The live count for a class.
    ///
    /// With `include_subclasses`, counts every registered descendant's
    /// entries in the shared root cache; entries are never double counted
    /// because each records exactly one concrete class.
    pub fn size_of(&self, class_name: &str, include_subclasses: bool) -> RuntimeResult<usize> {
        let class = self.catalog.resolve(class_name)?;
        let map = self.identity_map(class_name)?;
        let classes = if include_subclasses {
            self.catalog.descendants_or_self(class)
        } else {
            [class].into_iter().collect()
        };
        let size = map.lock().size_for(&classes);
        Ok(size)
    }

    /// Invalidates every entry held for `class_name` (and, when recursing,
    /// for each registered subclass), returning how many entries were
    /// evicted. The registry slot itself survives: the next access is a
    /// miss that re-fetches from the backing store.
    pub fn invalidate(&self, class_name: &str, recurse: bool) -> RuntimeResult<usize> {
        let class = self.catalog.resolve(class_name)?;
        let map = self.identity_map(class_name)?;
        let classes = if recurse {
            self.catalog.descendants_or_self(class)
        } else {
            [class].into_iter().collect()
        };
        let evicted = map.lock().evict_classes(&classes);
        Ok(evicted)
    }

    /// Invalidates every registered class's entry, returning the number of
    /// evicted entries.
    pub fn invalidate_all(&self) -> usize {
        let maps = self.snapshot();
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            maps.par_iter().map(|map| map.lock().clear()).sum()
        }
        #[cfg(not(feature = "parallel"))]
        {
            maps.iter().map(|map| map.lock().clear()).sum()
        }
    }

    /// Clears the identity map owning `class_name`.
    pub fn initialize(&self, class_name: &str) -> RuntimeResult<()> {
        let map = self.identity_map(class_name)?;
        map.lock().clear();
        Ok(())
    }

    /// Clears every registered identity map.
    pub fn initialize_all(&self) {
        for map in self.snapshot() {
            map.lock().clear();
        }
    }

    /// Class names that currently own an entry, in registration order.
    ///
    /// Subclasses are absent: they share their root's entry rather than
    /// owning one.
    pub fn list_registered_classes(&self) -> Vec<String> {
        self.inner
            .read()
            .registered
            .iter()
            .map(|&id| self.catalog.name(id).to_string())
            .collect()
    }

    /// Number of identity map entries.
    pub fn len(&self) -> usize {
        self.inner.read().maps.len()
    }

    /// Returns true if no identity maps exist yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().maps.is_empty()
    }

    /// A consistent snapshot of all maps.
    fn snapshot(&self) -> Vec<Arc<Mutex<IdentityMap<V>>>> {
        let inner = self.inner.read();
        inner
            .registered
            .iter()
            .filter_map(|root| inner.maps.get(root).cloned())
            .collect()
    }
}
