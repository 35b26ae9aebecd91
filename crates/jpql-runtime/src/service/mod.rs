//! Runtime services facade over the identity map registry.
//!
//! This is the administrative view a management layer talks to: tabular
//! class summaries, name filtering, object counts, identity map
//! initialization and invalidation, and connection pool statistics.
//!
//! # Example
//!
//! ```ignore
//! let services = RuntimeServices::new("order-session", &registry)
//!     .with_pools(&pools);
//!
//! // One row per mapped class, filtered and sorted
//! for row in services.class_summary_using_filter("acme") {
//!     println!("{} [{}] {}", row.class_name, row.cache_type, row.current_size);
//! }
//!
//! // Administrative cache control
//! services.invalidate_identity_map("com.acme.Employee", true)?;
//! ```

mod types;

pub use types::{ClassSummaryRow, SessionKind};

use std::sync::Arc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::identity_map::CacheKey;
use crate::pool::ConnectionPoolProvider;
use crate::registry::IdentityMapRegistry;

/// Administrative facade over one session's identity maps and pools.
pub struct RuntimeServices<'a, V> {
    session_name: String,
    session_kind: SessionKind,
    registry: &'a IdentityMapRegistry<V>,
    pools: Option<&'a dyn ConnectionPoolProvider>,
}

impl<'a, V: Send + Sync + 'static> RuntimeServices<'a, V> {
    /// Creates a facade over a registry, with no pooling collaborator.
    pub fn new(session_name: impl Into<String>, registry: &'a IdentityMapRegistry<V>) -> Self {
        Self {
            session_name: session_name.into(),
            session_kind: SessionKind::Server,
            registry,
            pools: None,
        }
    }

    /// Attaches the connection pooling collaborator.
    pub fn with_pools(mut self, pools: &'a dyn ConnectionPoolProvider) -> Self {
        self.pools = Some(pools);
        self
    }

    /// Sets the session flavor.
    pub fn with_session_kind(mut self, kind: SessionKind) -> Self {
        self.session_kind = kind;
        self
    }

    /// The name of the session this facade represents.
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// The flavor of the session this facade represents.
    pub fn session_kind(&self) -> SessionKind {
        self.session_kind
    }

    // =========================================================================
    // Class summaries
    // =========================================================================

    /// All mapped class names, in registration order.
    pub fn mapped_class_names(&self) -> Vec<String> {
        self.registry
            .catalog()
            .class_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Mapped class names matching a filter, sorted.
    ///
    /// The filter is a comma-separated list of terms matched by literal,
    /// case-insensitive substring containment; one leading `*` per term is
    /// stripped (it also means "contains"). An unmatched filter yields an
    /// empty list, not an error.
    pub fn mapped_class_names_using_filter(&self, filter: &str) -> Vec<String> {
        let terms = filter_terms(filter);
        let mut names: Vec<String> = self
            .mapped_class_names()
            .into_iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                terms.iter().any(|term| lower.contains(term.as_str()))
            })
            .collect();
        names.sort();
        names
    }

    /// One summary row per mapped class, in registration order.
    pub fn class_summary(&self) -> Vec<ClassSummaryRow> {
        self.mapped_class_names()
            .iter()
            .filter_map(|name| self.summary_row(name).ok())
            .collect()
    }

    /// Summary rows for the classes matching a filter, sorted by class name.
    pub fn class_summary_using_filter(&self, filter: &str) -> Vec<ClassSummaryRow> {
        self.mapped_class_names_using_filter(filter)
            .iter()
            .filter_map(|name| self.summary_row(name).ok())
            .collect()
    }

    /// Builds the summary row for one class.
    ///
    /// A child class reports blank cache type and configured size (its
    /// root's cache is authoritative) but its own subtree's live count.
    fn summary_row(&self, class_name: &str) -> RuntimeResult<ClassSummaryRow> {
        let catalog = self.registry.catalog();
        let class = catalog.resolve(class_name)?;

        let parent_class_name = catalog.parent_name(class).unwrap_or("").to_string();
        let current_size = match self.registry.size_of(class_name, true) {
            Ok(size) => size,
            Err(RuntimeError::UnmappedClass(_)) => 0,
            Err(err) => return Err(err),
        };

        let (cache_type, configured_size) = if catalog.is_child(class) {
            (String::new(), String::new())
        } else {
            match self.registry.identity_map(class_name) {
                Ok(map) => {
                    let map = map.lock();
                    let configured = map
                        .max_size()
                        .map(|size| size.to_string())
                        .unwrap_or_default();
                    (map.policy().cache_type_name().to_string(), configured)
                }
                Err(RuntimeError::UnmappedClass(_)) => ("N/A".to_string(), String::new()),
                Err(err) => return Err(err),
            }
        };

        Ok(ClassSummaryRow {
            class_name: class_name.to_string(),
            parent_class_name,
            cache_type,
            configured_size,
            current_size,
        })
    }

    // =========================================================================
    // Object counts
    // =========================================================================

    /// The number of objects cached for a class.
    ///
    /// Counts through the inheritance root with subclasses included, so
    /// the answer is accurate regardless of which class in the hierarchy
    /// is asked about.
    pub fn number_of_objects_in_identity_map(&self, class_name: &str) -> RuntimeResult<usize> {
        let catalog = self.registry.catalog();
        let class = catalog.resolve(class_name)?;
        let root = catalog.name(catalog.root_of(class)).to_string();
        self.registry.size_of(&root, true)
    }

    /// The total number of objects across all identity maps.
    pub fn number_of_objects_in_all_identity_maps(&self) -> usize {
        self.registry
            .list_registered_classes()
            .iter()
            .filter_map(|name| self.registry.size_of(name, true).ok())
            .sum()
    }

    /// The number of persistent classes known to the session.
    pub fn number_of_persistent_classes(&self) -> usize {
        self.registry.catalog().len()
    }

    /// The live key/object pairs of one class's identity map.
    pub fn objects_in_identity_map(
        &self,
        class_name: &str,
    ) -> RuntimeResult<Vec<(CacheKey, Arc<V>)>> {
        let map = self.registry.identity_map(class_name)?;
        let entries = map.lock().entries();
        Ok(entries)
    }

    // =========================================================================
    // Identity map administration
    // =========================================================================

    /// Clears one class's identity map.
    pub fn initialize_identity_map(&self, class_name: &str) -> RuntimeResult<()> {
        self.registry.initialize(class_name)
    }

    /// Clears the identity maps of each named class.
    pub fn initialize_identity_maps(&self, class_names: &[&str]) -> RuntimeResult<()> {
        for class_name in class_names {
            self.registry.initialize(class_name)?;
        }
        Ok(())
    }

    /// Clears every identity map in the session.
    pub fn initialize_all_identity_maps(&self) {
        self.registry.initialize_all();
    }

    /// Invalidates one class's cached objects, optionally recursing into
    /// registered subclasses. Returns the number of evicted entries.
    pub fn invalidate_identity_map(
        &self,
        class_name: &str,
        recurse: bool,
    ) -> RuntimeResult<usize> {
        self.registry.invalidate(class_name, recurse)
    }

    /// Invalidates the cached objects of each named class.
    pub fn invalidate_identity_maps(
        &self,
        class_names: &[&str],
        recurse: bool,
    ) -> RuntimeResult<usize> {
        let mut evicted = 0;
        for class_name in class_names {
            evicted += self.registry.invalidate(class_name, recurse)?;
        }
        Ok(evicted)
    }

    /// Invalidates every registered class's entry.
    pub fn invalidate_all_identity_maps(&self) -> usize {
        self.registry.invalidate_all()
    }

    // =========================================================================
    // Connection pools
    // =========================================================================

    /// The names of the available connection pools.
    pub fn pool_names(&self) -> Vec<String> {
        self.pools.map(|p| p.pool_names()).unwrap_or_default()
    }

    /// The minimum size of a pool, `-1` when no such pool exists.
    pub fn min_size_for_pool(&self, pool_name: &str) -> i64 {
        self.pools
            .and_then(|p| p.pool_info(pool_name))
            .map(|info| info.min_connections as i64)
            .unwrap_or(-1)
    }

    /// The maximum size of a pool, `-1` when no such pool exists.
    pub fn max_size_for_pool(&self, pool_name: &str) -> i64 {
        self.pools
            .and_then(|p| p.pool_info(pool_name))
            .map(|info| info.max_connections as i64)
            .unwrap_or(-1)
    }

    /// Shuts down and restarts every connection pool.
    ///
    /// A no-op for broker-style sessions, which own no pools of their own.
    pub fn reset_all_connections(&self) {
        if self.session_kind.is_broker() {
            return;
        }
        if let Some(pools) = self.pools {
            pools.reset_all();
        }
    }
}

/// Splits a filter into lowercase containment terms.
///
/// Empty tokens are dropped before the leading `*` is stripped, so a bare
/// `*` term remains and matches everything.
fn filter_terms(filter: &str) -> Vec<String> {
    filter
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| term.strip_prefix('*').unwrap_or(term).to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassCatalog;
    use crate::policy::CachePolicy;
    use crate::pool::PoolInfo;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockPools {
        pools: HashMap<String, PoolInfo>,
        resets: AtomicUsize,
    }

    impl MockPools {
        fn new() -> Self {
            let mut pools = HashMap::new();
            pools.insert(
                "default".to_string(),
                PoolInfo {
                    min_connections: 5,
                    max_connections: 50,
                },
            );
            Self {
                pools,
                resets: AtomicUsize::new(0),
            }
        }
    }

    impl ConnectionPoolProvider for MockPools {
        fn pool_names(&self) -> Vec<String> {
            self.pools.keys().cloned().collect()
        }

        fn pool_info(&self, name: &str) -> Option<PoolInfo> {
            self.pools.get(name).copied()
        }

        fn reset_all(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn registry() -> IdentityMapRegistry<String> {
        let mut catalog = ClassCatalog::new();
        catalog.register("com.acme.Foo", None).unwrap();
        catalog.register("com.acme.Bar", None).unwrap();
        catalog.register("org.other.Baz", None).unwrap();
        catalog
            .register("com.acme.FooChild", Some("com.acme.Foo"))
            .unwrap();
        IdentityMapRegistry::new(Arc::new(catalog))
    }

    fn put(registry: &IdentityMapRegistry<String>, class: &str, key: &str) {
        registry
            .put(class, key.into(), Arc::new(key.to_string()))
            .unwrap();
    }

    #[test]
    fn test_filter_matches_substring_case_insensitive_sorted() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);

        let names = services.mapped_class_names_using_filter("ACME");
        assert_eq!(
            names,
            vec!["com.acme.Bar", "com.acme.Foo", "com.acme.FooChild"]
        );
    }

    #[test]
    fn test_filter_exact_example() {
        let mut catalog = ClassCatalog::new();
        catalog.register("com.acme.Foo", None).unwrap();
        catalog.register("com.acme.Bar", None).unwrap();
        catalog.register("org.other.Baz", None).unwrap();
        let registry: IdentityMapRegistry<String> = IdentityMapRegistry::new(Arc::new(catalog));
        let services = RuntimeServices::new("session", &registry);

        assert_eq!(
            services.mapped_class_names_using_filter("acme"),
            vec!["com.acme.Bar", "com.acme.Foo"]
        );
    }

    #[test]
    fn test_filter_star_prefix_means_contains() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);

        assert_eq!(
            services.mapped_class_names_using_filter("*other"),
            vec!["org.other.Baz"]
        );
        // A bare star matches everything.
        assert_eq!(services.mapped_class_names_using_filter("*").len(), 4);
    }

    #[test]
    fn test_filter_metacharacters_are_literal() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);

        // A dot matches only a literal dot, never "any character".
        assert_eq!(
            services.mapped_class_names_using_filter("com.acme"),
            vec!["com.acme.Bar", "com.acme.Foo", "com.acme.FooChild"]
        );
        assert!(services.mapped_class_names_using_filter("comxacme").is_empty());
    }

    #[test]
    fn test_filter_comma_separated_terms() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);

        assert_eq!(
            services.mapped_class_names_using_filter("bar, baz"),
            vec!["com.acme.Bar", "org.other.Baz"]
        );
    }

    #[test]
    fn test_unmatched_filter_is_empty_not_an_error() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);
        assert!(services.mapped_class_names_using_filter("racer").is_empty());
        assert!(services.mapped_class_names_using_filter("").is_empty());
    }

    #[test]
    fn test_class_summary_blanks_child_rows() {
        let registry = registry();
        registry
            .get_or_create("com.acme.Foo", CachePolicy::SoftWeak { max_size: 100 })
            .unwrap();
        put(&registry, "com.acme.Foo", "1");
        put(&registry, "com.acme.FooChild", "2");

        let services = RuntimeServices::new("session", &registry);
        let rows = services.class_summary();

        let root = rows.iter().find(|r| r.class_name == "com.acme.Foo").unwrap();
        assert_eq!(root.cache_type, "SoftWeak");
        assert_eq!(root.configured_size, "100");
        assert_eq!(root.parent_class_name, "");
        assert_eq!(root.current_size, 2);

        let child = rows
            .iter()
            .find(|r| r.class_name == "com.acme.FooChild")
            .unwrap();
        assert_eq!(child.cache_type, "");
        assert_eq!(child.configured_size, "");
        assert_eq!(child.parent_class_name, "com.acme.Foo");
        assert_eq!(child.current_size, 1);
    }

    #[test]
    fn test_class_summary_unmapped_class_is_not_applicable() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);

        let rows = services.class_summary();
        let row = rows.iter().find(|r| r.class_name == "org.other.Baz").unwrap();
        assert_eq!(row.cache_type, "N/A");
        assert_eq!(row.configured_size, "");
        assert_eq!(row.current_size, 0);
    }

    #[test]
    fn test_class_summary_unbounded_has_blank_configured_size() {
        let registry = registry();
        registry
            .get_or_create("com.acme.Bar", CachePolicy::Full)
            .unwrap();
        let services = RuntimeServices::new("session", &registry);

        let rows = services.class_summary_using_filter("bar");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cache_type, "Full");
        assert_eq!(rows[0].configured_size, "");
    }

    #[test]
    fn test_number_of_objects_counts_through_the_root() {
        let registry = registry();
        registry
            .get_or_create("com.acme.Foo", CachePolicy::Full)
            .unwrap();
        put(&registry, "com.acme.Foo", "1");
        put(&registry, "com.acme.FooChild", "2");

        let services = RuntimeServices::new("session", &registry);
        // Asking about the child still counts the whole hierarchy.
        assert_eq!(
            services
                .number_of_objects_in_identity_map("com.acme.FooChild")
                .unwrap(),
            2
        );
        assert_eq!(services.number_of_objects_in_all_identity_maps(), 2);
    }

    #[test]
    fn test_number_of_persistent_classes() {
        let registry = registry();
        let services = RuntimeServices::new("session", &registry);
        assert_eq!(services.number_of_persistent_classes(), 4);
    }

    #[test]
    fn test_objects_in_identity_map_lists_live_entries() {
        let registry = registry();
        registry
            .get_or_create("com.acme.Foo", CachePolicy::Full)
            .unwrap();
        put(&registry, "com.acme.Foo", "1");

        let services = RuntimeServices::new("session", &registry);
        let entries = services.objects_in_identity_map("com.acme.Foo").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.as_str(), "1");

        let err = services.objects_in_identity_map("com.acme.Bar").unwrap_err();
        assert_eq!(err, RuntimeError::UnmappedClass("com.acme.Bar".to_string()));
    }

    #[test]
    fn test_initialize_identity_maps() {
        let registry = registry();
        registry
            .get_or_create("com.acme.Foo", CachePolicy::Full)
            .unwrap();
        registry
            .get_or_create("com.acme.Bar", CachePolicy::Full)
            .unwrap();
        put(&registry, "com.acme.Foo", "1");
        put(&registry, "com.acme.Bar", "2");

        let services = RuntimeServices::new("session", &registry);
        services
            .initialize_identity_maps(&["com.acme.Foo", "com.acme.Bar"])
            .unwrap();

        assert_eq!(services.number_of_objects_in_all_identity_maps(), 0);
    }

    #[test]
    fn test_invalidate_identity_maps_reports_evictions() {
        let registry = registry();
        registry
            .get_or_create("com.acme.Foo", CachePolicy::Full)
            .unwrap();
        put(&registry, "com.acme.Foo", "1");
        put(&registry, "com.acme.FooChild", "2");

        let services = RuntimeServices::new("session", &registry);
        let evicted = services
            .invalidate_identity_maps(&["com.acme.Foo"], true)
            .unwrap();
        assert_eq!(evicted, 2);
        assert_eq!(services.invalidate_all_identity_maps(), 0);
    }

    #[test]
    fn test_pool_sizes_report_minus_one_when_absent() {
        let registry = registry();
        let pools = MockPools::new();
        let services = RuntimeServices::new("session", &registry).with_pools(&pools);

        assert_eq!(services.min_size_for_pool("default"), 5);
        assert_eq!(services.max_size_for_pool("default"), 50);
        assert_eq!(services.min_size_for_pool("missing"), -1);
        assert_eq!(services.max_size_for_pool("missing"), -1);

        // No provider at all behaves like an absent pool.
        let bare = RuntimeServices::new("session", &registry);
        assert_eq!(bare.min_size_for_pool("default"), -1);
    }

    #[test]
    fn test_reset_all_connections_is_noop_for_brokers() {
        let registry = registry();
        let pools = MockPools::new();

        let server = RuntimeServices::new("session", &registry).with_pools(&pools);
        server.reset_all_connections();
        assert_eq!(pools.resets.load(Ordering::SeqCst), 1);

        let broker = RuntimeServices::new("broker", &registry)
            .with_pools(&pools)
            .with_session_kind(SessionKind::Broker);
        broker.reset_all_connections();
        assert_eq!(pools.resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_identity() {
        let registry = registry();
        let services = RuntimeServices::new("order-session", &registry);
        assert_eq!(services.session_name(), "order-session");
        assert_eq!(services.session_kind(), SessionKind::Server);
    }
}
