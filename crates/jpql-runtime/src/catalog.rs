//! Catalog of mapped classes and their inheritance links.

use std::collections::{HashMap, HashSet, VecDeque};

use jpql_query::MetadataProvider;

use crate::error::{RuntimeError, RuntimeResult};

/// Opaque identifier of a registered class, issued by its catalog.
pub type ClassId = usize;

/// One mapped class: its fully qualified name and optional parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    name: String,
    parent: Option<ClassId>,
}

impl ClassDescriptor {
    /// The fully qualified class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent class, when this descriptor participates in inheritance.
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// Returns true if this descriptor has a mapped parent.
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }
}

/// Registry of mapped classes with parent/child navigation.
///
/// Classes register once, in deterministic order; the catalog is the
/// authority the identity-map registry and the query builder resolve class
/// names against.
///
/// # Example
///
/// ```rust
/// use jpql_runtime::ClassCatalog;
///
/// let mut catalog = ClassCatalog::new();
/// let employee = catalog.register("com.acme.Employee", None).unwrap();
/// let manager = catalog.register("com.acme.Manager", Some("com.acme.Employee")).unwrap();
///
/// assert_eq!(catalog.root_of(manager), employee);
/// ```
#[derive(Debug, Default)]
pub struct ClassCatalog {
    descriptors: Vec<ClassDescriptor>,
    by_name: HashMap<String, ClassId>,
    children: HashMap<ClassId, Vec<ClassId>>,
}

impl ClassCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, optionally under a previously registered parent.
    ///
    /// Returns the id the catalog issues for the class. Registering the
    /// same name twice is an error, as is naming an unknown parent.
    pub fn register(&mut self, name: &str, parent: Option<&str>) -> RuntimeResult<ClassId> {
        if self.by_name.contains_key(name) {
            return Err(RuntimeError::DuplicateClass(name.to_string()));
        }
        let parent_id = match parent {
            Some(parent_name) => Some(self.resolve(parent_name)?),
            None => None,
        };

        let id = self.descriptors.len();
        self.descriptors.push(ClassDescriptor {
            name: name.to_string(),
            parent: parent_id,
        });
        self.by_name.insert(name.to_string(), id);
        if let Some(parent_id) = parent_id {
            self.children.entry(parent_id).or_default().push(id);
        }
        Ok(id)
    }

    /// Resolves a textual class name to its id.
    pub fn resolve(&self, name: &str) -> RuntimeResult<ClassId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::ClassResolution(name.to_string()))
    }

    /// The descriptor for an id issued by this catalog.
    pub fn descriptor(&self, id: ClassId) -> &ClassDescriptor {
        &self.descriptors[id]
    }

    /// The fully qualified name of a class.
    pub fn name(&self, id: ClassId) -> &str {
        self.descriptors[id].name()
    }

    /// The parent of a class, if any.
    pub fn parent(&self, id: ClassId) -> Option<ClassId> {
        self.descriptors[id].parent()
    }

    /// The parent's name, if any.
    pub fn parent_name(&self, id: ClassId) -> Option<&str> {
        self.parent(id).map(|p| self.name(p))
    }

    /// Returns true if the class has a mapped parent.
    pub fn is_child(&self, id: ClassId) -> bool {
        self.descriptors[id].is_child()
    }

    /// The root ancestor of a class (itself when it has no parent).
    pub fn root_of(&self, id: ClassId) -> ClassId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// The class and every registered descendant, via breadth-first walk.
    pub fn descendants_or_self(&self, id: ClassId) -> HashSet<ClassId> {
        let mut result = HashSet::new();
        let mut queue = VecDeque::new();
        result.insert(id);
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.children.get(&current) {
                for &child in children {
                    if result.insert(child) {
                        queue.push_back(child);
                    }
                }
            }
        }
        result
    }

    /// All registered class names, in registration order.
    pub fn class_names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Entity names resolve against the catalog: an exact match on the fully
/// qualified name, or a unique match on the final name segment.
impl MetadataProvider for ClassCatalog {
    fn class_for_entity(&self, entity_name: &str) -> Option<String> {
        if self.by_name.contains_key(entity_name) {
            return Some(entity_name.to_string());
        }
        let mut matches = self
            .descriptors
            .iter()
            .filter(|d| d.name().rsplit('.').next() == Some(entity_name));
        match (matches.next(), matches.next()) {
            (Some(descriptor), None) => Some(descriptor.name().to_string()),
            _ => None,
        }
    }
}
