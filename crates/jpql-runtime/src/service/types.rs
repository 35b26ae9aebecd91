//! Types for the runtime services facade.

/// One row of the class summary table.
///
/// Columns mirror the management view: a child class defers its cache
/// type and configured size to its inheritance root (both blank) but
/// reports its own current live count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummaryRow {
    /// Fully qualified class name.
    pub class_name: String,
    /// Parent class name, empty for an inheritance root.
    pub parent_class_name: String,
    /// Display name of the cache type; blank for child classes, `N/A`
    /// when the class owns no identity map yet.
    pub cache_type: String,
    /// Configured maximum size; blank for child classes and unbounded
    /// policies.
    pub configured_size: String,
    /// Current live count, subclasses included.
    pub current_size: usize,
}

/// What flavor of session the services facade fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionKind {
    /// A server session owning its connection pools.
    #[default]
    Server,
    /// A broker session aggregating member sessions; connection resets do
    /// not apply.
    Broker,
}

impl SessionKind {
    /// Returns true for broker-style sessions.
    pub fn is_broker(&self) -> bool {
        matches!(self, SessionKind::Broker)
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Server => write!(f, "ServerSession"),
            SessionKind::Broker => write!(f, "SessionBroker"),
        }
    }
}
