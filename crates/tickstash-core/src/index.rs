//! Index naming policy.
//!
//! Every document lands in a destination derived from its kind, an
//! optional entity id, and the local capture date:
//!
//! ```text
//! [<namespace>-]<kind>[-<entity>]-<YYYY-MM-DD>
//! ```
//!
//! The mapping is a pure function. Crossing midnight changes the
//! destination for new documents; nothing already written moves.

use chrono::NaiveDate;
use tickstash_types::{DocumentKind, EntityId};

/// Date format used in destination names.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Compute the destination name for a document.
///
/// `namespace`, when set, is prepended to every destination so several
/// deployments can share one store.
pub fn destination_name(
    namespace: Option<&str>,
    kind: DocumentKind,
    entity: Option<&EntityId>,
    date: NaiveDate,
) -> String {
    let mut name = String::new();
    if let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) {
        name.push_str(namespace);
        name.push('-');
    }
    name.push_str(kind.as_str());
    if let Some(entity) = entity {
        name.push('-');
        name.push_str(entity.as_str());
    }
    name.push('-');
    name.push_str(&date.format(DATE_FORMAT).to_string());
    name
}

/// Destination naming with a fixed namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexNaming {
    namespace: Option<String>,
}

impl IndexNaming {
    /// Naming without a namespace (`stats-gcl-2026-10-19`).
    pub const fn new() -> Self {
        Self { namespace: None }
    }

    /// Naming that prefixes every destination with `namespace`.
    pub fn with_namespace(namespace: Option<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    /// Destination for a document of `kind` captured on `date`.
    pub fn destination(
        &self,
        kind: DocumentKind,
        entity: Option<&EntityId>,
        date: NaiveDate,
    ) -> String {
        destination_name(self.namespace.as_deref(), kind, entity, date)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stats_destination_includes_entity() {
        let naming = IndexNaming::new();
        let gcl = EntityId::from("gcl");
        assert_eq!(
            naming.destination(DocumentKind::Stats, Some(&gcl), date(2026, 10, 19)),
            "stats-gcl-2026-10-19"
        );
    }

    #[test]
    fn performance_and_log_destinations_have_no_entity() {
        let naming = IndexNaming::new();
        assert_eq!(
            naming.destination(DocumentKind::Performance, None, date(2026, 1, 5)),
            "performance-2026-01-05"
        );
        assert_eq!(
            naming.destination(DocumentKind::Log, None, date(2026, 1, 5)),
            "log-2026-01-05"
        );
    }

    #[test]
    fn namespace_is_prepended() {
        let naming = IndexNaming::with_namespace(Some("screeps".to_owned()));
        assert_eq!(
            naming.destination(DocumentKind::Log, None, date(2026, 3, 1)),
            "screeps-log-2026-03-01"
        );
    }

    #[test]
    fn empty_namespace_is_ignored() {
        let naming = IndexNaming::with_namespace(Some(String::new()));
        assert_eq!(naming, IndexNaming::new());
    }

    #[test]
    fn same_inputs_same_destination() {
        let entity = EntityId::from("rooms");
        let first = destination_name(None, DocumentKind::Stats, Some(&entity), date(2026, 6, 30));
        let second = destination_name(None, DocumentKind::Stats, Some(&entity), date(2026, 6, 30));
        assert_eq!(first, second);
    }

    #[test]
    fn crossing_midnight_changes_destination() {
        let naming = IndexNaming::new();
        let before = naming.destination(DocumentKind::Performance, None, date(2026, 12, 31));
        let after = naming.destination(DocumentKind::Performance, None, date(2027, 1, 1));
        assert_ne!(before, after);
    }
}
