//! Field constraint declarations for each filterable resource.
//!
//! # Design
//! Every resource kind owns one static `ConstraintSet`: a partition of its
//! field names into exact, range and excluded groups, plus the free-text,
//! embedding and page-size rules for its list endpoint. The filter builder
//! and the query serializer validate against this table and nothing else.

/// Resource kinds whose list endpoints accept query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Customers,
    Transactions,
}

impl ResourceKind {
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Customers => "customers",
            ResourceKind::Transactions => "transactions",
        }
    }

    pub fn constraints(self) -> &'static ConstraintSet {
        match self {
            ResourceKind::Customers => &CUSTOMERS,
            ResourceKind::Transactions => &TRANSACTIONS,
        }
    }
}

/// Value type behind a range field; decides which bounds are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Epoch seconds or an RFC 3339 timestamp.
    Timestamp,
    /// Any finite number.
    Number,
}

/// Group a field name falls into for a given resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    Exact,
    Range(RangeKind),
    Excluded,
    Unknown,
}

#[derive(Debug)]
pub struct ConstraintSet {
    pub resource: ResourceKind,
    pub exact: &'static [&'static str],
    pub range: &'static [(&'static str, RangeKind)],
    pub excluded: &'static [&'static str],
    pub query_supported: bool,
    pub embeddable: &'static [&'static str],
    pub max_limit: u32,
}

impl ConstraintSet {
    pub fn group_of(&self, field: &str) -> FieldGroup {
        if self.exact.iter().any(|name| *name == field) {
            return FieldGroup::Exact;
        }
        if let Some((_, kind)) = self.range.iter().find(|(name, _)| *name == field) {
            return FieldGroup::Range(*kind);
        }
        if self.excluded.iter().any(|name| *name == field) {
            return FieldGroup::Excluded;
        }
        FieldGroup::Unknown
    }

    pub fn can_embed(&self, name: &str) -> bool {
        self.embeddable.iter().any(|e| *e == name)
    }
}

pub static CUSTOMERS: ConstraintSet = ConstraintSet {
    resource: ResourceKind::Customers,
    exact: &[
        "id",
        "name",
        "pipeline_id",
        "status_id",
        "created_by",
        "updated_by",
        "responsible_user_id",
    ],
    range: &[
        ("next_price", RangeKind::Number),
        ("next_date", RangeKind::Timestamp),
        ("created_at", RangeKind::Timestamp),
        ("updated_at", RangeKind::Timestamp),
        ("closed_at", RangeKind::Timestamp),
        ("closest_task_at", RangeKind::Timestamp),
    ],
    excluded: &[
        "custom_fields_values",
        "periodicity",
        "ltv",
        "purchases_count",
        "average_check",
        "account_id",
        "is_deleted",
    ],
    query_supported: true,
    embeddable: &["catalog_elements", "contacts", "companies"],
    max_limit: 250,
};

pub static TRANSACTIONS: ConstraintSet = ConstraintSet {
    resource: ResourceKind::Transactions,
    exact: &["id"],
    range: &[],
    excluded: &[
        "customer_id",
        "comment",
        "price",
        "completed_at",
        "created_by",
        "updated_by",
        "created_at",
        "updated_at",
        "account_id",
        "is_deleted",
    ],
    query_supported: false,
    embeddable: &[],
    max_limit: 250,
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn all_sets() -> [&'static ConstraintSet; 2] {
        [&CUSTOMERS, &TRANSACTIONS]
    }

    #[test]
    fn field_groups_are_disjoint() {
        for set in all_sets() {
            let mut seen = HashSet::new();
            let names = set
                .exact
                .iter()
                .copied()
                .chain(set.range.iter().map(|(name, _)| *name))
                .chain(set.excluded.iter().copied());
            for name in names {
                assert!(
                    seen.insert(name),
                    "{}: `{name}` declared in more than one group",
                    set.resource.name()
                );
            }
        }
    }

    #[test]
    fn resource_kind_points_at_its_own_set() {
        for kind in [ResourceKind::Customers, ResourceKind::Transactions] {
            assert_eq!(kind.constraints().resource, kind);
        }
    }

    #[test]
    fn group_lookup() {
        assert_eq!(CUSTOMERS.group_of("id"), FieldGroup::Exact);
        assert_eq!(
            CUSTOMERS.group_of("created_at"),
            FieldGroup::Range(RangeKind::Timestamp)
        );
        assert_eq!(
            CUSTOMERS.group_of("next_price"),
            FieldGroup::Range(RangeKind::Number)
        );
        assert_eq!(CUSTOMERS.group_of("ltv"), FieldGroup::Excluded);
        assert_eq!(CUSTOMERS.group_of("nope"), FieldGroup::Unknown);
        assert_eq!(TRANSACTIONS.group_of("price"), FieldGroup::Excluded);
        assert_eq!(TRANSACTIONS.group_of("created_at"), FieldGroup::Excluded);
    }

    #[test]
    fn embedding_whitelist() {
        assert!(CUSTOMERS.can_embed("contacts"));
        assert!(!CUSTOMERS.can_embed("leads"));
        assert!(!TRANSACTIONS.can_embed("contacts"));
    }
}
