// ── Filter engine ──
//
// Pure predicate application over an alert set. Filterable fields are a
// closed enum with explicit accessors, so the set of dimensions the host
// can constrain is type-checked rather than looked up by string.

use serde::{Deserialize, Serialize};

use crate::model::Alert;
use crate::model::snapshot::ALL_OPTION;

/// A filterable alert dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum FilterKey {
    #[strum(serialize = "region")]
    Region,
    #[strum(serialize = "site")]
    Site,
    #[strum(serialize = "agency")]
    Agency,
    #[strum(serialize = "equipmentType")]
    EquipmentType,
    #[strum(serialize = "priority")]
    Priority,
}

impl FilterKey {
    /// Every filterable dimension, in the order the host renders them.
    pub const ALL: [FilterKey; 5] = [
        FilterKey::Region,
        FilterKey::Site,
        FilterKey::Agency,
        FilterKey::EquipmentType,
        FilterKey::Priority,
    ];

    /// The alert field this key constrains.
    pub fn extract(self, alert: &Alert) -> &str {
        match self {
            Self::Region => &alert.region,
            Self::Site => &alert.site,
            Self::Agency => &alert.agency,
            Self::EquipmentType => &alert.equipment_type,
            Self::Priority => &alert.priority,
        }
    }
}

/// A constraint value: the `"All"` wildcard or an exact-match literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterValue {
    All,
    Text(String),
}

impl FilterValue {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        if value == ALL_OPTION {
            Self::All
        } else {
            Self::Text(value.to_owned())
        }
    }
}

/// One field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub key: FilterKey,
    pub value: FilterValue,
}

/// The active constraint set: at most one criterion per key.
///
/// Setting a key that is already present replaces its value, mirroring how
/// the host's dropdowns behave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    criteria: Vec<FilterCriterion>,
}

impl Default for FilterSet {
    /// Every filterable dimension at `All` -- the host's initial state.
    fn default() -> Self {
        Self {
            criteria: FilterKey::ALL
                .into_iter()
                .map(|key| FilterCriterion {
                    key,
                    value: FilterValue::All,
                })
                .collect(),
        }
    }
}

impl FilterSet {
    /// A set with no criteria at all. Equivalent to all-wildcards when
    /// applied.
    pub fn empty() -> Self {
        Self {
            criteria: Vec::new(),
        }
    }

    /// Set the constraint for a key, replacing any existing entry.
    pub fn set(&mut self, key: FilterKey, value: FilterValue) -> &mut Self {
        match self.criteria.iter_mut().find(|c| c.key == key) {
            Some(existing) => existing.value = value,
            None => self.criteria.push(FilterCriterion { key, value }),
        }
        self
    }

    /// The current constraint for a key, if one is present.
    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.criteria
            .iter()
            .find(|c| c.key == key)
            .map(|c| &c.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.criteria.iter()
    }
}

/// Apply the constraint set to an alert list.
///
/// Pure and deterministic: the result is a new list containing exactly the
/// alerts for which every non-wildcard criterion matches its field value
/// (logical AND across keys), in their original relative order.
pub fn apply_filters(alerts: &[Alert], filters: &FilterSet) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|alert| matches_all(alert, filters))
        .cloned()
        .collect()
}

fn matches_all(alert: &Alert, filters: &FilterSet) -> bool {
    filters.iter().all(|criterion| match &criterion.value {
        FilterValue::All => true,
        FilterValue::Text(expected) => criterion.key.extract(alert) == expected,
    })
}
