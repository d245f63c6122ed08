//! Filter grammar - boolean trees of field constraints
//!
//! A [`Filter`] is either a leaf constraint (`field comparator value`) or a
//! group joining child filters with AND/OR. Groups nest to any depth. A plain
//! field/value mapping ([`Payload`]) converts into an AND group of equality
//! leaves.
//!
//! ```
//! use quill_orm::filter::{and, or, Filter};
//!
//! // name = 'Renan' AND age = 25, OR age = 27
//! let filter = or([
//!     and([Filter::eq("name", "Renan"), Filter::eq("age", 25)]),
//!     Filter::eq("age", 27),
//! ]);
//! assert_eq!(filter.leaf_count(), 3);
//! ```

use std::fmt;

use crate::model::Payload;
use crate::value::DatabaseValue;

/// Comparison applied by a leaf constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Is,
    Like,
    ILike,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Eq => write!(f, "="),
            Comparator::Is => write!(f, "IS"),
            Comparator::Like => write!(f, "LIKE"),
            Comparator::ILike => write!(f, "ILIKE"),
        }
    }
}

/// Boolean operator joining a group's children
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    #[default]
    And,
    Or,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOperator::And => write!(f, "AND"),
            FilterOperator::Or => write!(f, "OR"),
        }
    }
}

/// Single `field comparator value` constraint
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    pub field: String,
    pub comparator: Comparator,
    pub value: DatabaseValue,
}

/// Child filters joined by one operator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGroup {
    pub operator: FilterOperator,
    pub children: Vec<Filter>,
}

/// Query restriction tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Leaf(FilterLeaf),
    Group(FilterGroup),
}

impl Filter {
    pub fn leaf(
        field: impl Into<String>,
        comparator: Comparator,
        value: impl Into<DatabaseValue>,
    ) -> Self {
        Filter::Leaf(FilterLeaf {
            field: field.into(),
            comparator,
            value: value.into(),
        })
    }

    pub fn eq(field: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        Self::leaf(field, Comparator::Eq, value)
    }

    pub fn is(field: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        Self::leaf(field, Comparator::Is, value)
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<DatabaseValue>) -> Self {
        Self::leaf(field, Comparator::Like, pattern)
    }

    pub fn ilike(field: impl Into<String>, pattern: impl Into<DatabaseValue>) -> Self {
        Self::leaf(field, Comparator::ILike, pattern)
    }

    /// Group of filters joined by `operator`
    pub fn group<I>(operator: FilterOperator, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Filter>,
    {
        Filter::Group(FilterGroup {
            operator,
            children: children.into_iter().map(Into::into).collect(),
        })
    }

    /// Filter with no restriction: matches every row
    pub fn empty() -> Self {
        Filter::Group(FilterGroup::default())
    }

    /// Equality constraints for every key of a mapping, conjoined
    ///
    /// Leaves are ordered by field name so the rendered statement is stable.
    pub fn matching(payload: Payload) -> Self {
        let mut leaves: Vec<(String, DatabaseValue)> = payload.into_iter().collect();
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        Self::group(
            FilterOperator::And,
            leaves.into_iter().map(|(field, value)| Filter::eq(field, value)),
        )
    }

    /// Join this filter and `other` with AND
    pub fn and(self, other: impl Into<Filter>) -> Self {
        self.combine(FilterOperator::And, other.into())
    }

    /// Join this filter and `other` with OR
    pub fn or(self, other: impl Into<Filter>) -> Self {
        self.combine(FilterOperator::Or, other.into())
    }

    // Appends to an existing group of the same operator instead of nesting.
    fn combine(self, operator: FilterOperator, other: Filter) -> Self {
        match self {
            Filter::Group(mut group) if group.operator == operator => {
                group.children.push(other);
                Filter::Group(group)
            }
            this => Self::group(operator, [this, other]),
        }
    }

    /// Whether this filter places no restriction on rows
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Leaf(_) => false,
            Filter::Group(group) => group.children.iter().all(Filter::is_empty),
        }
    }

    /// Number of leaf constraints in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Filter::Leaf(_) => 1,
            Filter::Group(group) => group.children.iter().map(Filter::leaf_count).sum(),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::empty()
    }
}

impl From<FilterLeaf> for Filter {
    fn from(leaf: FilterLeaf) -> Self {
        Filter::Leaf(leaf)
    }
}

impl From<FilterGroup> for Filter {
    fn from(group: FilterGroup) -> Self {
        Filter::Group(group)
    }
}

impl From<Payload> for Filter {
    fn from(payload: Payload) -> Self {
        Filter::matching(payload)
    }
}

/// Conjoin filters
pub fn and<I>(filters: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Filter>,
{
    Filter::group(FilterOperator::And, filters)
}

/// Disjoin filters
pub fn or<I>(filters: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Filter>,
{
    Filter::group(FilterOperator::Or, filters)
}
