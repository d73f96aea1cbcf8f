//! Typed gateway query model
//!
//! The hosted data platform exposes a fluent builder: select columns, add
//! `eq`/`gte`/`lte` predicates, order, take a row range, execute. This module
//! captures that chain as a plain value so adapters can render it to whatever
//! transport they speak, and so tests can assert on exactly what was asked.
//!
//! Column names only ever come from the field enums below. Adapters can
//! therefore interpolate them into URLs or SQL without further escaping.
//!
//! # Example
//!
//! ```rust
//! use domain_policy::query::{GatewayQuery, PolicyField, RowRange, SortOrder, Table};
//!
//! let query = GatewayQuery::from(Table::Policies)
//!     .count_exact()
//!     .eq(PolicyField::Region, "East")
//!     .order(PolicyField::CreatedAt, SortOrder::Descending)
//!     .range(RowRange::for_page(2, 10));
//!
//! assert_eq!(query.range_bounds(), Some((10, 19)));
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use core_kernel::{PolicyId, PortError, ProfileId, Timestamp};

use crate::error::DashboardError;

/// Tables the dashboard reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Policies,
    Profiles,
    PolicyTypes,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Policies => "policies",
            Table::Profiles => "profiles",
            Table::PolicyTypes => "policy_types",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column on one of the dashboard tables
pub trait Field: Copy {
    fn column(&self) -> &'static str;
}

/// Columns of the `policies` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyField {
    Id,
    PolicyNumber,
    PolicyType,
    CoverageAmount,
    PremiumAmount,
    StartDate,
    EndDate,
    Status,
    Region,
    PolicyholderId,
    AgentId,
    CreatedAt,
    UpdatedAt,
}

impl PolicyField {
    pub const ALL: [PolicyField; 13] = [
        PolicyField::Id,
        PolicyField::PolicyNumber,
        PolicyField::PolicyType,
        PolicyField::CoverageAmount,
        PolicyField::PremiumAmount,
        PolicyField::StartDate,
        PolicyField::EndDate,
        PolicyField::Status,
        PolicyField::Region,
        PolicyField::PolicyholderId,
        PolicyField::AgentId,
        PolicyField::CreatedAt,
        PolicyField::UpdatedAt,
    ];
}

impl Field for PolicyField {
    fn column(&self) -> &'static str {
        match self {
            PolicyField::Id => "id",
            PolicyField::PolicyNumber => "policy_number",
            PolicyField::PolicyType => "policy_type",
            PolicyField::CoverageAmount => "coverage_amount",
            PolicyField::PremiumAmount => "premium_amount",
            PolicyField::StartDate => "start_date",
            PolicyField::EndDate => "end_date",
            PolicyField::Status => "status",
            PolicyField::Region => "region",
            PolicyField::PolicyholderId => "policyholder_id",
            PolicyField::AgentId => "agent_id",
            PolicyField::CreatedAt => "created_at",
            PolicyField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for PolicyField {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyField::ALL
            .iter()
            .copied()
            .find(|field| field.column() == s)
            .ok_or_else(|| DashboardError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Columns of the `profiles` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Id,
    FullName,
    Phone,
    Address,
    Region,
}

impl Field for ProfileField {
    fn column(&self) -> &'static str {
        match self {
            ProfileField::Id => "id",
            ProfileField::FullName => "full_name",
            ProfileField::Phone => "phone",
            ProfileField::Address => "address",
            ProfileField::Region => "region",
        }
    }
}

/// Columns of the `policy_types` lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyTypeField {
    Name,
}

impl Field for PolicyTypeField {
    fn column(&self) -> &'static str {
        match self {
            PolicyTypeField::Name => "name",
        }
    }
}

/// A scalar filter operand
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(Timestamp),
    Text(String),
}

impl ScalarValue {
    /// Empty text counts as "no filter"
    pub fn is_blank(&self) -> bool {
        matches!(self, ScalarValue::Text(text) if text.is_empty())
    }

    /// Textual form used in URLs and by the in-memory gateway
    pub fn render(&self) -> String {
        match self {
            ScalarValue::Bool(value) => value.to_string(),
            ScalarValue::Integer(value) => value.to_string(),
            ScalarValue::Decimal(value) => value.normalize().to_string(),
            ScalarValue::Date(value) => value.format("%Y-%m-%d").to_string(),
            ScalarValue::Timestamp(value) => value.to_rfc3339(),
            ScalarValue::Text(value) => value.clone(),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<Decimal> for ScalarValue {
    fn from(value: Decimal) -> Self {
        ScalarValue::Decimal(value)
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(value: NaiveDate) -> Self {
        ScalarValue::Date(value)
    }
}

impl From<Timestamp> for ScalarValue {
    fn from(value: Timestamp) -> Self {
        ScalarValue::Timestamp(value)
    }
}

impl From<PolicyId> for ScalarValue {
    fn from(value: PolicyId) -> Self {
        ScalarValue::Text(value.into_inner())
    }
}

impl From<ProfileId> for ScalarValue {
    fn from(value: ProfileId) -> Self {
        ScalarValue::Text(value.into_inner())
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

/// Predicate operators supported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
}

impl Comparison {
    pub fn keyword(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Gte => "gte",
            Comparison::Lte => "lte",
        }
    }
}

/// One `column op value` predicate; predicates on a query are ANDed
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub comparison: Comparison,
    pub value: ScalarValue,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Ascending)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(DashboardError::invalid_filter("order", format!("expected asc or desc, got '{}'", other))),
        }
    }
}

/// Ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: &'static str,
    pub order: SortOrder,
}

/// Zero-based inclusive row window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    /// Window for a 1-based page. Callers validate `page >= 1` and `page_size >= 1`.
    pub fn for_page(page: u32, page_size: u32) -> Self {
        let page = u64::from(page.max(1));
        let size = u64::from(page_size.max(1));
        let from = (page - 1) * size;
        Self {
            from,
            to: from + size - 1,
        }
    }

    /// Number of rows the window spans
    pub fn size(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Column projection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Columns(Vec<&'static str>),
}

impl Selection {
    pub fn of<F: Field>(fields: &[F]) -> Self {
        Selection::Columns(fields.iter().map(|field| field.column()).collect())
    }

    /// Renders as the comma-separated select list
    pub fn render(&self) -> String {
        match self {
            Selection::All => "*".to_string(),
            Selection::Columns(columns) => columns.join(","),
        }
    }
}

/// A complete read request against one table
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayQuery {
    pub table: Table,
    pub selection: Selection,
    pub count_exact: bool,
    pub predicates: Vec<Predicate>,
    pub ordering: Vec<Ordering>,
    pub range: Option<RowRange>,
    pub limit: Option<u64>,
}

impl From<Table> for GatewayQuery {
    fn from(table: Table) -> Self {
        Self {
            table,
            selection: Selection::All,
            count_exact: false,
            predicates: Vec::new(),
            ordering: Vec::new(),
            range: None,
            limit: None,
        }
    }
}

impl GatewayQuery {
    pub fn select(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Ask for the total number of rows matching the predicates, ignoring range and limit
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    pub fn eq<F: Field>(self, field: F, value: impl Into<ScalarValue>) -> Self {
        self.filter(field, Comparison::Eq, value)
    }

    pub fn gte<F: Field>(self, field: F, value: impl Into<ScalarValue>) -> Self {
        self.filter(field, Comparison::Gte, value)
    }

    pub fn lte<F: Field>(self, field: F, value: impl Into<ScalarValue>) -> Self {
        self.filter(field, Comparison::Lte, value)
    }

    pub fn filter<F: Field>(mut self, field: F, comparison: Comparison, value: impl Into<ScalarValue>) -> Self {
        self.predicates.push(Predicate {
            column: field.column(),
            comparison,
            value: value.into(),
        });
        self
    }

    pub fn order<F: Field>(mut self, field: F, order: SortOrder) -> Self {
        self.ordering.push(Ordering {
            column: field.column(),
            order,
        });
        self
    }

    pub fn range(mut self, range: RowRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `(from, to)` of the requested window, if any
    pub fn range_bounds(&self) -> Option<(u64, u64)> {
        self.range.map(|range| (range.from, range.to))
    }

    /// Effective `(offset, max_rows)` after combining range and limit
    pub fn window(&self) -> (u64, Option<u64>) {
        match (self.range, self.limit) {
            (Some(range), Some(limit)) => (range.from, Some(range.size().min(limit))),
            (Some(range), None) => (range.from, Some(range.size())),
            (None, limit) => (0, limit),
        }
    }
}

/// Raw gateway answer: rows plus the exact count when one was requested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub rows: Vec<serde_json::Value>,
    pub count: Option<u64>,
}

impl QueryResponse {
    pub fn new(rows: Vec<serde_json::Value>, count: Option<u64>) -> Self {
        Self { rows, count }
    }

    /// Decodes every row into `T`, failing on the first row that does not fit
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, PortError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                serde_json::from_value(row.clone()).map_err(|e| {
                    PortError::transformation(format!("row {}: {}", index, e))
                })
            })
            .collect()
    }
}
