//! Dashboard Domain Ports
//!
//! This module defines the port interfaces the dashboard needs from the hosted
//! data platform, enabling swappable implementations (REST platform client,
//! direct PostgreSQL, in-memory mock).
//!
//! # Architecture
//!
//! - `DataGateway` executes one typed `GatewayQuery` and returns raw rows plus
//!   an optional exact count. Services decode rows into records.
//! - `AuthPort` exposes the current user and sign-out.
//!
//! Both are passed explicitly to the services that use them; nothing in this
//! crate reaches for a process-wide client.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_policy::ports::DataGateway;
//! use domain_policy::services::PolicyQueryService;
//! use std::sync::Arc;
//!
//! let gateway: Arc<dyn DataGateway> = Arc::new(RestGateway::new(config)?);
//! let service = PolicyQueryService::new(gateway);
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::query::{GatewayQuery, QueryResponse};
use crate::session::AuthUser;

/// Read access to the policy, profile, and policy-type tables
#[async_trait]
pub trait DataGateway: DomainPort + HealthCheckable {
    /// Executes a single query
    ///
    /// # Arguments
    ///
    /// * `query` - Table, projection, predicates, ordering, and row window
    /// * `metadata` - Optional operation metadata for tracing
    ///
    /// # Returns
    ///
    /// The matching rows and, when `query.count_exact` is set, the total number
    /// of rows matching the predicates regardless of the window
    async fn execute(
        &self,
        query: GatewayQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<QueryResponse, PortError>;
}

/// The authentication collaborator
#[async_trait]
pub trait AuthPort: DomainPort {
    /// The signed-in user, or `None` for an anonymous session
    async fn current_user(&self) -> Result<Option<AuthUser>, PortError>;

    /// Ends the session with the auth provider
    async fn sign_out(&self) -> Result<(), PortError>;
}

/// In-memory port implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::cmp::Ordering as CmpOrdering;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::Value;
    use tokio::sync::{oneshot, Mutex, RwLock};

    use core_kernel::{HealthCheckResult, Timestamp};

    use crate::query::{Comparison, Predicate, ScalarValue, Selection, SortOrder, Table};

    /// In-memory gateway evaluating queries over JSON rows
    ///
    /// Predicates follow SQL semantics for nulls: a null or missing cell never
    /// matches. Ordering puts nulls last ascending and first descending.
    #[derive(Debug, Default)]
    pub struct MockGateway {
        tables: Arc<RwLock<HashMap<Table, Vec<Value>>>>,
        failures: Arc<RwLock<HashMap<Table, String>>>,
        executed: Arc<Mutex<Vec<GatewayQuery>>>,
        gates: Arc<Mutex<VecDeque<oneshot::Receiver<()>>>>,
        unhealthy: Arc<AtomicBool>,
    }

    impl MockGateway {
        /// Creates an empty, healthy gateway
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates a table with serializable records
        pub async fn with_rows<T: serde::Serialize>(self, table: Table, rows: &[T]) -> Self {
            self.insert_rows(table, rows).await;
            self
        }

        /// Appends records to a table
        ///
        /// Panics if a record does not serialize; fixtures must be well formed.
        pub async fn insert_rows<T: serde::Serialize>(&self, table: Table, rows: &[T]) {
            let values: Vec<Value> = rows
                .iter()
                .map(|row| serde_json::to_value(row).expect("mock gateway rows must serialize to JSON"))
                .collect();
            self.tables.write().await.entry(table).or_default().extend(values);
        }

        /// Appends raw JSON rows, e.g. deliberately malformed ones
        pub async fn insert_raw(&self, table: Table, rows: Vec<Value>) {
            self.tables.write().await.entry(table).or_default().extend(rows);
        }

        /// Makes every query against `table` fail with a connection error
        pub async fn fail_table(&self, table: Table, message: impl Into<String>) {
            self.failures.write().await.insert(table, message.into());
        }

        /// Clears an injected failure
        pub async fn heal_table(&self, table: Table) {
            self.failures.write().await.remove(&table);
        }

        /// Holds the next call's response until the returned sender fires (or is dropped)
        pub async fn gate_next_call(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().await.push_back(rx);
            tx
        }

        /// Every query executed so far, in call order
        pub async fn executed_queries(&self) -> Vec<GatewayQuery> {
            self.executed.lock().await.clone()
        }

        pub fn set_healthy(&self, healthy: bool) {
            self.unhealthy.store(!healthy, Ordering::SeqCst);
        }

        fn evaluate(rows: &[Value], query: &GatewayQuery) -> QueryResponse {
            let mut matching: Vec<&Value> = rows
                .iter()
                .filter(|row| query.predicates.iter().all(|p| matches_predicate(row, p)))
                .collect();

            for ordering in query.ordering.iter().rev() {
                matching.sort_by(|a, b| {
                    let ordered = compare_cells(a.get(ordering.column), b.get(ordering.column));
                    match ordering.order {
                        SortOrder::Ascending => ordered,
                        SortOrder::Descending => ordered.reverse(),
                    }
                });
            }

            let count = query.count_exact.then_some(matching.len() as u64);
            let (offset, max_rows) = query.window();
            let rows = matching
                .into_iter()
                .skip(offset as usize)
                .take(max_rows.map(|n| n as usize).unwrap_or(usize::MAX))
                .map(|row| project(row, &query.selection))
                .collect();

            QueryResponse { rows, count }
        }
    }

    impl DomainPort for MockGateway {}

    #[async_trait]
    impl HealthCheckable for MockGateway {
        async fn health_check(&self) -> HealthCheckResult {
            if self.unhealthy.load(Ordering::SeqCst) {
                HealthCheckResult::unhealthy("mock-gateway", 0, "Marked unhealthy")
            } else {
                HealthCheckResult::healthy("mock-gateway", 0)
            }
        }
    }

    #[async_trait]
    impl DataGateway for MockGateway {
        async fn execute(
            &self,
            query: GatewayQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<QueryResponse, PortError> {
            let gate = self.gates.lock().await.pop_front();
            self.executed.lock().await.push(query.clone());

            if let Some(gate) = gate {
                let _ = gate.await;
            }

            if let Some(message) = self.failures.read().await.get(&query.table) {
                return Err(PortError::connection(message.clone()));
            }

            let tables = self.tables.read().await;
            let rows = tables.get(&query.table).map(Vec::as_slice).unwrap_or(&[]);
            Ok(Self::evaluate(rows, &query))
        }
    }

    fn project(row: &Value, selection: &Selection) -> Value {
        match (selection, row) {
            (Selection::Columns(columns), Value::Object(map)) => Value::Object(
                columns
                    .iter()
                    .filter_map(|c| map.get(*c).map(|v| (c.to_string(), v.clone())))
                    .collect(),
            ),
            _ => row.clone(),
        }
    }

    fn matches_predicate(row: &Value, predicate: &Predicate) -> bool {
        let cell = match row.get(predicate.column) {
            None | Some(Value::Null) => return false,
            Some(cell) => cell,
        };

        let ordering = match compare_to_scalar(cell, &predicate.value) {
            Some(ordering) => ordering,
            None => return false,
        };

        match predicate.comparison {
            Comparison::Eq => ordering == CmpOrdering::Equal,
            Comparison::Gte => ordering != CmpOrdering::Less,
            Comparison::Lte => ordering != CmpOrdering::Greater,
        }
    }

    fn compare_to_scalar(cell: &Value, value: &ScalarValue) -> Option<CmpOrdering> {
        match value {
            ScalarValue::Date(date) => {
                let bound = Timestamp::start_of(*date).ok()?;
                Some(Timestamp::parse(cell.as_str()?).ok()?.cmp(&bound))
            }
            ScalarValue::Timestamp(bound) => {
                Some(Timestamp::parse(cell.as_str()?).ok()?.cmp(bound))
            }
            ScalarValue::Integer(_) | ScalarValue::Decimal(_) => {
                let bound: Decimal = value.render().parse().ok()?;
                Some(cell_decimal(cell)?.cmp(&bound))
            }
            ScalarValue::Bool(bound) => Some(cell.as_bool()?.cmp(bound)),
            ScalarValue::Text(bound) => Some(cell.as_str()?.cmp(bound.as_str())),
        }
    }

    fn cell_decimal(cell: &Value) -> Option<Decimal> {
        match cell {
            Value::Number(n) => n.to_string().parse().ok(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
        let a = a.filter(|v| !v.is_null());
        let b = b.filter(|v| !v.is_null());
        match (a, b) {
            (None, None) => CmpOrdering::Equal,
            (None, Some(_)) => CmpOrdering::Greater,
            (Some(_), None) => CmpOrdering::Less,
            (Some(a), Some(b)) => {
                if let (Some(x), Some(y)) = (cell_decimal_strict(a), cell_decimal_strict(b)) {
                    return x.cmp(&y);
                }
                let (x, y) = (a.as_str(), b.as_str());
                if let (Some(x), Some(y)) = (x, y) {
                    if let (Ok(tx), Ok(ty)) = (Timestamp::parse(x), Timestamp::parse(y)) {
                        return tx.cmp(&ty);
                    }
                    return x.cmp(y);
                }
                a.to_string().cmp(&b.to_string())
            }
        }
    }

    fn cell_decimal_strict(cell: &Value) -> Option<Decimal> {
        match cell {
            Value::Number(n) => n.to_string().parse().ok(),
            _ => None,
        }
    }

    /// In-memory auth collaborator
    #[derive(Debug, Default)]
    pub struct MockAuth {
        user: RwLock<Option<AuthUser>>,
        sign_outs: AtomicUsize,
        fail_sign_out: AtomicBool,
    }

    impl MockAuth {
        /// An anonymous session
        pub fn anonymous() -> Self {
            Self::default()
        }

        /// A session with a signed-in user
        pub fn signed_in(user: AuthUser) -> Self {
            Self {
                user: RwLock::new(Some(user)),
                ..Default::default()
            }
        }

        /// Makes subsequent sign-outs fail
        pub fn fail_sign_out(&self) {
            self.fail_sign_out.store(true, Ordering::SeqCst);
        }

        /// Number of successful sign-outs
        pub fn sign_out_count(&self) -> usize {
            self.sign_outs.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockAuth {}

    #[async_trait]
    impl AuthPort for MockAuth {
        async fn current_user(&self) -> Result<Option<AuthUser>, PortError> {
            Ok(self.user.read().await.clone())
        }

        async fn sign_out(&self) -> Result<(), PortError> {
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: "mock-auth".to_string(),
                });
            }
            *self.user.write().await = None;
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

}
