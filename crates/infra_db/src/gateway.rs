//! PostgreSQL Data Gateway
//!
//! Implements the `DataGateway` port by rendering a `GatewayQuery` into a
//! single parameterised `SELECT`. Column names come from the domain's field
//! enums and are pushed verbatim; every operand is bound.
//!
//! Each row is returned as one `jsonb` value (`to_jsonb(t)` or a
//! `jsonb_build_object` of the selected columns). When an exact count is
//! requested, `COUNT(*) OVER ()` rides along on every row; an empty window
//! falls back to a separate `COUNT(*)` with the same predicates.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use tracing::{debug, instrument, warn};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};
use domain_policy::query::{Comparison, GatewayQuery, Predicate, ScalarValue, Selection};
use domain_policy::{DataGateway, QueryResponse};

use crate::error::DatabaseError;

const ROW_COLUMN: &str = "record";
const COUNT_COLUMN: &str = "total_count";

/// PostgreSQL-backed implementation of the `DataGateway` port
#[derive(Debug, Clone)]
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    /// Creates a new gateway over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn count_only(&self, query: &GatewayQuery) -> Result<u64, DatabaseError> {
        let mut builder = build_count(query);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}

/// Renders the `SELECT` for a query, window and ordering included
pub fn build_select(query: &GatewayQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");

    match &query.selection {
        Selection::All => {
            builder.push("to_jsonb(t)");
        }
        Selection::Columns(columns) => {
            builder.push("jsonb_build_object(");
            for (index, column) in columns.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push(format!("'{}', t.{}", column, column));
            }
            builder.push(")");
        }
    }
    builder.push(format!(" AS {}", ROW_COLUMN));

    if query.count_exact {
        builder.push(format!(", COUNT(*) OVER () AS {}", COUNT_COLUMN));
    }

    builder.push(format!(" FROM {} t", query.table.name()));
    push_predicates(&mut builder, &query.predicates);

    for (index, ordering) in query.ordering.iter().enumerate() {
        builder.push(if index == 0 { " ORDER BY " } else { ", " });
        builder.push(format!(
            "t.{} {}",
            ordering.column,
            if ordering.order.is_ascending() { "ASC" } else { "DESC" }
        ));
    }

    let (offset, max_rows) = query.window();
    if let Some(max_rows) = max_rows {
        builder.push(" LIMIT ");
        builder.push_bind(max_rows as i64);
    }
    if offset > 0 {
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);
    }

    builder
}

/// Renders `SELECT COUNT(*)` over the query's predicates
pub fn build_count(query: &GatewayQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} t", query.table.name()));
    push_predicates(&mut builder, &query.predicates);
    builder
}

fn push_predicates(builder: &mut QueryBuilder<'static, Postgres>, predicates: &[Predicate]) {
    for (index, predicate) in predicates.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });

        let operator = match predicate.comparison {
            Comparison::Eq => "=",
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
        };

        // Text operands compare against the column's text form, which covers
        // uuid and enum columns as well as plain text.
        match &predicate.value {
            ScalarValue::Text(_) => builder.push(format!("t.{}::text {} ", predicate.column, operator)),
            _ => builder.push(format!("t.{} {} ", predicate.column, operator)),
        };

        match &predicate.value {
            ScalarValue::Bool(value) => builder.push_bind(*value),
            ScalarValue::Integer(value) => builder.push_bind(*value),
            ScalarValue::Decimal(value) => builder.push_bind(*value),
            ScalarValue::Date(value) => builder.push_bind(*value),
            ScalarValue::Timestamp(value) => builder.push_bind(value.to_utc()),
            ScalarValue::Text(value) => builder.push_bind(value.clone()),
        };
    }
}

fn decode_row(row: &PgRow, with_count: bool) -> Result<(serde_json::Value, Option<i64>), DatabaseError> {
    let value: serde_json::Value = row.try_get(ROW_COLUMN)?;
    let count = if with_count {
        Some(row.try_get::<i64, _>(COUNT_COLUMN)?)
    } else {
        None
    };
    Ok((value, count))
}

impl DomainPort for PostgresGateway {}

#[async_trait]
impl HealthCheckable for PostgresGateway {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("postgres-gateway", latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-gateway",
                latency_ms,
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl DataGateway for PostgresGateway {
    #[instrument(skip(self, query, metadata), fields(table = %query.table))]
    async fn execute(
        &self,
        query: GatewayQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<QueryResponse, PortError> {
        let correlation_id = metadata.and_then(|m| m.correlation_id);
        let mut builder = build_select(&query);
        debug!(sql = builder.sql(), correlation_id = ?correlation_id, "Executing gateway query");

        let rows = builder.build().fetch_all(&self.pool).await.map_err(|e| {
            warn!(error = %e, "Gateway query failed");
            PortError::from(DatabaseError::from(&e))
        })?;

        let mut values = Vec::with_capacity(rows.len());
        let mut window_count = None;
        for row in &rows {
            let (value, count) = decode_row(row, query.count_exact)?;
            values.push(value);
            window_count = window_count.or(count);
        }

        let count = match (query.count_exact, window_count) {
            (false, _) => None,
            (true, Some(count)) => Some(count.max(0) as u64),
            (true, None) => Some(self.count_only(&query).await?),
        };

        debug!(rows = values.len(), count = ?count, "Gateway query complete");
        Ok(QueryResponse::new(values, count))
    }
}
