//! Generic table operations: equality-filtered reads and writes against a
//! named table, built through sea-query so they bind on both Postgres and
//! SQLite.

use sea_orm::sea_query::{Alias, Asterisk, Expr, Order, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, FromQueryResult, JsonValue, Statement, Value};

use crate::{DbError, DbPool, DbResult, ensure_identifier, log_failure};

/// Options for a generic read. Filters are equality-only, ordering supports
/// exactly one column and the limit is a plain truncation.
#[derive(Debug, Clone)]
pub struct TableQuery {
    pub filters: Vec<(String, JsonValue)>,
    pub order_by: Option<String>,
    pub ascending: bool,
    pub limit: Option<u64>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            order_by: None,
            ascending: true,
            limit: None,
        }
    }
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: impl Into<String>, value: JsonValue) -> Self {
        self.filters.push((column.into(), value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(column.into());
        self.ascending = ascending;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read rows from `table`, returning each row as a JSON object.
pub async fn fetch_rows(pool: &DbPool, table: &str, query: &TableQuery) -> DbResult<Vec<JsonValue>> {
    log_failure("fetch_rows", fetch_rows_inner(pool, table, query).await)
}

async fn fetch_rows_inner(
    pool: &DbPool,
    table: &str,
    query: &TableQuery,
) -> DbResult<Vec<JsonValue>> {
    let table = ensure_identifier(table)?;
    let mut stmt = Query::select();
    stmt.column(Asterisk).from(Alias::new(table));
    for (column, value) in &query.filters {
        stmt.and_where(filter_expr(column, value)?);
    }
    if let Some(column) = &query.order_by {
        let column = ensure_identifier(column)?;
        let direction = if query.ascending {
            Order::Asc
        } else {
            Order::Desc
        };
        stmt.order_by(Alias::new(column), direction);
    }
    if let Some(limit) = query.limit {
        stmt.limit(limit);
    }
    let rows = JsonValue::find_by_statement(pool.get_database_backend().build(&stmt))
        .all(pool)
        .await?;
    Ok(rows)
}

/// Insert a single row; returns the number of rows written.
pub async fn insert_row(
    pool: &DbPool,
    table: &str,
    row: &serde_json::Map<String, JsonValue>,
) -> DbResult<u64> {
    log_failure("insert_row", insert_row_inner(pool, table, row).await)
}

async fn insert_row_inner(
    pool: &DbPool,
    table: &str,
    row: &serde_json::Map<String, JsonValue>,
) -> DbResult<u64> {
    let table = ensure_identifier(table)?;
    if row.is_empty() {
        return Err(DbError::NoColumns);
    }
    let mut columns = Vec::with_capacity(row.len());
    let mut values: Vec<SimpleExpr> = Vec::with_capacity(row.len());
    for (column, value) in row {
        columns.push(Alias::new(ensure_identifier(column)?));
        values.push(bind_value(value).into());
    }
    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(table)).columns(columns);
    stmt.values(values)
        .map_err(|err| DbError::Db(sea_orm::DbErr::Custom(err.to_string())))?;
    let result = pool.execute(pool.get_database_backend().build(&stmt)).await?;
    Ok(result.rows_affected())
}

/// Update every row matching all equality filters; returns the affected count.
pub async fn update_rows(
    pool: &DbPool,
    table: &str,
    changes: &serde_json::Map<String, JsonValue>,
    filters: &[(String, JsonValue)],
) -> DbResult<u64> {
    log_failure(
        "update_rows",
        update_rows_inner(pool, table, changes, filters).await,
    )
}

async fn update_rows_inner(
    pool: &DbPool,
    table: &str,
    changes: &serde_json::Map<String, JsonValue>,
    filters: &[(String, JsonValue)],
) -> DbResult<u64> {
    let table = ensure_identifier(table)?;
    if changes.is_empty() {
        return Err(DbError::NoColumns);
    }
    let mut stmt = Query::update();
    stmt.table(Alias::new(table));
    for (column, value) in changes {
        let column = ensure_identifier(column)?;
        stmt.value(Alias::new(column), bind_value(value));
    }
    for (column, value) in filters {
        stmt.and_where(filter_expr(column, value)?);
    }
    let result = pool.execute(pool.get_database_backend().build(&stmt)).await?;
    Ok(result.rows_affected())
}

/// Delete every row matching all equality filters; returns the affected count.
pub async fn delete_rows(
    pool: &DbPool,
    table: &str,
    filters: &[(String, JsonValue)],
) -> DbResult<u64> {
    log_failure("delete_rows", delete_rows_inner(pool, table, filters).await)
}

async fn delete_rows_inner(
    pool: &DbPool,
    table: &str,
    filters: &[(String, JsonValue)],
) -> DbResult<u64> {
    let table = ensure_identifier(table)?;
    let mut stmt = Query::delete();
    stmt.from_table(Alias::new(table));
    for (column, value) in filters {
        stmt.and_where(filter_expr(column, value)?);
    }
    let result = pool.execute(pool.get_database_backend().build(&stmt)).await?;
    Ok(result.rows_affected())
}

/// Raw query execution. Privileged: only the admin surface may reach this.
pub async fn execute_raw(pool: &DbPool, sql: &str) -> DbResult<Vec<JsonValue>> {
    let stmt = Statement::from_string(pool.get_database_backend(), sql.to_string());
    log_failure(
        "execute_raw",
        JsonValue::find_by_statement(stmt)
            .all(pool)
            .await
            .map_err(Into::into),
    )
}

fn filter_expr(column: &str, value: &JsonValue) -> DbResult<SimpleExpr> {
    let column = ensure_identifier(column)?;
    let expr = Expr::col(Alias::new(column));
    Ok(if value.is_null() {
        expr.is_null()
    } else {
        expr.eq(bind_value(value))
    })
}

fn bind_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::String(None),
        JsonValue::Bool(flag) => (*flag).into(),
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.into()
            } else {
                number.as_f64().unwrap_or_default().into()
            }
        }
        JsonValue::String(text) => text.clone().into(),
        other => Value::Json(Some(Box::new(other.clone()))),
    }
}
