//! Field-filtered query building.
//!
//! Translates caller-supplied `(field, value, operator)` tuples into SQL
//! with bound parameters. Every value reaches SQLite as a parameter; field
//! names are interpolated only after allow-list and identifier validation.
//! Every select is additionally scoped to `deleted = ?` and, when the
//! [`Scope`] carries a user id, `user_id = ?`.

use crate::entity::Value;
use crate::error::StoreError;

/// Operators a caller may use in a field filter.
pub const ALLOWED_OPERATORS: &[&str] = &["eq", "neq", "lt", "gt", "lte", "gte"];

/// One caller-supplied filter tuple.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
    pub operator: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: Value, operator: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value,
            operator: operator.into(),
        }
    }

    /// Shorthand for the common equality filter.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, value, "eq")
    }
}

/// The operating user context applied to every store access.
///
/// Scoping is a mandatory, explicit parameter on each repository call; an
/// unscoped (administrative) context sees all users' rows.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    user_id: Option<String>,
}

impl Scope {
    /// Scope limited to one user's rows.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// Unscoped administrative context.
    pub const fn unscoped() -> Self {
        Self { user_id: None }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// A composed SQL statement plus its bound parameters, in order.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// Base select over non-deleted rows, user-scoped when the scope carries a
/// user id.
pub fn select_scoped(table: &str, scope: &Scope) -> BuiltQuery {
    let mut sql = format!("SELECT * FROM {table} WHERE deleted = ?");
    let mut binds = vec![Value::Bool(false)];

    if let Some(user_id) = scope.user_id() {
        sql.push_str(" AND user_id = ?");
        binds.push(Value::text(user_id));
    }

    BuiltQuery { sql, binds }
}

/// Select over soft-deleted rows, user-scoped like [`select_scoped`].
pub fn select_deleted(table: &str, scope: &Scope) -> BuiltQuery {
    let mut sql = format!("SELECT * FROM {table} WHERE deleted = ?");
    let mut binds = vec![Value::Bool(true)];

    if let Some(user_id) = scope.user_id() {
        sql.push_str(" AND user_id = ?");
        binds.push(Value::text(user_id));
    }

    BuiltQuery { sql, binds }
}

/// Select joining a second table on `a.from_field = b.to_field`, with the
/// deleted/user scoping duplicated onto both sides of the join.
pub fn select_join_scoped(
    table: &str,
    to_table: &str,
    from_field: &str,
    to_field: &str,
    scope: &Scope,
) -> Result<BuiltQuery, StoreError> {
    check_identifier(from_field)?;
    check_identifier(to_field)?;

    let mut sql = format!(
        "SELECT a.* FROM {table} a INNER JOIN {to_table} b ON a.{from_field} = b.{to_field} \
         WHERE a.deleted = ? AND b.deleted = ?"
    );
    let mut binds = vec![Value::Bool(false), Value::Bool(false)];

    if let Some(user_id) = scope.user_id() {
        sql.push_str(" AND a.user_id = ? AND b.user_id = ?");
        binds.push(Value::text(user_id));
        binds.push(Value::text(user_id));
    }

    Ok(BuiltQuery { sql, binds })
}

/// Append the caller's filter tuples to a built query.
///
/// Rejects forbidden fields and unknown operators before any store access.
/// A `Null` value compiles to `IS NULL` under `eq` and `IS NOT NULL` under
/// any other operator; no parameter is bound either way.
pub fn apply_filters(
    query: &mut BuiltQuery,
    alias: Option<&str>,
    filters: &[FieldFilter],
    forbidden: &[&str],
) -> Result<(), StoreError> {
    for filter in filters {
        check_identifier(&filter.field)?;
        if forbidden.contains(&filter.field.as_str()) {
            return Err(StoreError::ForbiddenField(filter.field.clone()));
        }

        let operator = operator_sql(&filter.operator)?;
        let column = alias.map_or_else(
            || filter.field.clone(),
            |a| format!("{a}.{}", filter.field),
        );

        if filter.value.is_null() {
            let clause = if filter.operator == "eq" {
                "IS NULL"
            } else {
                "IS NOT NULL"
            };
            query.sql.push_str(&format!(" AND {column} {clause}"));
        } else {
            query.sql.push_str(&format!(" AND {column} {operator} ?"));
            query.binds.push(filter.value.clone());
        }
    }

    Ok(())
}

fn operator_sql(operator: &str) -> Result<&'static str, StoreError> {
    match operator {
        "eq" => Ok("="),
        "neq" => Ok("!="),
        "lt" => Ok("<"),
        "gt" => Ok(">"),
        "lte" => Ok("<="),
        "gte" => Ok(">="),
        other => Err(StoreError::InvalidQuery(format!(
            "operator {other:?} is not one of {ALLOWED_OPERATORS:?}"
        ))),
    }
}

/// Field names are interpolated into SQL, so they must be plain lowercase
/// identifiers; anything else is rejected as forbidden.
fn check_identifier(field: &str) -> Result<(), StoreError> {
    let safe = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if safe {
        Ok(())
    } else {
        Err(StoreError::ForbiddenField(field.to_string()))
    }
}
