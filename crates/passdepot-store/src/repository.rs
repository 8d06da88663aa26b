//! Generic repositories over the entity records.
//!
//! A repository owns the persisted representation of one record type:
//! filtered lookups through the query builder, dirty-field inserts and
//! updates, and the revision-resolution joins. All reads and writes take an
//! explicit [`Scope`] so a forgotten user context cannot leak cross-user
//! rows.

use std::marker::PhantomData;

use passdepot_core::db::DatabaseError;
use sqlx::Sqlite;
use sqlx::sqlite::SqliteArguments;

use crate::db::StoreDatabase;
use crate::entity::{ModelRecord, Record, RevisionRecord, Share, Value};
use crate::error::StoreError;
use crate::query::{self, BuiltQuery, FieldFilter, Scope};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;
type SqliteQueryAs<'q, E> = sqlx::query::QueryAs<'q, Sqlite, E, SqliteArguments<'q>>;

fn bind<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Text(s) => query.bind(s.clone()),
        Value::Int(i) => query.bind(*i),
        Value::Bool(b) => query.bind(*b),
        Value::Null => query.bind(Option::<String>::None),
    }
}

fn bind_as<'q, E>(query: SqliteQueryAs<'q, E>, value: &Value) -> SqliteQueryAs<'q, E> {
    match value {
        Value::Text(s) => query.bind(s.clone()),
        Value::Int(i) => query.bind(*i),
        Value::Bool(b) => query.bind(*b),
        Value::Null => query.bind(Option::<String>::None),
    }
}

/// CRUD plus filtered lookups for one record type.
#[derive(Clone)]
pub struct Repository<E: Record> {
    db: StoreDatabase,
    _record: PhantomData<E>,
}

impl<E: Record> Repository<E> {
    pub const fn new(db: StoreDatabase) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    pub const fn database(&self) -> &StoreDatabase {
        &self.db
    }

    /// Exact-match lookup by store identity.
    pub async fn find_by_id(&self, scope: &Scope, id: i64) -> Result<E, StoreError> {
        self.find_one_by_fields(scope, &[FieldFilter::eq("id", Value::Int(id))])
            .await
    }

    /// Exact-match lookup by external identifier.
    pub async fn find_by_uuid(&self, scope: &Scope, uuid: &str) -> Result<E, StoreError> {
        self.find_one_by_fields(scope, &[FieldFilter::eq("uuid", Value::text(uuid))])
            .await
    }

    /// All non-deleted records visible in the scope.
    pub async fn find_all(&self, scope: &Scope) -> Result<Vec<E>, StoreError> {
        let query = query::select_scoped(E::TABLE, scope);
        self.fetch_all(&query).await
    }

    /// All non-deleted records owned by the given user.
    pub async fn find_all_by_user_id(
        &self,
        scope: &Scope,
        user_id: &str,
    ) -> Result<Vec<E>, StoreError> {
        self.find_all_by_fields(scope, &[FieldFilter::eq("user_id", Value::text(user_id))])
            .await
    }

    /// All soft-deleted records visible in the scope.
    pub async fn find_all_deleted(&self, scope: &Scope) -> Result<Vec<E>, StoreError> {
        let query = query::select_deleted(E::TABLE, scope);
        self.fetch_all(&query).await
    }

    /// One record matching every filter; zero rows is `NotFound`, more than
    /// one is `Ambiguous`.
    pub async fn find_one_by_fields(
        &self,
        scope: &Scope,
        filters: &[FieldFilter],
    ) -> Result<E, StoreError> {
        let mut rows = self.find_all_by_fields(scope, filters).await?;
        let descriptor = || {
            let fields: Vec<&str> = filters.iter().map(|f| f.field.as_str()).collect();
            format!("{} by {}", E::TABLE, fields.join(", "))
        };

        match rows.len() {
            0 => Err(StoreError::NotFound(descriptor())),
            1 => rows.pop().ok_or_else(|| StoreError::NotFound(descriptor())),
            _ => Err(StoreError::Ambiguous(descriptor())),
        }
    }

    /// All records matching every filter.
    pub async fn find_all_by_fields(
        &self,
        scope: &Scope,
        filters: &[FieldFilter],
    ) -> Result<Vec<E>, StoreError> {
        let mut query = query::select_scoped(E::TABLE, scope);
        query::apply_filters(&mut query, None, filters, E::FORBIDDEN_FIELDS)?;
        self.fetch_all(&query).await
    }

    /// Persist a new record. Only fields marked dirty since construction
    /// are written; the generated identity is assigned back onto the record
    /// and the dirty set cleared.
    pub async fn insert(&self, record: &mut E) -> Result<(), StoreError> {
        let fields = record.dirty_fields();
        if fields.is_empty() {
            return Err(StoreError::InvalidQuery(
                "no fields marked for insert".to_string(),
            ));
        }

        let columns = fields.join(", ");
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            E::TABLE
        );

        let mut statement = sqlx::query(&sql);
        for field in &fields {
            statement = bind(statement, &record.value(field));
        }

        let result = statement
            .execute(self.db.pool())
            .await
            .map_err(DatabaseError::from)?;

        record.assign_id(result.last_insert_rowid());
        record.clear_dirty();

        Ok(())
    }

    /// Write a record's dirty fields back. A clean record is a no-op that
    /// issues no store write; a record without an identity is an error. The
    /// identity column itself is never updated.
    pub async fn update(&self, record: &mut E) -> Result<(), StoreError> {
        let fields: Vec<&'static str> = record
            .dirty_fields()
            .into_iter()
            .filter(|field| *field != "id")
            .collect();
        if fields.is_empty() {
            return Ok(());
        }

        let id = record.id().ok_or(StoreError::MissingIdentity)?;

        let assignments: Vec<String> = fields.iter().map(|field| format!("{field} = ?")).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            E::TABLE,
            assignments.join(", ")
        );

        let mut statement = sqlx::query(&sql);
        for field in &fields {
            statement = bind(statement, &record.value(field));
        }
        statement = statement.bind(id);

        statement
            .execute(self.db.pool())
            .await
            .map_err(DatabaseError::from)?;

        record.clear_dirty();

        Ok(())
    }

    /// Hard-delete a record. Retention path only; regular removal is the
    /// soft-delete flag.
    pub async fn destroy(&self, record: &E) -> Result<(), StoreError> {
        let id = record.id().ok_or(StoreError::MissingIdentity)?;

        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        sqlx::query(&sql)
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(DatabaseError::from)?;

        Ok(())
    }

    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<E>, StoreError> {
        let mut statement = sqlx::query_as::<_, E>(&query.sql);
        for value in &query.binds {
            statement = bind_as(statement, value);
        }

        Ok(statement
            .fetch_all(self.db.pool())
            .await
            .map_err(DatabaseError::from)?)
    }
}

impl<R: RevisionRecord> Repository<R> {
    /// Resolve the current revision of a model.
    ///
    /// The double equality (`model.revision = revision.uuid` and
    /// `revision.model = model.uuid`) guarantees the returned revision is
    /// truly current; a stale revision whose model has moved on is excluded
    /// by construction.
    pub async fn find_current_revision_by_model(
        &self,
        scope: &Scope,
        model_uuid: &str,
    ) -> Result<R, StoreError> {
        let mut sql = format!(
            "SELECT r.* FROM {revisions} r INNER JOIN {models} m ON r.model = m.uuid \
             WHERE r.deleted = ? AND m.deleted = ? AND m.user_id = r.user_id \
             AND m.revision = r.uuid AND m.uuid = ?",
            revisions = R::TABLE,
            models = R::MODEL_TABLE,
        );
        let mut binds = vec![Value::Bool(false), Value::Bool(false), Value::text(model_uuid)];

        if let Some(user_id) = scope.user_id() {
            sql.push_str(" AND m.user_id = ?");
            binds.push(Value::text(user_id));
        }

        let mut rows = self.fetch_all(&BuiltQuery { sql, binds }).await?;
        let descriptor = || format!("current revision of {} {model_uuid}", R::MODEL_TABLE);

        match rows.len() {
            0 => Err(StoreError::NotFound(descriptor())),
            1 => rows.pop().ok_or_else(|| StoreError::NotFound(descriptor())),
            _ => Err(StoreError::Ambiguous(descriptor())),
        }
    }

    /// Every revision ever created for a model, current or not.
    pub async fn find_all_by_model(
        &self,
        scope: &Scope,
        model_uuid: &str,
    ) -> Result<Vec<R>, StoreError> {
        self.find_all_by_fields(scope, &[FieldFilter::eq("model", Value::text(model_uuid))])
            .await
    }
}

impl<M: ModelRecord> Repository<M> {
    /// Models whose current revision matches the given filters, resolved
    /// through the `revision = uuid` join.
    pub async fn find_all_by_revision_fields(
        &self,
        scope: &Scope,
        filters: &[FieldFilter],
    ) -> Result<Vec<M>, StoreError> {
        let mut query = query::select_join_scoped(
            M::TABLE,
            <M::Revision as Record>::TABLE,
            "revision",
            "uuid",
            scope,
        )?;
        query::apply_filters(
            &mut query,
            Some("b"),
            filters,
            <M::Revision as Record>::FORBIDDEN_FIELDS,
        )?;
        self.fetch_all(&query).await
    }
}

impl Repository<Share> {
    /// Shares a user participates in, as owner or receiver.
    ///
    /// The user argument is the scope here; the caller's own user context
    /// does not additionally narrow the lookup.
    pub async fn find_all_by_user_or_receiver(
        &self,
        user_id: &str,
    ) -> Result<Vec<Share>, StoreError> {
        let query = BuiltQuery {
            sql: "SELECT * FROM shares WHERE deleted = ? AND (user_id = ? OR receiver = ?)"
                .to_string(),
            binds: vec![
                Value::Bool(false),
                Value::text(user_id),
                Value::text(user_id),
            ],
        };
        self.fetch_all(&query).await
    }
}
