//! PostgreSQL-backed `ContactRepository` that calls stored functions.
//!
//! Each operation maps to one function created by the contacts migration
//! (`contacts_list`, `contacts_insert`, ...). Row-returning functions share
//! the table's column shape, so results decode into [`ContactRow`].

use std::sync::Arc;

use async_trait::async_trait;
use diesel::sql_query;
use diesel::sql_types::{Date, Integer, Nullable, Text, Timestamptz};
use diesel_async::RunQueryDsl;
use mockable::Clock;

use crate::domain::ports::{ContactRepository, ContactRepositoryError};
use crate::domain::{Contact, ContactDetails, ContactId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ContactRow, FlagRow};
use super::pool::DbPool;
use super::retry::RetryPolicy;

const LIST_SQL: &str = "SELECT * FROM contacts_list()";
const FIND_BY_ID_SQL: &str = "SELECT * FROM contacts_find_by_id($1)";
const FIND_BY_EMAIL_SQL: &str = "SELECT * FROM contacts_find_by_email($1)";
const INSERT_SQL: &str = "SELECT * FROM contacts_insert($1, $2, $3, $4, $5, $6)";
const UPDATE_SQL: &str = "SELECT * FROM contacts_update($1, $2, $3, $4, $5, $6, $7)";
const DELETE_SQL: &str = "SELECT contacts_delete($1) AS flag";
const EXISTS_SQL: &str = "SELECT contacts_exists($1) AS flag";
const EMAIL_EXISTS_SQL: &str = "SELECT contacts_email_exists($1, $2) AS flag";

/// Stored-function implementation of the contact repository port.
#[derive(Clone)]
pub struct DieselProcedureContactRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl DieselProcedureContactRepository {
    /// Create a repository over `pool`, stamping timestamps from `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        Self { pool, clock, retry }
    }
}

fn single_flag(rows: Vec<FlagRow>) -> bool {
    rows.into_iter().next().is_some_and(|row| row.flag)
}

#[async_trait]
impl ContactRepository for DieselProcedureContactRepository {
    async fn list_all(&self) -> Result<Vec<Contact>, ContactRepositoryError> {
        self.retry
            .run("list_all", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<ContactRow> = sql_query(LIST_SQL)
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(rows.into_iter().map(Contact::from).collect())
            })
            .await
    }

    async fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, ContactRepositoryError> {
        self.retry
            .run("find_by_id", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<ContactRow> = sql_query(FIND_BY_ID_SQL)
                    .bind::<Integer, _>(id.get())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(rows.into_iter().next().map(Contact::from))
            })
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, ContactRepositoryError> {
        self.retry
            .run("find_by_email", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<ContactRow> = sql_query(FIND_BY_EMAIL_SQL)
                    .bind::<Text, _>(email)
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(rows.into_iter().next().map(Contact::from))
            })
            .await
    }

    async fn create(&self, details: &ContactDetails) -> Result<Contact, ContactRepositoryError> {
        let created_at = self.clock.utc();
        self.retry
            .run_write("create", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<ContactRow> = sql_query(INSERT_SQL)
                    .bind::<Text, _>(details.name())
                    .bind::<Date, _>(details.birth_date())
                    .bind::<Nullable<Text>, _>(details.notes())
                    .bind::<Text, _>(details.phone())
                    .bind::<Text, _>(details.email())
                    .bind::<Timestamptz, _>(created_at)
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                rows.into_iter()
                    .next()
                    .map(Contact::from)
                    .ok_or_else(|| ContactRepositoryError::query("contacts_insert returned no row"))
            })
            .await
    }

    async fn update(
        &self,
        id: ContactId,
        details: &ContactDetails,
    ) -> Result<Contact, ContactRepositoryError> {
        let updated_at = self.clock.utc();
        self.retry
            .run("update", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<ContactRow> = sql_query(UPDATE_SQL)
                    .bind::<Integer, _>(id.get())
                    .bind::<Text, _>(details.name())
                    .bind::<Date, _>(details.birth_date())
                    .bind::<Nullable<Text>, _>(details.notes())
                    .bind::<Text, _>(details.phone())
                    .bind::<Text, _>(details.email())
                    .bind::<Timestamptz, _>(updated_at)
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                rows.into_iter()
                    .next()
                    .map(Contact::from)
                    .ok_or_else(|| ContactRepositoryError::not_found(id))
            })
            .await
    }

    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        self.retry
            .run_write("delete", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<FlagRow> = sql_query(DELETE_SQL)
                    .bind::<Integer, _>(id.get())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(single_flag(rows))
            })
            .await
    }

    async fn exists(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        self.retry
            .run("exists", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<FlagRow> = sql_query(EXISTS_SQL)
                    .bind::<Integer, _>(id.get())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(single_flag(rows))
            })
            .await
    }

    async fn email_exists(
        &self,
        email: &str,
        excluding: Option<ContactId>,
    ) -> Result<bool, ContactRepositoryError> {
        self.retry
            .run("email_exists", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<FlagRow> = sql_query(EMAIL_EXISTS_SQL)
                    .bind::<Text, _>(email)
                    .bind::<Nullable<Integer>, _>(excluding.map(ContactId::get))
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(single_flag(rows))
            })
            .await
    }

    async fn ping(&self) -> Result<(), ContactRepositoryError> {
        self.retry
            .run_once("ping", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                sql_query("SELECT 1")
                    .execute(&mut conn)
                    .await
                    .map(|_| ())
                    .map_err(map_diesel_error)
            })
            .await
    }
}
