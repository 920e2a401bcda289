//! PostgreSQL-backed `ContactRepository` using the Diesel query builder.
//!
//! Every call checks out one pooled connection, runs a single statement and
//! releases the connection. Calls go through [`RetryPolicy`], so transient
//! connection failures are retried and each attempt is time-bounded.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;

use crate::domain::ports::{ContactRepository, ContactRepositoryError};
use crate::domain::{Contact, ContactDetails, ContactId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ContactChangeset, ContactRow, NewContactRow};
use super::pool::DbPool;
use super::retry::RetryPolicy;
use super::schema::contacts;

/// Diesel-backed implementation of the contact repository port.
#[derive(Clone)]
pub struct DieselContactRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl DieselContactRepository {
    /// Create a repository over `pool`, stamping timestamps from `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        Self { pool, clock, retry }
    }
}

#[async_trait]
impl ContactRepository for DieselContactRepository {
    async fn list_all(&self) -> Result<Vec<Contact>, ContactRepositoryError> {
        self.retry
            .run("list_all", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let rows: Vec<ContactRow> = contacts::table
                    .order((contacts::name.asc(), contacts::id.asc()))
                    .select(ContactRow::as_select())
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
                let row = contacts::table
                    .find(id.get())
                    .select(ContactRow::as_select())
                    .first::<ContactRow>(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?;
                Ok(row.map(Contact::from))
            })
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, ContactRepositoryError> {
        self.retry
            .run("find_by_email", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let row = contacts::table
                    .filter(contacts::email.eq(email))
                    .select(ContactRow::as_select())
                    .first::<ContactRow>(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?;
                Ok(row.map(Contact::from))
            })
            .await
    }

    async fn create(&self, details: &ContactDetails) -> Result<Contact, ContactRepositoryError> {
        let created_at = self.clock.utc();
        self.retry
            .run_write("create", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let row: ContactRow = diesel::insert_into(contacts::table)
                    .values(NewContactRow::new(details, created_at))
                    .returning(ContactRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(Contact::from(row))
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
                let row: Option<ContactRow> = diesel::update(contacts::table.find(id.get()))
                    .set(ContactChangeset::new(details, updated_at))
                    .returning(ContactRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?;
                row.map(Contact::from)
                    .ok_or_else(|| ContactRepositoryError::not_found(id))
            })
            .await
    }

    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        self.retry
            .run_write("delete", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let removed = diesel::delete(contacts::table.find(id.get()))
                    .execute(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                Ok(removed > 0)
            })
            .await
    }

    async fn exists(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        self.retry
            .run("exists", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                diesel::select(exists(contacts::table.find(id.get())))
                    .get_result::<bool>(&mut conn)
                    .await
                    .map_err(map_diesel_error)
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
                let same_email = contacts::table.filter(contacts::email.eq(email));
                let found = match excluding {
                    Some(excluded) => {
                        diesel::select(exists(same_email.filter(contacts::id.ne(excluded.get()))))
                            .get_result::<bool>(&mut conn)
                            .await
                    }
                    None => {
                        diesel::select(exists(same_email))
                            .get_result::<bool>(&mut conn)
                            .await
                    }
                };
                found.map_err(map_diesel_error)
            })
            .await
    }

    async fn ping(&self) -> Result<(), ContactRepositoryError> {
        self.retry
            .run_once("ping", || async move {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                diesel::sql_query("SELECT 1")
                    .execute(&mut conn)
                    .await
                    .map(|_| ())
                    .map_err(map_diesel_error)
            })
            .await
    }
}
