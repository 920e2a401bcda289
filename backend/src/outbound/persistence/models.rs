//! Diesel row models for the contacts table.
//!
//! These types are internal to the persistence layer and map directly to
//! database rows. Conversion to domain types happens in the repositories.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::Bool;

use crate::domain::{Contact, ContactDetails, ContactId};

use super::schema::contacts;

/// Row read from `contacts` or from a stored function returning its shape.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContactRow {
    pub id: i32,
    pub name: String,
    pub birth_date: NaiveDate,
    pub notes: Option<String>,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        let ContactRow {
            id,
            name,
            birth_date,
            notes,
            phone,
            email,
            created_at,
            updated_at,
        } = row;
        Contact::new(
            ContactId::new(id),
            ContactDetails::from_stored(name, birth_date, notes, phone, email),
            created_at,
            updated_at,
        )
    }
}

/// Insertable row for new contacts.
#[derive(Debug, Insertable)]
#[diesel(table_name = contacts)]
pub(crate) struct NewContactRow<'a> {
    pub name: &'a str,
    pub birth_date: NaiveDate,
    pub notes: Option<&'a str>,
    pub phone: &'a str,
    pub email: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewContactRow<'a> {
    pub fn new(details: &'a ContactDetails, created_at: DateTime<Utc>) -> Self {
        Self {
            name: details.name(),
            birth_date: details.birth_date(),
            notes: details.notes(),
            phone: details.phone(),
            email: details.email(),
            created_at,
        }
    }
}

/// Full overwrite of a contact's mutable columns.
///
/// `notes` must be cleared when absent, so `None` is written as `NULL`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = contacts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ContactChangeset<'a> {
    pub name: &'a str,
    pub birth_date: NaiveDate,
    pub notes: Option<&'a str>,
    pub phone: &'a str,
    pub email: &'a str,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<'a> ContactChangeset<'a> {
    pub fn new(details: &'a ContactDetails, updated_at: DateTime<Utc>) -> Self {
        Self {
            name: details.name(),
            birth_date: details.birth_date(),
            notes: details.notes(),
            phone: details.phone(),
            email: details.email(),
            updated_at: Some(updated_at),
        }
    }
}

/// Single boolean column returned by existence checks in raw SQL.
#[derive(Debug, QueryableByName)]
pub(crate) struct FlagRow {
    #[diesel(sql_type = Bool)]
    pub flag: bool,
}
