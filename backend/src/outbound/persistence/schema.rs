//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. The stored
//! functions created by the migrations return rows of the same shape, so the
//! procedure adapter reuses this table for `QueryableByName`.

diesel::table! {
    /// Contact records.
    ///
    /// `email` carries the unique index `ix_contacts_email`; `phone` is
    /// indexed for lookups.
    contacts (id) {
        /// Primary key assigned by the `SERIAL` sequence.
        id -> Int4,
        /// Display name (max 200 characters).
        name -> Varchar,
        /// Date of birth without time component.
        birth_date -> Date,
        /// Optional free-text notes (max 1000 characters in storage).
        notes -> Nullable<Varchar>,
        /// Phone number (max 20 characters in storage).
        phone -> Varchar,
        /// Email address (max 200 characters, unique).
        email -> Varchar,
        /// Insertion timestamp, written once.
        created_at -> Timestamptz,
        /// Last modification timestamp, absent until the first update.
        updated_at -> Nullable<Timestamptz>,
    }
}
