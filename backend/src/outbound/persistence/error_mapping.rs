//! Translation of pool and Diesel failures into contact repository errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::ContactRepositoryError;

use super::pool::PoolError;

/// Name of the unique index guarding contact emails.
pub(crate) const EMAIL_UNIQUE_INDEX: &str = "ix_contacts_email";

/// Pool failures mean no usable connection, which is worth retrying.
pub(crate) fn map_pool_error(error: PoolError) -> ContactRepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    ContactRepositoryError::connection(message)
}

/// Map Diesel errors, recognising email uniqueness and dropped connections.
pub(crate) fn map_diesel_error(error: DieselError) -> ContactRepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => debug!(
            ?kind,
            constraint = info.constraint_name(),
            message = info.message(),
            "diesel operation failed"
        ),
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(EMAIL_UNIQUE_INDEX) =>
        {
            ContactRepositoryError::duplicate_email()
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ContactRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => ContactRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => ContactRepositoryError::query("database query error"),
        DieselError::DeserializationError(_) | DieselError::SerializationError(_) => {
            ContactRepositoryError::query("row conversion error")
        }
        _ => ContactRepositoryError::query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    use super::*;

    struct Info {
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            Some("contacts")
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { constraint }))
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(error, ContactRepositoryError::Connection { .. }));
        assert!(error.to_string().contains("connection refused"));
    }

    #[rstest]
    fn email_unique_violation_maps_to_duplicate_email() {
        let error = map_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            Some(EMAIL_UNIQUE_INDEX),
        ));
        assert_eq!(error, ContactRepositoryError::DuplicateEmail);
    }

    #[rstest]
    fn other_unique_violations_stay_query_errors() {
        let error = map_diesel_error(database_error(
            DatabaseErrorKind::UniqueViolation,
            Some("contacts_pkey"),
        ));
        assert!(matches!(error, ContactRepositoryError::Query { .. }));
    }

    #[rstest]
    fn closed_connection_is_transient() {
        let error = map_diesel_error(database_error(DatabaseErrorKind::ClosedConnection, None));
        assert!(error.is_transient());
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let error = map_diesel_error(DieselError::NotFound);

        assert!(matches!(error, ContactRepositoryError::Query { .. }));
        assert!(error.to_string().contains("record not found"));
    }
}
