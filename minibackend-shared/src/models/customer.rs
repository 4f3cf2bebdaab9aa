/// Customer model and database operations
///
/// # Schema
///
/// The table is created by the course schema scripts, not by this service:
///
/// ```sql
/// CREATE TABLE customers (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     phone VARCHAR(50),
///     address TEXT,
///     created_at TIMESTAMP NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `created_at` is read back as PostgreSQL renders it (`created_at::text`), so
/// the model does not care whether the column is `TIMESTAMP` or `TIMESTAMPTZ`.
///
/// Every query is wrapped with [`instrument`] and logs its duration.

use crate::db::error::DbResult;
use crate::perf::instrument;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

/// A stored customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    /// Primary key
    pub id: i32,

    pub name: String,

    pub email: String,

    pub phone: Option<String>,

    pub address: Option<String>,

    /// Creation timestamp as text, e.g. `2025-01-03 12:00:00.123456`
    pub created_at: String,
}

/// Input for creating a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    /// Lists every customer ordered by id
    pub async fn list(conn: &mut PgConnection) -> DbResult<Vec<Self>> {
        let customers = instrument(
            "list_customers",
            sqlx::query_as::<_, Customer>(
                r#"
                SELECT id, name, email, phone, address, created_at::text AS created_at
                FROM customers
                ORDER BY id
                "#,
            )
            .fetch_all(conn),
        )
        .await?;

        Ok(customers)
    }

    /// Finds a customer by id
    ///
    /// Returns `None` if no customer has that id.
    pub async fn find_by_id(conn: &mut PgConnection, id: i32) -> DbResult<Option<Self>> {
        let customer = instrument(
            "get_customer",
            sqlx::query_as::<_, Customer>(
                r#"
                SELECT id, name, email, phone, address, created_at::text AS created_at
                FROM customers
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(conn),
        )
        .await?;

        Ok(customer)
    }

    /// Inserts a customer and returns the stored row
    ///
    /// The insert is not committed by this function. Run it through
    /// [`crate::db::Database::with_transaction`] so it commits with the unit of
    /// work, or on a plain scoped connection to autocommit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::db::DbError::Query`] on constraint violations such as
    /// a duplicate email.
    pub async fn create(conn: &mut PgConnection, data: CreateCustomer) -> DbResult<Self> {
        let customer = instrument(
            "create_customer",
            sqlx::query_as::<_, Customer>(
                r#"
                INSERT INTO customers (name, email, phone, address)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, email, phone, address, created_at::text AS created_at
                "#,
            )
            .bind(data.name)
            .bind(data.email)
            .bind(data.phone)
            .bind(data.address)
            .fetch_one(conn),
        )
        .await?;

        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_serializes_nullable_fields_as_null() {
        let customer = Customer {
            id: 7,
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            address: Some("12 St James's Square".to_string()),
            created_at: "2025-01-03 12:00:00".to_string(),
        };

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json["phone"].is_null());
        assert_eq!(json["address"], "12 St James's Square");
        assert_eq!(json["created_at"], "2025-01-03 12:00:00");
    }

    #[test]
    fn test_create_customer_optional_fields_default_to_none() {
        let data: CreateCustomer =
            serde_json::from_str(r#"{"name": "Grace", "email": "grace@example.com"}"#).unwrap();
        assert_eq!(data.name, "Grace");
        assert!(data.phone.is_none());
        assert!(data.address.is_none());
    }
}
