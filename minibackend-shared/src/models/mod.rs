/// Database models for the mini backend
///
/// This module contains the database models and their queries. Queries take a
/// `&mut PgConnection` so they run on whatever connection the scoped acquirer
/// hands out, inside or outside a transaction.
///
/// # Models
///
/// - `customer`: customer records
///
/// # Example
///
/// ```no_run
/// use minibackend_shared::db::{Database, DbError};
/// use minibackend_shared::models::customer::Customer;
///
/// # async fn example(db: Database) -> Result<(), DbError> {
/// let customers = db
///     .with_connection(|conn| Box::pin(Customer::list(conn)))
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod customer;
