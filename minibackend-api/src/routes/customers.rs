/// Customer endpoints
///
/// Each request is one unit of work: it acquires a scoped connection from the
/// pool, runs its statements, and releases the connection before the response
/// is sent. Creation runs inside a transaction that commits with the request.
///
/// # Endpoints
///
/// - `GET /customers` - List customers
/// - `GET /customers/:id` - Get one customer
/// - `POST /customers` - Create a customer
///
/// # Errors
///
/// - `404 Not Found`: No customer with that id
/// - `409 Conflict`: Email already exists
/// - `400 Bad Request`: Malformed JSON
/// - `422 Unprocessable Entity`: Validation failed, or a field or path
///   parameter has the wrong type
/// - `503 Service Unavailable`: No database connection available

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use minibackend_shared::models::customer::{CreateCustomer, Customer};
use serde::Deserialize;
use validator::Validate;

/// Create customer request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    pub address: Option<String>,
}

impl From<CreateCustomerRequest> for CreateCustomer {
    fn from(req: CreateCustomerRequest) -> Self {
        CreateCustomer {
            name: req.name,
            email: req.email,
            phone: req.phone,
            address: req.address,
        }
    }
}

/// List customers
///
/// # Endpoint
///
/// ```text
/// GET /customers
/// ```
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": 1,
///     "name": "Alice Smith",
///     "email": "alice@example.com",
///     "phone": "555-0100",
///     "address": null,
///     "created_at": "2025-01-03 12:00:00.123456"
///   }
/// ]
/// ```
pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    let customers = state
        .db
        .with_connection(|conn| Box::pin(Customer::list(conn)))
        .await?;

    Ok(Json(customers))
}

/// Get one customer
///
/// # Endpoint
///
/// ```text
/// GET /customers/:id
/// ```
pub async fn get_customer(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Customer>> {
    let Path(customer_id) = path?;

    let customer = state
        .db
        .with_connection(move |conn| Box::pin(Customer::find_by_id(conn, customer_id)))
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

    Ok(Json(customer))
}

/// Create a customer
///
/// # Endpoint
///
/// ```text
/// POST /customers
/// Content-Type: application/json
///
/// {
///   "name": "Alice Smith",
///   "email": "alice@example.com",
///   "phone": "555-0100"
/// }
/// ```
///
/// # Response
///
/// The stored customer, including its generated `id` and `created_at`.
pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> ApiResult<Json<Customer>> {
    let Json(req) = payload?;

    // Validate before touching the pool
    req.validate()?;

    let data = CreateCustomer::from(req);
    let customer = state
        .db
        .with_transaction(move |conn| Box::pin(Customer::create(conn, data)))
        .await?;

    tracing::info!(customer_id = customer.id, "Customer created");

    Ok(Json(customer))
}
