//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrowers, health, lendings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfmark API",
        version = "0.3.0",
        description = "Library lending platform REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::check_availability,
        // Borrowers
        borrowers::create_borrower,
        borrowers::get_borrower_lendings,
        // Lendings
        lendings::lend,
        lendings::dashboard,
        lendings::return_lending,
        lendings::cancel_lending,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::BorrowerInfo,
            crate::models::borrower::BorrowerRole,
            crate::models::borrower::CreateBorrower,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            books::AvailabilityResponse,
            // Lendings
            crate::models::lending::LendBook,
            crate::models::lending::LendingRecord,
            crate::models::lending::LendingStatus,
            crate::models::lending::Dashboard,
            crate::models::lending::DashboardEntry,
            lendings::LendingResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog and availability"),
        (name = "borrowers", description = "Borrower management"),
        (name = "lendings", description = "Borrowing, reservations and returns")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
