pub mod analytics;
pub mod handlers;
pub mod response;
pub mod routes;

pub use response::{ApiError, ApiResponse};
pub use routes::create_api_router;
