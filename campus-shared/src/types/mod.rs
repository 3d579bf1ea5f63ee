pub mod api;
pub mod auth;
pub mod event;
pub mod pagination;

pub use api::{ApiErrorDetail, ApiErrorResponse, ApiResponse, HealthCheck, HealthResponse, HealthStatus};
pub use auth::{Claims, JwtSecret, RequestContext, UserRole};
pub use event::{ChangeAction, ChangeEvent, Table};
pub use pagination::{Paginated, PaginationParams};
