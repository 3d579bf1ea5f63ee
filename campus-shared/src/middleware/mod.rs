mod auth_extractor;
mod metrics_layer;
mod tracing_layer;

pub use auth_extractor::{validate_jwt, AdminContext, StaffContext};
pub use metrics_layer::{init_metrics, metrics_middleware, record_side_effect_failure};
pub use tracing_layer::init_tracing;
