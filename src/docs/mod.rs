use utoipa::OpenApi;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::root,
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::diagnostics::diagnostics,
    ),
    components(
        schemas(HealthResponse, RootResponse, DiagnosticsResponse, RoomDiagnostics, ErrorResponse)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
