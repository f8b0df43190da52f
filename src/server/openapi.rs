//! OpenAPI documentation and Swagger UI integration.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::AppContext;

/// OpenAPI documentation for subburn.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Subburn API",
        version = "0.1.0",
        description = "Burn SRT subtitles into uploaded video or audio files",
        license(name = "Apache-2.0", url = "https://www.apache.org/licenses/LICENSE-2.0"),
    ),
    paths(
        super::routes::root,
        super::routes::health,
        super::routes::upload_file,
    ),
    components(
        schemas(
            super::routes::UploadForm,
            super::routes::HealthResponse,
            super::error::ErrorResponse,
            crate::pipeline::OutputMode,
        )
    ),
    tags(
        (name = "subtitles", description = "Subtitle burning"),
        (name = "health", description = "Health check endpoints"),
        (name = "docs", description = "Documentation"),
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/docs`, OpenAPI document at `/openapi.json`
pub fn openapi_routes() -> Router<AppContext> {
    Router::new().merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}
