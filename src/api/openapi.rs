//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-relay REST API
//! using utoipa, generated at compile time.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-relay REST API
///
/// The document is served at:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-relay REST API",
        version = "0.1.0",
        description = "Resolves social-media post URLs to media download links by running scraping tasks on a remote task runner",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        crate::api::routes::fetch_media,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::MediaResponse,
        crate::api::routes::MediaQuery,
        crate::error::ApiError,
    )),
    tags(
        (name = "media", description = "Media link resolution"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
