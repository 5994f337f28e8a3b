//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler, the request and response DTOs,
//! the error schema wrappers from [`crate::inbound::http::schemas`] and the
//! bearer token security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for tooling.

use crate::inbound::http::auth::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserResponse,
};
use crate::inbound::http::health::HealthResponse;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::sections::{
    CreateSectionRequest, SectionBatchEntry, SectionBatchRequest, SectionResponse,
    UpdateSectionRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer scheme referenced by protected operations.
pub const BEARER_SCHEME: &str = "BearerToken";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token issued by POST /api/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Section CMS backend API",
        description = "Account sign-in and ordered page sections for the site editor."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::sections::list_sections,
        crate::inbound::http::sections::get_section,
        crate::inbound::http::sections::create_section,
        crate::inbound::http::sections::update_all_sections,
        crate::inbound::http::sections::update_section,
        crate::inbound::http::sections::delete_section,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserResponse,
        MessageResponse,
        SectionResponse,
        CreateSectionRequest,
        UpdateSectionRequest,
        SectionBatchEntry,
        SectionBatchRequest,
        HealthResponse
    )),
    tags(
        (name = "auth", description = "Registration and sign-in"),
        (name = "sections", description = "Ordered page sections"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
