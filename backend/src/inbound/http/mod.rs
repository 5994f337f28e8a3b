//! HTTP inbound adapter exposing the REST endpoints under `/api`.

pub mod auth;
pub mod error;
pub mod health;
pub mod schemas;
pub mod sections;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::{Scope, web};

pub use error::ApiResult;

/// The `/api` scope with every REST handler registered.
///
/// Malformed JSON bodies are answered with the shared error payload. The
/// bulk route is registered before `/sections/{id}` so `update-all` is not
/// taken for an id.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::inbound::http::api_scope;
///
/// let app = App::new().service(api_scope());
/// ```
pub fn api_scope() -> Scope {
    web::scope("/api")
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(sections::list_sections)
        .service(sections::create_section)
        .service(sections::update_all_sections)
        .service(sections::get_section)
        .service(sections::update_section)
        .service(sections::delete_section)
}
