//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::domain::Bootstrapper;
use backend::inbound::http::api_scope;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api_scope())
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

async fn run_bootstrap(http_state: &HttpState, config: &ServerConfig) -> std::io::Result<()> {
    let Some(plan) = &config.bootstrap else {
        info!("startup provisioning disabled");
        return Ok(());
    };
    let outcome = Bootstrapper::new(
        http_state.auth.clone(),
        http_state.sections.clone(),
        http_state.section_commands.clone(),
    )
    .run(plan)
    .await
    .map_err(|err| std::io::Error::other(format!("startup provisioning failed: {err}")))?;
    info!(
        admin_created = outcome.admin_created,
        sections_seeded = outcome.sections_seeded,
        "startup provisioning finished"
    );
    Ok(())
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// Provisioning runs before the listener binds, so readiness only flips once
/// the default admin and sections exist.
///
/// # Errors
/// Propagates [`std::io::Error`] when provisioning, binding the socket or
/// starting the server fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);
    run_bootstrap(&http_state, &config).await?;
    let http_state = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    info!(addr = %config.bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
