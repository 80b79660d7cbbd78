//! HTTP surface: `/stock`, `/stock/history` and their OpenAPI document.

use actix_web::{error::InternalError, middleware::Logger, web, App, HttpResponse, HttpServer};
use kessan_core::Provider;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod cli;
pub mod error;
pub mod openapi;

use crate::error::ErrorBody;
use crate::openapi::ApiDoc;

/// Register the stock routes, with query-string errors rendered as JSON.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query: {err}");
        warn!("400 Bad Request: {message}");
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorBody { error: message }),
        )
        .into()
    });

    cfg.app_data(query_config)
        .service(api::stock::stock)
        .service(api::stock::history);
}

/// Serve the API (and Swagger UI at `/swagger-ui/`) until the process is stopped.
pub async fn serve(host: &str, port: u16, provider: Arc<dyn Provider>) -> std::io::Result<()> {
    let openapi = ApiDoc::openapi();
    info!("Listening on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(provider.clone()))
            .configure(configure)
            // api documentation
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/openapi.json", openapi.clone()))
    })
    .bind((host, port))?
    .run()
    .await
}
