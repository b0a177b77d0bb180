//! Actix Web HTTP server.
//!
//! Registers every entry of a [`RouteTable`] and relays the gateway's
//! [`ProxyResponse`] as JSON. CORS is open to all origins.

use crate::{
    client::{HttpMethod, ReqwestClient},
    config::ProxyConfig,
    gateway::{Gateway, ProxyResponse},
    routes::{self, RouteParams, RouteTable},
};
use actix_cors::Cors;
use actix_web::{http::Method, http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub async fn serve(config: ProxyConfig, table: RouteTable) -> Result<()> {
    let addr = config.bind_addr();
    let crypto_feed = config.crypto_feed;

    let client = ReqwestClient::new().context("failed to build reqwest client")?;
    let gateway = web::Data::new(Gateway::new(config, Arc::new(client)));

    info!(addr = %addr, %crypto_feed, "Veritas API Proxy listening");

    HttpServer::new(move || {
        let table = table.clone();
        App::new()
            .app_data(gateway.clone())
            .wrap(Cors::permissive())
            .configure(move |cfg| configure_routes(cfg, &table))
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}

/// Register each table entry. Handlers need a `web::Data<Gateway>` in app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig, table: &RouteTable) {
    for route in table.routes() {
        let endpoint = route.endpoint;
        let method = match route.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        cfg.route(
            &route.actix_path(),
            web::method(method).to(
                move |gateway: web::Data<Gateway>, req: HttpRequest, body: web::Bytes| async move {
                    let params: RouteParams = req.match_info().iter().collect();
                    let resp = routes::dispatch(&gateway, endpoint, &params, &body).await;
                    into_http_response(resp)
                },
            ),
        );
    }
}

fn into_http_response(resp: ProxyResponse) -> HttpResponse {
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(resp.body)
}
