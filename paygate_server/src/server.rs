use std::{net::SocketAddr, str::FromStr, sync::Arc};

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use log::*;
use paygate_engine::{
    registry::GatewayRegistry,
    PaymentOrchestrator,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        create_payment,
        create_payment_default,
        gateway_callback,
        health,
        payment_methods,
        reconcile,
        reconcile_totals,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // The registry is built once and shared; it is the only piece of state beyond the connection pool.
    let registry = Arc::new(
        GatewayRegistry::build(config.providers.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?,
    );
    if registry.is_empty() {
        warn!("🪛️ No payment providers are enabled. Create-payment and callback requests will all fail.");
    }
    let signature_policy = config.signature_policy;
    let fee_percent = config.platform_fee_percent;
    let srv = HttpServer::new(move || {
        let orchestrator = PaymentOrchestrator::new(db.clone(), Arc::clone(&registry), signature_policy);
        let reconciler = ReconciliationApi::new(db.clone(), fee_percent);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pgw::access_log"))
            .app_data(web::Data::new(orchestrator))
            .app_data(web::Data::new(reconciler))
            .service(health)
            .service(payment_methods)
            .service(create_payment)
            .service(create_payment_default)
            .service(gateway_callback)
            .service(reconcile_totals)
            .service(reconcile)
    });
    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))
        .map_err(|e| ServerError::InitializeError(format!("Invalid host/port configuration. {e}")))?;
    let srv = srv.bind(addr)?.run();
    Ok(srv)
}
