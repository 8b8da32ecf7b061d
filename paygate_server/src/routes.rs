//! Request handler definitions.
//!
//! Handlers stay thin: parse the path and body, call into the engine API, map the result. Anything longer than a
//! screen belongs in the engine, not here. All handlers are async; the only suspension points are the engine calls
//! themselves.

use actix_web::{get, post, web, HttpResponse, Responder};
use log::*;
use paygate_engine::{
    db_types::{PaymentMethod, Region},
    providers::CallbackNotification,
    PaymentOrchestrator,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    data_objects::{JsonResponse, MethodsResponse, PaymentCreatedResponse, PaymentRequestParams},
    errors::ServerError,
};

type Orchestrator = PaymentOrchestrator<SqliteDatabase>;
type Reconciler = ReconciliationApi<SqliteDatabase>;

//----------------------------------------------   Health  ----------------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Payments  ---------------------------------------------------

/// Create a payment with an explicitly chosen method.
#[post("/payments/{region}/{method}")]
pub async fn create_payment(
    path: web::Path<(String, String)>,
    body: web::Json<PaymentRequestParams>,
    orchestrator: web::Data<Orchestrator>,
) -> Result<HttpResponse, ServerError> {
    let (region, method) = path.into_inner();
    let (region, method) = (Region::new(region), PaymentMethod::new(method));
    start_payment(&orchestrator, &region, Some(method), body.into_inner()).await
}

/// Create a payment using the region's default method.
#[post("/payments/{region}")]
pub async fn create_payment_default(
    path: web::Path<String>,
    body: web::Json<PaymentRequestParams>,
    orchestrator: web::Data<Orchestrator>,
) -> Result<HttpResponse, ServerError> {
    let region = Region::new(path.into_inner());
    start_payment(&orchestrator, &region, None, body.into_inner()).await
}

async fn start_payment(
    orchestrator: &Orchestrator,
    region: &Region,
    method: Option<PaymentMethod>,
    params: PaymentRequestParams,
) -> Result<HttpResponse, ServerError> {
    debug!("💳️ Create-payment request for link {} in {region}", params.link_id);
    let (order, result) = orchestrator.create_payment(region, method, &params.link_id, params.customer).await?;
    let response = PaymentCreatedResponse {
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        success: result.success,
        payment_url: result.payment_url,
        qr_code: result.qr_code,
        provider_tx_id: result.provider_tx_id,
        resp_code: result.resp_code,
        resp_msg: result.resp_msg,
    };
    Ok(HttpResponse::Ok().json(response))
}

#[get("/payments/{region}/methods")]
pub async fn payment_methods(
    path: web::Path<String>,
    orchestrator: web::Data<Orchestrator>,
) -> Result<HttpResponse, ServerError> {
    let region = Region::new(path.into_inner());
    let registry = orchestrator.registry();
    let response = MethodsResponse {
        region: region.to_string(),
        methods: registry.available_methods(&region),
        default_method: registry.default_method(&region),
        currencies: registry.region_currencies(&region),
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------  Callback  ---------------------------------------------------

/// The gateway notification endpoint.
///
/// Gateways deliver callbacks form-encoded or query-encoded depending on integration vintage, so both are
/// accepted. The response is HTTP 200 with `{success, message}` no matter what happened internally; anything other
/// than a 200 makes the gateway retry indefinitely.
#[post("/callback/{region}/{method}")]
pub async fn gateway_callback(
    path: web::Path<(String, String)>,
    form: Option<web::Form<CallbackNotification>>,
    query: Option<web::Query<CallbackNotification>>,
    orchestrator: web::Data<Orchestrator>,
) -> impl Responder {
    let (region, method) = path.into_inner();
    let (region, method) = (Region::new(region), PaymentMethod::new(method));
    let callback = match (form, query) {
        (Some(form), _) => form.into_inner(),
        (None, Some(query)) => query.into_inner(),
        (None, None) => {
            warn!("📨️ Discarding callback for {region}/{method} with an unreadable payload");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not parse the notification payload"));
        },
    };
    let order_no = callback.order_no.clone();
    match orchestrator.handle_callback(&region, &method, callback).await {
        Ok(outcome) => {
            debug!("📨️ Callback for order {} processed. Success: {}", outcome.order_id, outcome.success);
            HttpResponse::Ok().json(JsonResponse::success("Notification processed"))
        },
        Err(e) => {
            warn!("📨️ Callback for order {order_no} was not applied. {e}");
            HttpResponse::Ok().json(JsonResponse::failure(e))
        },
    }
}

//--------------------------------------------  Reconciliation  -----------------------------------------------

#[get("/reconcile")]
pub async fn reconcile(api: web::Data<Reconciler>) -> Result<HttpResponse, ServerError> {
    let report = api.reconcile().await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(report))
}

#[get("/reconcile/totals")]
pub async fn reconcile_totals(api: web::Data<Reconciler>) -> Result<HttpResponse, ServerError> {
    let totals = api.financial_totals().await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(totals))
}
