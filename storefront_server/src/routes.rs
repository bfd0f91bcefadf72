//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker
//! threads and thus don’t block execution.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use paypal_tools::{IpnPayload, IpnVerification, PayPalConfig};
use sfp_common::helpers::mask_email;
use storefront_engine::{
    traits::{OrderManagement, StorefrontDatabase},
    OrderFlowApi,
    OrdersApi,
};

use crate::{
    data_objects::{DeleteOrderParams, IpnDiagnostics, JsonResponse, OrdersQuery, UpdateStatusParams},
    errors::ServerError,
    integrations::paypal::process_ipn,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   PayPal IPN  ----------------------------------------------------
route!(ipn_listener => Post "/ipn" impl StorefrontDatabase, IpnVerification);
/// The PayPal Instant Payment Notification listener.
///
/// PayPal retries any message that is not acknowledged with a `200`, so this handler acknowledges every message with
/// `200 OK`, including ones that fail verification or refer to unknown orders. Failures are only visible in the logs.
///
/// A message is acted on only if PayPal confirms it (`VERIFIED`) and it was addressed to the configured business
/// account. The payment status is then reconciled onto the order named in `custom` (or `invoice`).
pub async fn ipn_listener<B, V>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
    verifier: web::Data<V>,
    config: web::Data<PayPalConfig>,
) -> HttpResponse
where
    B: StorefrontDatabase,
    V: IpnVerification,
{
    let payload = IpnPayload::from_form_bytes(&body);
    info!("🅿️ IPN message received. {}", payload.payment_summary());
    debug!("🅿️ IPN payer: {}", payload.payer_summary());
    debug!("🅿️ IPN shipping: {}", payload.shipping_summary());
    if !payload.extra.is_empty() {
        trace!("🅿️ IPN extra fields: {:?}", payload.extra);
    }
    match process_ipn(&body, &payload, verifier.get_ref(), config.get_ref(), api.get_ref()).await {
        Ok(outcome) if outcome.is_updated() => {
            let order = outcome.order();
            info!("🅿️ IPN {} applied. Order {} is now {}", payload.txn_id, order.id, order.status);
        },
        Ok(outcome) => {
            info!("🅿️ IPN {} was already applied to order {}", payload.txn_id, outcome.order().id);
        },
        Err(e) if e.is_serious() => error!("🅿️ IPN {} could not be applied. {e}", payload.txn_id),
        Err(e) => warn!("🅿️ IPN {} ignored. {e}", payload.txn_id),
    }
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

/// Lets operators check that the listener is reachable and which PayPal environment it verifies against.
#[get("/ipn")]
pub async fn ipn_diagnostics(config: web::Data<PayPalConfig>) -> HttpResponse {
    trace!("💻️ Received IPN diagnostics request");
    let diagnostics = IpnDiagnostics {
        message: "PayPal IPN endpoint is active".to_string(),
        mode: config.mode.to_string(),
        business_email: mask_email(&config.business_email),
        timestamp: Utc::now(),
    };
    HttpResponse::Ok().json(diagnostics)
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl OrderManagement);
/// Lists orders, newest first, with their line items.
///
/// ## Query parameters
/// * `status` - Only return orders with this status. `all` (or leaving it out) returns every status.
/// * `search` - Case-insensitive text matched against the order id, order number and the shipping email and names.
/// * `page`, `limit` - One-based page number and page size. Defaults are 1 and 20.
pub async fn orders<B: OrderManagement>(
    query: web::Query<OrdersQuery>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.to_filter()?;
    debug!("💻️ GET orders. {filter:?}, page {} (limit {})", pagination.page(), pagination.limit());
    let page = api.search_orders(filter, pagination).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(page))
}

route!(update_order_status => Patch "/orders" impl StorefrontDatabase);
/// Changes the status of an order.
///
/// The body is `{"id": "...", "status": "..."}`. Responds with the order as stored after the change. Moving an order
/// into `paid` sends the customer an order confirmation.
pub async fn update_order_status<B: StorefrontDatabase>(
    body: web::Json<UpdateStatusParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (order_id, status) = body.into_inner().validate()?;
    info!("💻️ Status change request for order {order_id} to {status}");
    let outcome = api.modify_status_for_order(&order_id, status).await.map_err(|e| {
        debug!("💻️ Could not update order status. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(outcome.into_order()))
}

route!(delete_order => Delete "/orders" impl StorefrontDatabase);
/// Deletes an order and its line items. The order id is passed as the `id` query parameter.
pub async fn delete_order<B: StorefrontDatabase>(
    query: web::Query<DeleteOrderParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = query
        .into_inner()
        .id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServerError::InvalidQueryParameters("Order id is required".into()))?;
    info!("💻️ Delete request for order {order_id}");
    api.delete_order(&order_id).await.map_err(|e| {
        debug!("💻️ Could not delete order. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {order_id} deleted"))))
}
