use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
use paypal_tools::IpnVerifier;
use storefront_engine::{events::EventProducers, traits::StorefrontDatabase, OrderFlowApi, OrdersApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::{get_remote_ip, is_whitelisted},
    integrations::email::{create_email_event_handlers, EmailClient},
    routes::{
        health,
        ipn_diagnostics,
        DeleteOrderRoute,
        IpnListenerRoute,
        OrdersRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = if config.database_url.is_empty() {
        SqliteDatabase::new(25).await
    } else {
        SqliteDatabase::new_with_url(&config.database_url, 25).await
    };
    let mut db = db.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Database ready at {}", db.url());
    let verifier =
        IpnVerifier::new(config.paypal.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Verifying PayPal IPN messages against {}", config.paypal.ipn_verify_url());
    let mut producers = EventProducers::default();
    match EmailClient::new(&config.email).map_err(|e| ServerError::InitializeError(e.to_string()))? {
        Some(client) => {
            let handlers = create_email_event_handlers(client);
            producers = handlers.producers();
            let tasks = handlers.start_handlers();
            info!("🚀️ Started {} order confirmation email handler(s)", tasks.len());
        },
        None => info!("🚀️ Order confirmation emails are disabled"),
    }
    let srv = create_server_instance(config, db.clone(), verifier, producers)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    if let Err(e) = db.close().await {
        warn!("🗃️ Could not close the database cleanly. {e}");
    }
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    verifier: IpnVerifier,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let paypal_config = config.paypal.clone();
    let srv = HttpServer::new(move || {
        let order_flow_api = OrderFlowApi::new(db.clone(), producers.clone());
        let orders_api = OrdersApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sfp::access_log"))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::new(paypal_config.clone()));
        let use_x_forwarded_for = options.use_x_forwarded_for;
        let use_forwarded = options.use_forwarded;
        let paypal_whitelist = options.paypal_whitelist.clone();
        let paypal_scope = web::scope("/api/paypal")
            .wrap_fn(move |req, srv| {
                // Collect peer IP from x-forwarded-for, or forwarded headers _if_ `use_nnn` has been set to true
                // in the configuration. Otherwise, use the peer address from the connection info.
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = is_whitelisted(peer_ip, paypal_whitelist.as_deref());
                if whitelisted {
                    srv.call(req)
                } else {
                    ok(req.error_response(ServerError::ForbiddenPeer)).boxed_local()
                }
            })
            .service(IpnListenerRoute::<SqliteDatabase, IpnVerifier>::new())
            .service(ipn_diagnostics);
        let api_scope = web::scope("/api")
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new());
        app.service(health).service(paypal_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
