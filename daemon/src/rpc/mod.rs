pub mod rpc;

use std::sync::Arc;

use actix_web::{
    dev::ServerHandle,
    error::Error,
    get,
    web::{self, Data},
    App, HttpResponse, HttpServer, Responder,
};
use anyhow::Context;
use log::{info, warn};
use meridian_common::config::VERSION;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::sync::Mutex;

use crate::core::{backend::Backend, config::RPCConfig, storage::Storage};

pub type SharedMeridianRpcServer = Arc<MeridianRpcServer>;

pub struct MeridianRpcServer {
    handle: Mutex<Option<ServerHandle>>,
}

impl MeridianRpcServer {
    pub async fn new<S: Storage>(
        backend: Arc<Backend<S>>,
        config: RPCConfig,
    ) -> Result<SharedMeridianRpcServer, anyhow::Error> {
        let server = Arc::new(Self {
            handle: Mutex::new(None),
        });

        let prometheus = if config.prometheus.enable {
            let (recorder, _) = PrometheusBuilder::new()
                .build()
                .context("Failed to create Prometheus handler")?;

            let handle = recorder.handle();
            metrics::set_global_recorder(Box::new(recorder))
                .context("Failed to set global recorder for Prometheus")?;

            if log::log_enabled!(log::Level::Info) {
                info!(
                    "Prometheus metrics enabled on route: {}",
                    config.prometheus.route
                );
            }
            Some((config.prometheus.route, handle))
        } else {
            None
        };

        if config.rpc_bind_address.starts_with("0.0.0.0") {
            warn!("RPC server is bound to all interfaces, admin routes have no authentication of their own");
            warn!("Restrict access to /admin with a firewall or an authenticating proxy");
        }

        if log::log_enabled!(log::Level::Info) {
            info!("Starting RPC server on {}", config.rpc_bind_address);
        }

        {
            let http_server = HttpServer::new(move || {
                let mut app = App::new()
                    .app_data(Data::from(Arc::clone(&backend)))
                    .app_data(web::Data::new(
                        prometheus.as_ref().map(|(_, handle)| handle.clone()),
                    ))
                    .configure(rpc::configure::<S>)
                    .service(index);

                if let Some((route, _)) = &prometheus {
                    app = app.route(route, web::get().to(prometheus_metrics));
                }
                app
            })
            .disable_signals()
            .bind(&config.rpc_bind_address)?
            .workers(config.rpc_threads)
            .run();

            {
                // save the server handle to be able to stop it later
                let handle = http_server.handle();
                let mut lock = server.handle.lock().await;
                *lock = Some(handle);
            }
            tokio::spawn(http_server);
        }

        Ok(server)
    }

    pub async fn stop(&self) {
        info!("Stopping RPC Server...");
        let mut handle = self.handle.lock().await;
        if let Some(handle) = handle.take() {
            handle.stop(false).await;
            info!("RPC Server is now stopped!");
        } else {
            warn!("RPC Server is not running!");
        }
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body(format!("Meridian ledger\nRunning on: {}", VERSION))
}

async fn prometheus_metrics(handle: Data<Option<PrometheusHandle>>) -> Result<HttpResponse, Error> {
    Ok(match handle.as_ref() {
        Some(handle) => {
            let metrics = handle.render();
            HttpResponse::Ok()
                .content_type("text/plain; version=0.0.4")
                .body(metrics)
        }
        None => HttpResponse::NotFound().body("Prometheus metrics are not enabled"),
    })
}
