use actix_web::middleware::NormalizePath;
use actix_web::{web, HttpServer};
use std::process;
use tracing_actix_web::TracingLogger;
use tracing_error::ErrorLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use roster::{config, database, http, App};

fn or_exit<T>(result: Result<T, impl std::fmt::Display>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            eprintln!("{error:#}");
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(ErrorLayer::default())
        .init();

    let config = or_exit(config::Server::load());
    let app = or_exit(App::new(config).await);

    or_exit(app.db.wait_until_healthy().await);
    or_exit(database::run_pending(&app.db).await);

    let addr = (app.config.ip.clone(), app.config.port);
    let server = or_exit(
        HttpServer::new(move || {
            actix_web::App::new()
                .app_data(web::Data::new(app.clone()))
                .app_data(http::error::json_config())
                .wrap(TracingLogger::default())
                .wrap(NormalizePath::trim())
                .configure(http::controllers::configure)
        })
        .bind(addr),
    );

    or_exit(server.run().await);
}
