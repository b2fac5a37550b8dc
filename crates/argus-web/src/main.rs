use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use argus_market::{Connector, YahooConnector};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{util::SubscriberInitExt, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_scalar::{Scalar, Servable as ScalarServable};

mod api;
mod cli;
mod error;

fn preprocess(trace: cli::TraceLevel) {
    let level = match trace {
        cli::TraceLevel::DEBUG => Level::DEBUG,
        cli::TraceLevel::INFO => Level::INFO,
        cli::TraceLevel::WARN => Level::WARN,
        cli::TraceLevel::ERROR => Level::ERROR,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    // also routes actix's `log` records (access log) through tracing
    if let Err(e) = subscriber.try_init() {
        eprintln!("tracing subscriber already set: {e}");
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // .env first; clap reads its variables
    dotenv::dotenv().ok();
    let args = cli::Cli::parse();
    preprocess(args.trace);

    let connector: Arc<dyn Connector> = Arc::new(YahooConnector::new(args.settings()));
    let openapi = api::ApiDoc::openapi();

    info!("Listening on http://{}:{}", args.host, args.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(web::Data::from(connector.clone()))
            // api endpoints
            .configure(api::routes)
            // api documentation
            .service(Redoc::with_url("/redoc", openapi.clone()))
            .service(Scalar::with_url("/scalar", openapi.clone()))
            .route("/openapi.json", {
                let doc = openapi.clone();
                web::get().to(move || {
                    let doc = doc.clone();
                    async move { HttpResponse::Ok().json(doc) }
                })
            })
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}
