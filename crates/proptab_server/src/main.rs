use actix_web::{middleware, web, App, HttpResponse, HttpServer, Responder};
use log::info;
use serde::Deserialize;

mod config;
mod decide;
mod tableau;

use config::ServerConfig;

#[derive(Deserialize)]
struct ParseForm {
    formula: String,
    params: Option<String>,
}

#[derive(Deserialize)]
struct StateForm {
    state: String,
}

#[derive(Deserialize)]
struct MoveForm {
    state: String,
    r#move: String,
}

async fn index() -> impl Responder {
    HttpResponse::Ok().body(
        "proptab API Server

Decision endpoints:
tautology
satisfiable

Available calculus endpoints:
tableau",
    )
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/tautology", web::post().to(decide::tautology))
        .route("/satisfiable", web::post().to(decide::satisfiable))
        // Step-wise tableau
        .route("/tableau", web::get().to(tableau::tableau))
        .route("/tableau/parse", web::post().to(tableau::parse))
        .route("/tableau/validate", web::post().to(tableau::validate))
        .route("/tableau/move", web::post().to(tableau::r#move))
        .route("/tableau/close", web::post().to(tableau::close));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::load()?;
    let bind = config.bind.clone();
    info!("Starting server on {} (step cap {:?})", bind, config.max_steps);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
            .configure(routes)
    })
    .bind(bind)?
    .run()
    .await
}
