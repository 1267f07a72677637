//! HTTP and WebSocket surface for the match engine.
//!
//! Thin layer over `spin-lobby`: handlers translate identity and domain
//! errors, the bridge relays live snapshots, and [`run`] wires the
//! background loops (filler, autoplay, timeout sweep) next to the
//! `actix-web` app.
//!
//! ## Submodules
//!
//! - [`handlers`] — route handlers and error → status mapping
//! - [`bridge`] — per-spectator WebSocket pump

pub mod bridge;
pub mod handlers;

pub use bridge::bridge;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use spin_agents::Autoplay;
use spin_agents::Backfill;
use spin_database::Db;
use spin_live::Live;
use spin_lobby::Lobby;

async fn health(db: web::Data<Db>) -> impl Responder {
    let probe = async {
        let client = db.conn().await?;
        client.execute("SELECT 1", &[]).await
    }
    .await;
    match probe.inspect_err(|e| log::error!("health check failed: {}", e)) {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

#[rustfmt::skip]
pub async fn run() -> anyhow::Result<()> {
    let db = Db::from_env();
    db.setup().await?;
    let lobby = Lobby::new(db.clone(), Live::from_env());
    let filler = Backfill::new(lobby.clone());
    tokio::spawn(filler.clone().filler_loop());
    tokio::spawn(Autoplay::new(lobby.clone()).autoplay_loop());
    tokio::spawn(lobby.clone().sweep_loop());
    let lobby = web::Data::new(lobby);
    let filler = web::Data::new(filler);
    let db = web::Data::new(db);
    log::info!("starting match server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(lobby.clone())
            .app_data(filler.clone())
            .app_data(db.clone())
            .route("/health", web::get().to(health))
            .service(
                web::scope("/matches")
                    .route("/create", web::post().to(handlers::create))
                    .route("/roll", web::post().to(handlers::roll))
                    .route("/forfeit", web::post().to(handlers::forfeit))
                    .route("/abandon", web::post().to(handlers::abandon))
                    .route("/check", web::get().to(handlers::check))
                    .route("/ws/{match_id}", web::get().to(handlers::subscribe)),
            )
            .service(
                web::scope("/game")
                    .route("/stakes", web::get().to(handlers::stakes))
                    .route("/request", web::post().to(handlers::request)),
            )
    })
    .workers(6)
    .bind(std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"))?
    .run()
    .await?;
    Ok(())
}
