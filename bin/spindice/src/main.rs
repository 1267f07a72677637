//! Match Engine Server Binary
//!
//! Serves the match lifecycle API and WebSocket live views, with the
//! agent filler, autoplay, and turn timeout loops running alongside.
//! Runs on BIND_ADDR (e.g. 0.0.0.0:8888).

#[tokio::main]
async fn main() {
    spin_core::log();
    spin_core::kys();
    spin_server::run().await.unwrap();
}
