use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::*;

use gigsync_server::config::Config;
use gigsync_server::gigs::GigService;
use gigsync_server::sync::LiveSync;
use gigsync_server::shutdown::{stop_on, stop_signal};
use gigsync_server::{db, o11y, rest_api, sync};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    let opts = Config::parse();

    o11y::init(&opts.o11y)?;

    opts.sync.validate()?;

    info!("Initializing...");

    let db = db::init(&opts.db).await?;

    info!(" ⚡ Database");

    let gigs = GigService::new(db.sessions(), Arc::new(db.catalog()));

    info!(" ⚡ Gigs");

    let shutdown = CancellationToken::new();
    let live = LiveSync::new(&opts.sync, shutdown.clone());
    let ticker = live.broadcaster.spawn(opts.sync.tick_period(), shutdown.clone());

    info!(" ⚡ Live sync");

    info!(bind = opts.bind, port = opts.port, " ==== Gigsync server ==== ");

    let gigs_data = web::Data::new(gigs.clone());
    let live_data = web::Data::new(live);

    let server = HttpServer::new(move || {
                     App::new().wrap(Logger::default())
                               .app_data(gigs_data.clone())
                               .app_data(live_data.clone())
                               .configure(rest_api::configure)
                               .configure(sync::configure)
                 }).bind((opts.bind.as_str(), opts.port))?
                   .disable_signals()
                   .run();

    actix_web::rt::spawn(stop_on(stop_signal(), server.handle(), shutdown.clone()));

    server.await?;

    info!("Shutting down");

    // already cancelled by a stop request, this covers the server exiting on its own
    shutdown.cancel();
    ticker.await?;

    // a restarted server starts with no running gigs
    let purged = gigs.store().delete_all().await?;

    info!(purged, "Removed leftover gigs");

    Ok(())
}
