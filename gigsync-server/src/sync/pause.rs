use actix_web::{web, HttpResponse};
use tracing::*;

use gigsync_api::PauseSignal;

use crate::sync::LiveSync;

/// Largest accepted `token=value` body, in bytes.
const MAX_SIGNAL_BODY: usize = 512;

pub fn configure(cfg: &mut web::ServiceConfig) {
    for path in ["/wait", "/ready"] {
        cfg.service(web::resource(path).app_data(web::PayloadConfig::new(MAX_SIGNAL_BODY))
                                       .route(web::post().to(signal)));
    }
}

async fn signal(body: web::Bytes, live: web::Data<LiveSync>) -> HttpResponse {
    let signal = match std::str::from_utf8(&body).map(str::parse::<PauseSignal>) {
        Ok(Ok(signal)) => signal,
        Ok(Err(error)) => return HttpResponse::BadRequest().body(error.to_string()),
        Err(_) => return HttpResponse::BadRequest().body("body is not valid utf-8"),
    };

    trace!(token = %signal.token, state = ?signal.state, "Pause signal");

    live.broadcaster.apply(signal);

    HttpResponse::Accepted().finish()
}
