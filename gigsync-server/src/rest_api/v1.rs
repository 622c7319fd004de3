use actix_web::{delete, get, post, web};
use serde::Deserialize;
use web::{Data, Path};

use gigsync_api::{GigEnded, GigId, GigStarted, GigStep, GigView};

use crate::gigs::GigService;
use crate::rest_api::{ApiResponder, ApiResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(start_gig)
       .service(get_gig)
       .service(next_track)
       .service(previous_track)
       .service(end_gig);
}

#[derive(Deserialize)]
struct SetlistIdPath {
    setlist_id: i64,
}

#[derive(Deserialize)]
struct GigIdPath {
    gig_id: GigId,
}

#[post("/gigs/setlists/{setlist_id}")]
async fn start_gig(responder: ApiResponder, gigs: Data<GigService>, path: Path<SetlistIdPath>) -> ApiResponse<GigStarted> {
    responder.respond(async move { gigs.start_gig(path.setlist_id).await })
             .await
}

/// `null` once the show has ended.
#[get("/gigs/{gig_id}")]
async fn get_gig(responder: ApiResponder, gigs: Data<GigService>, path: Path<GigIdPath>) -> ApiResponse<Option<GigView>> {
    responder.respond(async move { gigs.current(path.gig_id).await })
             .await
}

#[post("/gigs/{gig_id}/next")]
async fn next_track(responder: ApiResponder, gigs: Data<GigService>, path: Path<GigIdPath>) -> ApiResponse<GigStep> {
    responder.respond(async move { gigs.step_forward(path.gig_id).await })
             .await
}

#[post("/gigs/{gig_id}/prev")]
async fn previous_track(responder: ApiResponder,
                        gigs: Data<GigService>,
                        path: Path<GigIdPath>)
                        -> ApiResponse<GigStep> {
    responder.respond(async move { gigs.step_backward(path.gig_id).await })
             .await
}

#[delete("/gigs/{gig_id}")]
async fn end_gig(responder: ApiResponder, gigs: Data<GigService>, path: Path<GigIdPath>) -> ApiResponse<GigEnded> {
    responder.respond(async move { gigs.end_gig(path.gig_id).await })
             .await
}
