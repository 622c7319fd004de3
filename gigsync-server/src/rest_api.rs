use std::convert::Infallible;
use std::future::Future;

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{get, web, FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder, Responder};
use futures::future::{ready, Ready};
use serde::Serialize;
use serde_json::json;

use gigsync_api::{Codec, GigError, Json, MsgPack};

use crate::ResponseMedia;

mod v1;


pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
    cfg.service(web::scope("/v1").configure(v1::configure));
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    let res = json!({
      "healthy": true
    });

    web::Json(res)
}

/// Picks JSON or MessagePack from the `Accept` header, JSON when absent or unknown.
pub struct ApiResponder(ResponseMedia);

impl ApiResponder {
    pub async fn respond<T, F>(self, fut: F) -> ApiResponse<T>
        where T: Serialize,
              F: Future<Output = Result<T, GigError>>
    {
        let rv = fut.await;
        ApiResponse(self.0, rv)
    }
}

impl FromRequest for ApiResponder {
    type Error = Infallible;
    type Future = Ready<Result<Self, Infallible>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let media = req.headers()
                       .get("Accept")
                       .and_then(|v| v.to_str().ok())
                       .and_then(|v| v.parse::<mime::Mime>().ok())
                       .and_then(|accept| {
                           if accept.essence_str() == mime::APPLICATION_MSGPACK.essence_str() {
                               Some(ResponseMedia::MsgPack)
                           } else if accept.essence_str() == mime::APPLICATION_JSON.essence_str() {
                               Some(ResponseMedia::Json)
                           } else {
                               None
                           }
                       })
                       .unwrap_or(ResponseMedia::Json);

        ready(Ok(Self(media)))
    }
}

pub struct ApiResponse<T>(ResponseMedia, Result<T, GigError>);

impl ResponseMedia {
    fn encode<T: Serialize>(self, value: &T) -> (Result<Vec<u8>, GigError>, &'static str) {
        let serialization = |err: gigsync_api::CodecError| GigError::Serialization { error: err.to_string() };

        match self {
            ResponseMedia::Json => (Json.serialize(value).map_err(serialization), Json.mime_type()),
            ResponseMedia::MsgPack => (MsgPack.serialize(value).map_err(serialization),
                                       MsgPack.mime_type()),
        }
    }
}

impl<T> Responder for ApiResponse<T> where T: Serialize
{
    type Body = EitherBody<BoxBody>;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let media = self.0;

        let err_resp = |err: GigError| {
            let status = StatusCode::from_u16(err.get_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            match media.encode(&err) {
                (Ok(content), content_type) => HttpResponseBuilder::new(status).content_type(content_type)
                                                                               .body(content)
                                                                               .map_into_right_body(),
                (Err(_), _) => HttpResponseBuilder::new(status).body(err.to_string())
                                                               .map_into_right_body(),
            }
        };

        match self.1 {
            Ok(ok) => match media.encode(&ok) {
                (Ok(content), content_type) => HttpResponseBuilder::new(StatusCode::OK).content_type(content_type)
                                                                                       .body(content)
                                                                                       .map_into_left_body(),
                (Err(err), _) => err_resp(err),
            },
            Err(err) => err_resp(err),
        }
    }
}
