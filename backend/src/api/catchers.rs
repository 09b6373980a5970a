use crate::error::{json_response, ApiError, ErrorResponse};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{catch, Request};

/// JSON body for requests Rocket rejects before a handler runs.
pub struct CatcherResponse(Status, ErrorResponse);

impl<'r> Responder<'r, 'static> for CatcherResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        json_response(self.0, &self.1)
    }
}

#[catch(400)]
pub fn bad_request(_: &Request) -> CatcherResponse {
    let err = ApiError::RequestMalformed("the request could not be understood".to_string());
    CatcherResponse(Status::BadRequest, err.to_response_body())
}

#[catch(422)]
pub fn unprocessable(_: &Request) -> CatcherResponse {
    let err = ApiError::RequestMalformed("the request body has the wrong shape".to_string());
    CatcherResponse(Status::BadRequest, err.to_response_body())
}

#[catch(404)]
pub fn not_found(req: &Request) -> CatcherResponse {
    CatcherResponse(
        Status::NotFound,
        ErrorResponse {
            error: format!("No route for {}", req.uri().path()),
            code: Some("NOT_FOUND".to_string()),
        },
    )
}

#[catch(500)]
pub fn internal_error(_: &Request) -> CatcherResponse {
    CatcherResponse(Status::InternalServerError, ErrorResponse::generic(None))
}
