use rouille::Response;
use serde_json::json;

use crate::service::error::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),

            ServiceError::Store(_) | ServiceError::Encode(_) => {
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl ApiError {
    pub fn into_response(self) -> Response {
        let (msg, status) = match self {
            ApiError::BadRequest(msg) => (msg, 400),
            ApiError::PayloadTooLarge(msg) => (msg, 413),
            ApiError::Internal(msg) => (msg, 500),
        };
        Response::json(&json!({ "error": msg })).with_status_code(status)
    }
}
