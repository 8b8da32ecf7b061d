use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use paygate_engine::GatewayError;
use thiserror::Error;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    PaymentError(#[from] GatewayError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentError(e) => match e {
                GatewayError::NoProviderAvailable { .. } | GatewayError::NoDefaultMethod(_) => StatusCode::NOT_FOUND,
                GatewayError::PaymentLinkNotFound(_) | GatewayError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                GatewayError::UnsupportedCurrency { .. } => StatusCode::BAD_REQUEST,
                GatewayError::InvalidOrderReference(_) => StatusCode::BAD_REQUEST,
                GatewayError::PaymentLinkExhausted(_) => StatusCode::GONE,
                GatewayError::SignatureMismatch => StatusCode::UNAUTHORIZED,
                GatewayError::Provider(_) => StatusCode::BAD_GATEWAY,
                GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            error!("💻️ Internal server error: {self}");
        }
        let body = JsonResponse::failure(self);
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).json(body)
    }
}
