use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const ACCEPTED_MESSAGE: &str = "Payload fulfills atleast one filter group";
pub const CLIENT_EXCEPTION: &str = "ClientException";
pub const SERVER_EXCEPTION: &str = "ServerException";

/// JSON body returned to GitHub for every delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeliveryResponse {
    Rejected {
        #[serde(rename = "isError")]
        is_error: bool,
        #[serde(rename = "type")]
        kind: String,
        message: String,
    },
    Accepted {
        message: String,
    },
}

impl DeliveryResponse {
    pub fn accepted() -> Self {
        DeliveryResponse::Accepted {
            message: ACCEPTED_MESSAGE.to_string(),
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        DeliveryResponse::Rejected {
            is_error: true,
            kind: SERVER_EXCEPTION.to_string(),
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, DeliveryResponse::Accepted { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            DeliveryResponse::Rejected { message, .. } | DeliveryResponse::Accepted { message } => {
                message.as_str()
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DeliveryResponse::Accepted { .. } => StatusCode::OK,
            DeliveryResponse::Rejected { kind, .. } if kind == CLIENT_EXCEPTION => {
                StatusCode::BAD_REQUEST
            }
            DeliveryResponse::Rejected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClientError> for DeliveryResponse {
    fn from(e: ClientError) -> Self {
        DeliveryResponse::Rejected {
            is_error: true,
            kind: CLIENT_EXCEPTION.to_string(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for DeliveryResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
