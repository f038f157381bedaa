//! 요청 본문/경로 추출기.
//!
//! Axum 기본 거부 응답(422, 평문 본문) 대신 [`ServiceError::BadRequest`]를
//! 반환합니다. 역직렬화 세부 내용은 로그에만 남습니다.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ServiceError;

/// JSON 본문 추출기.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Rejected request body");
                Err(ServiceError::bad_request(json_rejection_message(&rejection)))
            }
        }
    }
}

fn json_rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "Request body has missing or invalid fields.",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON.",
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body.",
        _ => "Invalid request body.",
    }
}

/// 경로 파라미터 추출기.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Rejected path parameter");
                Err(ServiceError::bad_request(path_rejection_message(&rejection)))
            }
        }
    }
}

fn path_rejection_message(rejection: &PathRejection) -> &'static str {
    match rejection {
        PathRejection::FailedToDeserializePathParams(_) => "Invalid path parameter.",
        _ => "Missing path parameter.",
    }
}
