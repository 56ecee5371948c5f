use axum::{Json, extract::Request, middleware::Next, response::IntoResponse, response::Response};

use crate::error::ErrorBody;

/// Copies the request path into error bodies produced by `AppError`.
pub async fn attach_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorBody>() {
        Some(mut body) => {
            body.path = path;
            (response.status(), Json(body)).into_response()
        }
        None => response,
    }
}
