use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use graph::Format;

/// A serialized graph, labelled with its media type and a download name.
pub(super) struct Rdf {
    pub(super) body: String,
    pub(super) format: Format,
    pub(super) name: String,
}

impl IntoResponse for Rdf {
    fn into_response(self) -> Response {
        let disposition = format!("filename={}.{}", self.name, self.format.extension());
        let Ok(disposition) = HeaderValue::from_str(&disposition) else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let mut response = self.body.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.format.media_type()),
        );
        headers.insert(header::CONTENT_DISPOSITION, disposition);
        response
    }
}
