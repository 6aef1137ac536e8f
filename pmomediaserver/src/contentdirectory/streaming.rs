//! Diffusion HTTP des objets publiés (`content/<objectId>`)

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE, USER_AGENT,
};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use pmocontent::{ContentError, ReadRange, ReadSession};
use pmoupnp::ServiceError;
use tracing::debug;

use crate::library::MediaLibrary;

/// Réponse `200` ou `206` pour l'objet `object_id`.
///
/// `Ok(None)` pour un objet inconnu, un conteneur ou une ressource absente.
pub async fn stream_object(
    library: &MediaLibrary,
    request: Request,
    object_id: &str,
) -> Result<Option<Response>, ServiceError> {
    let (parts, _) = request.into_parts();
    let node = match library.nodes().get_node_by_id(object_id).await {
        Ok(Some(node)) if !node.is_container => node,
        Ok(_) => return Ok(None),
        Err(e) => return Err(ServiceError::Other(e.into())),
    };
    let provider = library
        .providers()
        .resolve(&node.address)
        .map_err(|e| ServiceError::Other(e.into()))?;

    let stat = match provider.stat(&node.address).await {
        Ok(stat) => stat,
        Err(ContentError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(ServiceError::Other(e.into())),
    };
    let total = stat.size;

    let range = match parts.headers.get(RANGE).and_then(|v| v.to_str().ok()) {
        None => None,
        Some(value) => match ReadRange::from_header(value, total) {
            Some(range) if range.is_satisfiable(total) => Some(range),
            _ => {
                debug!("Unsatisfiable range '{}' for {}", value, node.address);
                return Ok(Some(
                    (
                        StatusCode::RANGE_NOT_SATISFIABLE,
                        [(CONTENT_RANGE, format!("bytes */{}", total))],
                    )
                        .into_response(),
                ));
            }
        },
    };

    let mut response = Response::builder()
        .header(CONTENT_TYPE, stat.mime_type.as_str())
        .header(ACCEPT_RANGES, "bytes");
    response = match range {
        Some(range) => response
            .status(StatusCode::PARTIAL_CONTENT)
            .header(CONTENT_RANGE, range.content_range(total))
            .header(CONTENT_LENGTH, range.len(total)),
        None => response
            .status(StatusCode::OK)
            .header(CONTENT_LENGTH, total),
    };

    let body = if parts.method == Method::HEAD {
        Body::empty()
    } else {
        let session = ReadSession {
            requester: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string()),
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        };
        let stream = provider
            .create_read_stream(&session, &node.address, range)
            .await
            .map_err(|e| ServiceError::Other(e.into()))?;
        Body::from_stream(stream)
    };

    response
        .body(body)
        .map(Some)
        .map_err(|e| ServiceError::Other(e.into()))
}
