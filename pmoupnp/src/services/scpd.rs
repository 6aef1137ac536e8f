use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::error;
use xmltree::Element;

use crate::state_variables::ServiceState;
use crate::xml::{push_element, push_text, to_document};

pub const SCPD_PATH: &str = "scpd.xml";

/// Document SCPD d'un service : version et table des variables d'état.
///
/// La liste d'actions est vide : le contrôle SOAP est assuré ailleurs.
pub fn scpd_element(state: &ServiceState) -> Element {
    let mut elem = Element::new("scpd");
    elem.attributes.insert(
        "xmlns".to_string(),
        "urn:schemas-upnp-org:service-1-0".to_string(),
    );

    let mut spec = Element::new("specVersion");
    push_text(&mut spec, "major", "1");
    push_text(&mut spec, "minor", "0");
    push_element(&mut elem, spec);

    push_element(&mut elem, Element::new("actionList"));
    push_element(&mut elem, state.to_xml_element());
    elem
}

/// Réponse `text/xml` pour un document déjà construit.
pub fn xml_response(elem: &Element) -> Response {
    match to_document(elem) {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml; charset=\"utf-8\"")],
            xml,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to serialize XML document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Sert le SCPD si `path` le désigne.
pub fn serve_scpd(state: &ServiceState, path: &str) -> Option<Response> {
    (path == SCPD_PATH).then(|| xml_response(&scpd_element(state)))
}
