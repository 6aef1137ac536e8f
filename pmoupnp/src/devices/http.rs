//! Routage HTTP et description XML d'un device.

use axum::extract::Request;
use axum::http::header::{CONTENT_LANGUAGE, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, error};
use xmltree::Element;

use super::device::DESCRIPTION_PATH;
use super::{Device, DeviceError};
use crate::services::xml_response;
use crate::xml::{push_element, push_text};

const DLNA_TRANSFER_MODE: &str = "transfermode.dlna.org";
const DLNA_CONTENT_FEATURES: &str = "contentfeatures.dlna.org";
const DLNA_DEFAULT_FEATURES: &str =
    "DLNA.ORG_OP=01;DLNA.ORG_CI=0;DLNA.ORG_FLAGS=01700000000000000000000000000000";

/// Retire du nom d'icône demandé toute tentative de remonter l'arborescence.
fn sanitize_icon_name(name: &str) -> Option<String> {
    let cleaned = name.replace("..", "").replace(['/', '\\'], "");
    (!cleaned.is_empty()).then_some(cleaned)
}

impl Device {
    /// Route une requête dont `path` est relatif au chemin du device.
    ///
    /// - vide ou `index.html` : page HTML
    /// - `description.xml` : description du device
    /// - `icons/<fichier>` : icône du répertoire configuré
    /// - `<route>/…` : service ou device embarqué monté sous `route`
    ///
    /// `Ok(None)` signifie « non trouvé ».
    pub fn process_request<'a>(
        &'a self,
        request: Request,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Option<Response>, DeviceError>> {
        async move {
            let path = path.trim_start_matches('/');
            let (head, rest) = path.split_once('/').unwrap_or((path, ""));

            match head {
                "" | "index.html" => Ok(Some(self.index_page())),
                DESCRIPTION_PATH => Ok(Some(self.description_response())),
                "icons" => Ok(self.serve_icon(rest).await),
                route => {
                    if let Some(service) = self.service(route) {
                        let response = service.process_request(request, rest).await?;
                        return Ok(response.map(|r| self.with_dlna_headers(r)));
                    }
                    if let Some(device) = self.device(route) {
                        return device.process_request(request, rest).await;
                    }
                    debug!("No handler for {}/{}", self.base_path(), path);
                    Ok(None)
                }
            }
        }
        .boxed()
    }

    /// Traduit le résultat du routage en réponse HTTP (404 / 500).
    pub async fn handle_http(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();
        let Some(relative) = path.strip_prefix(self.base_path()) else {
            return StatusCode::NOT_FOUND.into_response();
        };
        if !(relative.is_empty() || relative.starts_with('/')) {
            return StatusCode::NOT_FOUND.into_response();
        }

        match self.process_request(request, relative).await {
            Ok(Some(response)) => response,
            Ok(None) => StatusCode::NOT_FOUND.into_response(),
            Err(e) => {
                error!("❌ Request {} failed: {}", path, e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    fn index_page(&self) -> Response {
        let name = quick_xml::escape::escape(self.config.friendly_name.as_str());
        Html(format!(
            "<html><head><title>{name}</title></head><body><h1>{name}</h1><p>{}</p></body></html>",
            self.udn()
        ))
        .into_response()
    }

    fn description_response(&self) -> Response {
        let mut response = xml_response(&self.description_element());
        if let Some(value) = self
            .config
            .language
            .as_deref()
            .and_then(|language| HeaderValue::from_str(language).ok())
        {
            response.headers_mut().insert(CONTENT_LANGUAGE, value);
        }
        response
    }

    async fn serve_icon(&self, name: &str) -> Option<Response> {
        let dir = self.config.icons_dir.as_ref()?;
        let name = sanitize_icon_name(name)?;

        match tokio::fs::read(dir.join(&name)).await {
            Ok(bytes) => {
                let mime = mime_guess::from_path(&name).first_or_octet_stream();
                Some(([(CONTENT_TYPE, mime.to_string())], bytes).into_response())
            }
            Err(e) => {
                debug!("Icon {} unavailable: {}", name, e);
                None
            }
        }
    }

    /// Ajoute les en-têtes DLNA s'ils sont absents de la réponse.
    fn with_dlna_headers(&self, mut response: Response) -> Response {
        if self.config.dlna {
            let headers = response.headers_mut();
            headers
                .entry(HeaderName::from_static(DLNA_TRANSFER_MODE))
                .or_insert(HeaderValue::from_static("Streaming"));
            headers
                .entry(HeaderName::from_static(DLNA_CONTENT_FEATURES))
                .or_insert(HeaderValue::from_static(DLNA_DEFAULT_FEATURES));
        }
        response
    }

    /// Document `description.xml` complet.
    pub fn description_element(&self) -> Element {
        let mut root = Element::new("root");
        root.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:device-1-0".to_string(),
        );
        if self.config.dlna {
            root.attributes.insert(
                "xmlns:dlna".to_string(),
                "urn:schemas-dlna-org:device-1-0".to_string(),
            );
        }

        let mut spec = Element::new("specVersion");
        push_text(&mut spec, "major", "1");
        push_text(&mut spec, "minor", self.config.upnp_version.to_string());
        push_element(&mut root, spec);

        push_element(&mut root, self.device_element());
        root
    }

    fn device_element(&self) -> Element {
        let config = &self.config;
        let mut elem = Element::new("device");

        push_text(&mut elem, "deviceType", self.device_type());
        push_text(&mut elem, "friendlyName", config.friendly_name.as_str());
        push_text(&mut elem, "manufacturer", config.manufacturer.as_str());
        if let Some(url) = &config.manufacturer_url {
            push_text(&mut elem, "manufacturerURL", url.as_str());
        }
        if let Some(description) = &config.model_description {
            push_text(&mut elem, "modelDescription", description.as_str());
        }
        push_text(&mut elem, "modelName", config.model_name.as_str());
        if let Some(number) = &config.model_number {
            push_text(&mut elem, "modelNumber", number.as_str());
        }
        if let Some(serial) = &config.serial_number {
            push_text(&mut elem, "serialNumber", serial.as_str());
        }
        push_text(&mut elem, "UDN", self.udn());

        if config.dlna {
            let class = if config.device_type.contains("MediaRenderer") {
                "DMR"
            } else {
                "DMS"
            };
            push_text(&mut elem, "dlna:X_DLNADOC", format!("{}-1.50", class));
        }
        push_text(
            &mut elem,
            "presentationURL",
            format!("{}/index.html", self.base_path()),
        );

        if !config.icons.is_empty() {
            let mut icons = Element::new("iconList");
            for icon in &config.icons {
                let mut node = Element::new("icon");
                push_text(&mut node, "mimetype", icon.mime_type.as_str());
                push_text(&mut node, "width", icon.width.to_string());
                push_text(&mut node, "height", icon.height.to_string());
                push_text(&mut node, "depth", icon.depth.to_string());
                push_text(
                    &mut node,
                    "url",
                    format!("{}/icons/{}", self.base_path(), icon.file),
                );
                push_element(&mut icons, node);
            }
            push_element(&mut elem, icons);
        }

        let mut services = Element::new("serviceList");
        for service in self.services() {
            if !service.config().is_instance() {
                push_element(&mut services, service.describe(self.base_path()));
            }
        }
        push_element(&mut elem, services);

        let devices = self.devices();
        if !devices.is_empty() {
            let mut list = Element::new("deviceList");
            for device in devices {
                push_element(&mut list, device.device_element());
            }
            push_element(&mut elem, list);
        }

        elem
    }
}
