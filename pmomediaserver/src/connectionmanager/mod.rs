//! # ConnectionManager Service
//!
//! Service ConnectionManager:1 du MediaServer.
//!
//! Pour un MediaServer, `SourceProtocolInfo` liste les protocoles que le
//! serveur peut fournir et `SinkProtocolInfo` reste vide. Une seule
//! connexion implicite (`0`) est annoncée.
//!
//! La liste des protocoles peut être remplacée par le paramètre de service
//! `source_protocol_info`.

use std::sync::Arc;

use async_trait::async_trait;
use pmoupnp::state_variables::{ServiceState, StateVar, StateVarType};
use pmoupnp::{ServiceConfig, ServiceError, UpnpService};

pub const CONNECTION_MANAGER: &str = "ConnectionManager";

/// Protocoles servis par défaut
pub const DEFAULT_SOURCE_PROTOCOLS: &[&str] = &[
    "http-get:*:audio/flac:*",
    "http-get:*:audio/mpeg:*",
    "http-get:*:audio/mp4:*",
    "http-get:*:audio/ogg:*",
    "http-get:*:audio/wav:*",
    "http-get:*:image/jpeg:*",
    "http-get:*:image/png:*",
    "http-get:*:video/mp4:*",
    "http-get:*:video/x-matroska:*",
];

pub struct ConnectionManager {
    config: ServiceConfig,
    state: Arc<ServiceState>,
}

pub fn connection_manager_config() -> ServiceConfig {
    ServiceConfig::new(CONNECTION_MANAGER, CONNECTION_MANAGER, 1)
}

impl ConnectionManager {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let source_protocols = config
            .params
            .get("source_protocol_info")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SOURCE_PROTOCOLS.join(","));

        let state = ServiceState::new();
        state.add_variable(
            StateVar::new("SourceProtocolInfo", StateVarType::String)
                .evented()
                .with_value(source_protocols)?,
        );
        state.add_variable(StateVar::new("SinkProtocolInfo", StateVarType::String).evented());
        state.add_variable(
            StateVar::new("CurrentConnectionIDs", StateVarType::String)
                .evented()
                .with_value("0")?,
        );

        for name in [
            "A_ARG_TYPE_ConnectionStatus",
            "A_ARG_TYPE_ConnectionManager",
            "A_ARG_TYPE_Direction",
            "A_ARG_TYPE_ProtocolInfo",
        ] {
            state.add_variable(StateVar::new(name, StateVarType::String));
        }
        for name in [
            "A_ARG_TYPE_ConnectionID",
            "A_ARG_TYPE_AVTransportID",
            "A_ARG_TYPE_RcsID",
        ] {
            state.add_variable(StateVar::new(name, StateVarType::I4));
        }

        Ok(Self { config, state })
    }
}

#[async_trait]
impl UpnpService for ConnectionManager {
    fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }
}
