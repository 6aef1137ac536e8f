use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use xmltree::Element;

use super::{PropertySet, StateVar};
use crate::events::{AsyncEventBus, EventBusError};
use crate::xml::push_element;

/// Nom de l'événement émis sur le bus du service à chaque notification.
pub const PROPERTY_CHANGE: &str = "propertyChange";

/// Table des variables d'état d'un service et son puits d'événements.
#[derive(Debug, Default)]
pub struct ServiceState {
    variables: RwLock<IndexMap<String, Arc<StateVar>>>,
    events: AsyncEventBus<PropertySet>,
}

impl ServiceState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Ajoute une variable et la relie à ce service.
    ///
    /// Une variable de même nom est remplacée.
    pub fn add_variable(self: &Arc<Self>, variable: StateVar) -> Arc<StateVar> {
        let variable = Arc::new(variable);
        variable.attach(Arc::downgrade(self));
        self.variables
            .write()
            .insert(variable.name().to_string(), Arc::clone(&variable));
        variable
    }

    pub fn get(&self, name: &str) -> Option<Arc<StateVar>> {
        self.variables.read().get(name).cloned()
    }

    pub fn variables(&self) -> Vec<Arc<StateVar>> {
        self.variables.read().values().cloned().collect()
    }

    /// Bus sur lequel les `PropertySet` sont émis sous [`PROPERTY_CHANGE`].
    pub fn events(&self) -> &AsyncEventBus<PropertySet> {
        &self.events
    }

    pub(crate) async fn publish(&self, set: PropertySet) -> Result<(), EventBusError> {
        self.events.emit(PROPERTY_CHANGE, set).await
    }

    /// Élément `<serviceStateTable>` du SCPD.
    pub fn to_xml_element(&self) -> Element {
        let mut table = Element::new("serviceStateTable");
        for variable in self.variables.read().values() {
            push_element(&mut table, variable.to_xml_element());
        }
        table
    }
}
