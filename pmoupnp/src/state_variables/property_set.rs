use quick_xml::escape::escape;

use super::{StateValue, StateVarType};

const EVENT_NAMESPACE: &str = "urn:schemas-upnp-org:event-1-0";

/// Une propriété notifiée : valeur, type et espace de noms éventuel.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: StateValue,
    pub var_type: StateVarType,
    pub namespace: Option<String>,
}

/// Ensemble de propriétés transmis au puits d'événements du service.
///
/// La première propriété est toujours celle de la variable modifiée ; suivent
/// les propriétés additionnelles, lues au moment de la notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Corps GENA `e:propertyset` correspondant.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        xml.push_str(&format!("<e:propertyset xmlns:e=\"{}\">", EVENT_NAMESPACE));
        for property in &self.properties {
            let value = property.value.to_string();
            let ns = property
                .namespace
                .as_ref()
                .map(|ns| format!(" xmlns=\"{}\"", escape(ns.as_str())))
                .unwrap_or_default();
            xml.push_str(&format!(
                "<e:property><{name}{ns}>{value}</{name}></e:property>",
                name = property.name,
                ns = ns,
                value = escape(value.as_str()),
            ));
        }
        xml.push_str("</e:propertyset>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propertyset_xml() {
        let mut set = PropertySet::new();
        set.push(Property {
            name: "ContainerUpdateIDs".to_string(),
            value: StateValue::String("0,1&2".to_string()),
            var_type: StateVarType::String,
            namespace: None,
        });
        set.push(Property {
            name: "SystemUpdateID".to_string(),
            value: StateValue::Integer(7),
            var_type: StateVarType::UI4,
            namespace: Some("urn:example".to_string()),
        });

        let xml = set.to_xml();
        assert!(xml.contains("<e:propertyset xmlns:e=\"urn:schemas-upnp-org:event-1-0\">"));
        assert!(xml.contains("<ContainerUpdateIDs>0,1&amp;2</ContainerUpdateIDs>"));
        assert!(xml.contains("<SystemUpdateID xmlns=\"urn:example\">7</SystemUpdateID>"));
        assert_eq!(set.get("SystemUpdateID").unwrap().value, StateValue::Integer(7));
    }
}
