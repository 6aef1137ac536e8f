//! Petits utilitaires de construction XML communs aux descriptions.

use xmltree::{Element, EmitterConfig, XMLNode};

/// Crée `<name>text</name>`.
pub(crate) fn text_element(name: &str, text: impl Into<String>) -> Element {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(text.into()));
    elem
}

/// Ajoute `<name>text</name>` comme enfant de `parent`.
pub(crate) fn push_text(parent: &mut Element, name: &str, text: impl Into<String>) {
    parent
        .children
        .push(XMLNode::Element(text_element(name, text)));
}

pub(crate) fn push_element(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}

/// Sérialise un document complet, déclaration XML incluse.
pub(crate) fn to_document(elem: &Element) -> Result<String, xmltree::Error> {
    let config = EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ");

    let mut output = Vec::new();
    elem.write_with_config(&mut output, config)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}
