use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};
use xmltree::Element;

use super::{Property, PropertySet, ServiceState, StateValue, StateVarType, StateVariableError};
use crate::xml::push_text;

/// Crochet appelé autour de la remise d'un [`PropertySet`] au service.
pub type NotifyHook = Arc<dyn Fn(&PropertySet) + Send + Sync>;

/// Politique de notification, fixée à la construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Variable non évènementielle : `set` ne notifie jamais
    Silent,
    /// Chaque changement est notifié
    Immediate,
    /// Au plus une notification par fenêtre ; les changements intermédiaires
    /// sont perdus
    Moderated(Duration),
}

/// Fenêtre de modération : tant que `now < suppressed_until`, les changements
/// ne sont pas notifiés.
#[derive(Debug, Default)]
struct Moderation {
    suppressed_until: Option<Instant>,
}

impl Moderation {
    /// Rend `true` si une notification peut partir maintenant, et ouvre alors
    /// une nouvelle fenêtre de suppression de durée `rate`.
    fn admit(&mut self, rate: Duration) -> bool {
        let now = Instant::now();
        if let Some(until) = self.suppressed_until {
            if now < until {
                return false;
            }
        }
        self.suppressed_until = Some(now + rate);
        true
    }
}

/// Variable d'état d'un service UPnP.
///
/// Construite par builder puis confiée à un [`ServiceState`] via
/// [`ServiceState::add_variable`], qui la relie à son puits d'événements.
///
/// # Examples
///
/// ```rust
/// use pmoupnp::state_variables::{ServiceState, StateVar, StateVarType};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let state = ServiceState::new();
/// let var = state.add_variable(
///     StateVar::new("SystemUpdateID", StateVarType::UI4)
///         .moderated(Duration::from_secs(2)),
/// );
/// var.set(1u32).await.unwrap();
/// # }
/// ```
pub struct StateVar {
    name: String,
    var_type: StateVarType,
    namespace: Option<String>,
    policy: NotifyPolicy,
    additional_properties: Vec<String>,
    pre_notify: Option<NotifyHook>,
    post_notify: Option<NotifyHook>,
    default_value: Option<StateValue>,
    value: RwLock<StateValue>,
    moderation: Mutex<Moderation>,
    service: RwLock<Weak<ServiceState>>,
}

impl fmt::Debug for StateVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateVar")
            .field("name", &self.name)
            .field("type", &self.var_type)
            .field("namespace", &self.namespace)
            .field("policy", &self.policy)
            .field("additional_properties", &self.additional_properties)
            .field("value", &*self.value.read())
            .finish()
    }
}

impl StateVar {
    /// Crée une variable non évènementielle initialisée à la valeur par défaut
    /// de son type.
    pub fn new(name: impl Into<String>, var_type: StateVarType) -> Self {
        Self {
            name: name.into(),
            var_type,
            namespace: None,
            policy: NotifyPolicy::Silent,
            additional_properties: Vec::new(),
            pre_notify: None,
            post_notify: None,
            default_value: None,
            value: RwLock::new(var_type.default_value()),
            moderation: Mutex::new(Moderation::default()),
            service: RwLock::new(Weak::new()),
        }
    }

    /// Valeur initiale explicite.
    ///
    /// # Errors
    ///
    /// [`StateVariableError::TypeMismatch`] si la valeur n'est pas du type de la variable.
    pub fn with_value(mut self, value: impl Into<StateValue>) -> Result<Self, StateVariableError> {
        let value = self.check(value.into())?;
        *self.value.write() = value.clone();
        self.default_value = Some(value);
        Ok(self)
    }

    /// Notifie chaque changement.
    pub fn evented(mut self) -> Self {
        self.policy = NotifyPolicy::Immediate;
        self
    }

    /// Notifie au plus une fois par fenêtre de `rate`.
    pub fn moderated(mut self, rate: Duration) -> Self {
        self.policy = NotifyPolicy::Moderated(rate);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Ajoute au `PropertySet` la valeur courante d'une autre variable du service.
    pub fn with_additional_property(mut self, name: impl Into<String>) -> Self {
        self.additional_properties.push(name.into());
        self
    }

    pub fn with_pre_notify(mut self, hook: NotifyHook) -> Self {
        self.pre_notify = Some(hook);
        self
    }

    pub fn with_post_notify(mut self, hook: NotifyHook) -> Self {
        self.post_notify = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> StateVarType {
        self.var_type
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    pub fn is_evented(&self) -> bool {
        self.policy != NotifyPolicy::Silent
    }

    /// Valeur courante, sans effet de bord.
    pub fn get(&self) -> StateValue {
        self.value.read().clone()
    }

    pub(crate) fn attach(&self, service: Weak<ServiceState>) {
        *self.service.write() = service;
    }

    fn check(&self, value: StateValue) -> Result<StateValue, StateVariableError> {
        let kind = value.kind();
        self.var_type
            .coerce(value)
            .ok_or_else(|| StateVariableError::TypeMismatch {
                name: self.name.clone(),
                expected: self.var_type.to_string(),
                got: kind.to_string(),
            })
    }

    /// Affecte une nouvelle valeur et notifie le service si elle a changé.
    ///
    /// La valeur est toujours affectée. Pour une variable modérée, un
    /// changement survenant pendant la fenêtre de suppression n'est jamais
    /// notifié : il ne sera visible que dans la notification d'un changement
    /// ultérieur.
    ///
    /// # Errors
    ///
    /// - [`StateVariableError::TypeMismatch`] : la valeur est refusée et la
    ///   variable reste inchangée
    /// - [`StateVariableError::Notify`] : un handler du service a échoué
    pub async fn set(&self, value: impl Into<StateValue>) -> Result<(), StateVariableError> {
        let value = self.check(value.into())?;

        let changed = {
            let mut current = self.value.write();
            let changed = *current != value;
            *current = value;
            changed
        };

        if !changed {
            return Ok(());
        }

        match self.policy {
            NotifyPolicy::Silent => Ok(()),
            NotifyPolicy::Immediate => self.notify().await,
            NotifyPolicy::Moderated(rate) => {
                let admitted = self.moderation.lock().admit(rate);
                if admitted {
                    self.notify().await
                } else {
                    debug!("State variable {} changed during moderation window, not notified", self.name);
                    Ok(())
                }
            }
        }
    }

    pub(crate) fn to_property(&self) -> Property {
        Property {
            name: self.name.clone(),
            value: self.get(),
            var_type: self.var_type,
            namespace: self.namespace.clone(),
        }
    }

    async fn notify(&self) -> Result<(), StateVariableError> {
        let Some(service) = self.service.read().upgrade() else {
            debug!("State variable {} is not attached to a service, nothing to notify", self.name);
            return Ok(());
        };

        let mut set = PropertySet::new();
        set.push(self.to_property());
        for name in &self.additional_properties {
            match service.get(name) {
                Some(var) => set.push(var.to_property()),
                None => warn!(
                    "⚠️ Additional property '{}' of {} is not defined on the service",
                    name, self.name
                ),
            }
        }

        if let Some(hook) = &self.pre_notify {
            hook(&set);
        }

        service.publish(set.clone()).await?;

        if let Some(hook) = &self.post_notify {
            hook(&set);
        }
        Ok(())
    }

    /// Entrée `<stateVariable>` de la table d'état du SCPD.
    pub fn to_xml_element(&self) -> Element {
        let mut elem = Element::new("stateVariable");
        elem.attributes.insert(
            "sendEvents".to_string(),
            if self.is_evented() { "yes" } else { "no" }.to_string(),
        );
        push_text(&mut elem, "name", self.name.clone());
        push_text(&mut elem, "dataType", self.var_type.to_string());
        if let Some(default) = &self.default_value {
            push_text(&mut elem, "defaultValue", default.to_string());
        }
        elem
    }
}
