//! # Variables d'état UPnP
//!
//! Une [`StateVar`] porte une valeur typée d'un service. Lorsqu'elle est
//! évènementielle, chaque changement produit un [`PropertySet`] émis sur le
//! bus du [`ServiceState`] propriétaire sous le nom [`PROPERTY_CHANGE`].
//!
//! ## Modération
//!
//! Une variable modérée notifie le premier changement d'une fenêtre puis
//! ignore tous les changements jusqu'à la fin de la fenêtre. Rien n'est mis en
//! file : une valeur affectée pendant la fenêtre n'apparaîtra que dans la
//! notification d'un changement ultérieur.

mod errors;
mod property_set;
mod service_state;
mod types;
mod variable;

pub use errors::StateVariableError;
pub use property_set::{Property, PropertySet};
pub use service_state::{PROPERTY_CHANGE, ServiceState};
pub use types::{StateValue, StateVarType};
pub use variable::{NotifyHook, NotifyPolicy, StateVar};

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Collecte les valeurs de `name` dans chaque PropertySet émis.
    fn collect(state: &Arc<ServiceState>, name: &'static str) -> Arc<Mutex<Vec<StateValue>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        state.events().on(PROPERTY_CHANGE, move |set: PropertySet| {
            let sink = sink.clone();
            async move {
                if let Some(p) = set.get(name) {
                    sink.lock().push(p.value.clone());
                }
                Ok(())
            }
        });
        seen
    }

    #[tokio::test]
    async fn test_unevented_never_notifies() {
        let state = ServiceState::new();
        let seen = collect(&state, "Volume");
        let var = state.add_variable(StateVar::new("Volume", StateVarType::UI2));

        for v in 1..5u16 {
            var.set(v).await.unwrap();
        }
        assert_eq!(var.get(), StateValue::Integer(4));
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_immediate_notifies_only_changes() {
        let state = ServiceState::new();
        let seen = collect(&state, "Mute");
        let var = state.add_variable(StateVar::new("Mute", StateVarType::Boolean).evented());

        var.set(true).await.unwrap();
        var.set(true).await.unwrap();
        var.set(false).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![StateValue::Boolean(true), StateValue::Boolean(false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_moderation_drops_changes_inside_window() {
        let state = ServiceState::new();
        let seen = collect(&state, "SystemUpdateID");
        let var = state.add_variable(
            StateVar::new("SystemUpdateID", StateVarType::UI4).moderated(Duration::from_millis(1000)),
        );

        var.set(1u32).await.unwrap();
        var.set(2u32).await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        var.set(3u32).await.unwrap();

        // Fin de fenêtre : aucune émission différée
        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(*seen.lock(), vec![StateValue::Integer(1)]);
        assert_eq!(var.get(), StateValue::Integer(3));

        var.set(4u32).await.unwrap();
        var.set(5u32).await.unwrap();
        assert_eq!(
            *seen.lock(),
            vec![StateValue::Integer(1), StateValue::Integer(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_moderation_one_notification_per_window() {
        let state = ServiceState::new();
        let seen = collect(&state, "Counter");
        let var = state.add_variable(
            StateVar::new("Counter", StateVarType::I4).moderated(Duration::from_millis(100)),
        );

        // Un changement toutes les 10 ms pendant 1 s
        for i in 1..=100i32 {
            var.set(i).await.unwrap();
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        let seen = seen.lock();
        assert_eq!(seen.len(), 10);
        assert_eq!(seen[0], StateValue::Integer(1));
        assert_eq!(seen[1], StateValue::Integer(11));
        assert!(!seen.contains(&StateValue::Integer(100)));
    }

    #[tokio::test]
    async fn test_additional_properties_are_read_at_emit_time() {
        let state = ServiceState::new();
        let seen_system = collect(&state, "SystemUpdateID");
        let system = state.add_variable(StateVar::new("SystemUpdateID", StateVarType::UI4));
        let containers = state.add_variable(
            StateVar::new("ContainerUpdateIDs", StateVarType::String)
                .evented()
                .with_additional_property("SystemUpdateID"),
        );

        system.set(7u32).await.unwrap();
        containers.set("0,7").await.unwrap();
        system.set(8u32).await.unwrap();
        containers.set("0,8").await.unwrap();

        assert_eq!(
            *seen_system.lock(),
            vec![StateValue::Integer(7), StateValue::Integer(8)]
        );
    }

    #[tokio::test]
    async fn test_hooks_surround_the_sink() {
        let state = ServiceState::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let sink = order.clone();
        state.events().on(PROPERTY_CHANGE, move |_| {
            let sink = sink.clone();
            async move {
                sink.lock().push("sink");
                Ok(())
            }
        });

        let pre = order.clone();
        let post = order.clone();
        let var = state.add_variable(
            StateVar::new("TransferIDs", StateVarType::String)
                .evented()
                .with_pre_notify(Arc::new(move |_: &PropertySet| pre.lock().push("pre")))
                .with_post_notify(Arc::new(move |_: &PropertySet| post.lock().push("post"))),
        );

        var.set("1").await.unwrap();
        assert_eq!(*order.lock(), vec!["pre", "sink", "post"]);
    }

    #[tokio::test]
    async fn test_type_mismatch_keeps_value() {
        let state = ServiceState::new();
        let var = state.add_variable(
            StateVar::new("Volume", StateVarType::UI2)
                .with_value(10u16)
                .unwrap(),
        );

        let err = var.set("loud").await.unwrap_err();
        assert!(matches!(err, StateVariableError::TypeMismatch { .. }));
        assert_eq!(var.get(), StateValue::Integer(10));
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported() {
        let state = ServiceState::new();
        state
            .events()
            .on(PROPERTY_CHANGE, |_| async { Err::<(), _>(anyhow::anyhow!("subscriber gone")) });
        let var = state.add_variable(StateVar::new("A", StateVarType::String).evented());

        let err = var.set("x").await.unwrap_err();
        assert!(matches!(err, StateVariableError::Notify(_)));
        assert_eq!(var.get(), StateValue::String("x".to_string()));
    }

    #[test]
    fn test_scpd_state_table() {
        let state = ServiceState::new();
        state.add_variable(StateVar::new("A_ARG_TYPE_ObjectID", StateVarType::String));
        state.add_variable(
            StateVar::new("SystemUpdateID", StateVarType::UI4)
                .evented()
                .with_value(3u32)
                .unwrap(),
        );

        let table = state.to_xml_element();
        let vars: Vec<_> = table
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .collect();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].attributes.get("sendEvents").map(String::as_str), Some("no"));
        assert_eq!(vars[1].attributes.get("sendEvents").map(String::as_str), Some("yes"));
        assert_eq!(
            vars[1]
                .get_child("dataType")
                .and_then(|e| e.get_text())
                .as_deref(),
            Some("ui4")
        );
        assert_eq!(
            vars[1]
                .get_child("defaultValue")
                .and_then(|e| e.get_text())
                .as_deref(),
            Some("3")
        );
    }
}
