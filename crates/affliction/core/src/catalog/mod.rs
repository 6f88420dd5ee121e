//! Effect Catalog - immutable registry of effect type definitions.
//!
//! The catalog is assembled once at boot through [`CatalogBuilder`], which
//! validates every definition, and is then shared read-only (usually behind
//! an `Arc`) by the manager, aggregator and scheduler. There is no global
//! registry and no runtime mutation.

pub mod behavior;
pub mod callbacks;
pub mod definition;
pub mod stage;

pub use behavior::BehaviorOverride;
pub use callbacks::{CallbackContext, CallbackHandle, EffectCallbacks};
pub use definition::EffectTypeDefinition;
pub use stage::{
    EquipCandidate, HostileConversion, ItemRef, RoleChange, StageConfig, StageRestrictions, Tint,
    TransformAction, VisualOverlay,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::handlers::EffectHandler;
use crate::ids::EffectTypeId;

/// Validated, read-only set of effect types and custom effect handlers.
#[derive(Default)]
pub struct EffectCatalog {
    types: BTreeMap<EffectTypeId, EffectTypeDefinition>,
    handlers: BTreeMap<String, Arc<dyn EffectHandler>>,
}

impl EffectCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Looks up a registered type.
    pub fn get(&self, id: &str) -> Option<&EffectTypeDefinition> {
        self.types.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Registered type ids in lexical order.
    pub fn type_ids(&self) -> impl Iterator<Item = &EffectTypeId> {
        self.types.keys()
    }

    /// Registered definitions in lexical id order.
    pub fn types(&self) -> impl Iterator<Item = &EffectTypeDefinition> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Custom handler registered under `key`.
    pub fn handler(&self, key: &str) -> Option<Arc<dyn EffectHandler>> {
        self.handlers.get(key).cloned()
    }

    pub fn handler_keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for EffectCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectCatalog")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Boot-time assembly of an [`EffectCatalog`].
///
/// Every registration is validated immediately; the first conflict is
/// returned and initialization is expected to abort.
#[derive(Default)]
pub struct CatalogBuilder {
    types: BTreeMap<EffectTypeId, EffectTypeDefinition>,
    handlers: BTreeMap<String, Arc<dyn EffectHandler>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition after validating it.
    pub fn register(&mut self, definition: EffectTypeDefinition) -> Result<&mut Self, CatalogError> {
        if self.types.contains_key(&definition.id) {
            return Err(CatalogError::DuplicateType(definition.id));
        }
        definition.validate()?;
        self.types.insert(definition.id.clone(), definition);
        Ok(self)
    }

    /// Registers several definitions, stopping at the first conflict.
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = EffectTypeDefinition>,
    ) -> Result<&mut Self, CatalogError> {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(self)
    }

    /// Attaches lifecycle callbacks to an already registered type. Used when
    /// definitions come from data files, which cannot carry code.
    pub fn attach_callbacks(
        &mut self,
        id: &str,
        callbacks: CallbackHandle,
    ) -> Result<&mut Self, CatalogError> {
        let definition = self
            .types
            .get_mut(id)
            .ok_or_else(|| CatalogError::CallbacksForUnknownType(EffectTypeId::new(id)))?;
        definition.callbacks = Some(callbacks);
        Ok(self)
    }

    /// Registers a custom effect handler under `key`.
    pub fn register_handler(
        &mut self,
        key: impl Into<String>,
        handler: impl EffectHandler + 'static,
    ) -> Result<&mut Self, CatalogError> {
        let key = key.into();
        if self.handlers.contains_key(&key) {
            return Err(CatalogError::DuplicateHandler(key));
        }
        self.handlers.insert(key, Arc::new(handler));
        Ok(self)
    }

    /// Registers the built-in `drain` and `contagion` handlers.
    pub fn with_builtin_handlers(&mut self) -> Result<&mut Self, CatalogError> {
        use crate::handlers::{Contagion, Drain};

        self.register_handler(Drain::KEY, Drain)?;
        self.register_handler(Contagion::KEY, Contagion)?;
        Ok(self)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn build(self) -> EffectCatalog {
        EffectCatalog {
            types: self.types,
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TagId;

    fn slime() -> EffectTypeDefinition {
        EffectTypeDefinition::new(
            "slime",
            "Slime Corruption",
            vec![StageConfig::new(), StageConfig::new()],
        )
        .with_tags([TagId(47), TagId(48)])
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut builder = CatalogBuilder::new();
        builder.register(slime()).unwrap();
        let err = builder.register(slime()).err();
        assert_eq!(err, Some(CatalogError::DuplicateType("slime".into())));
    }

    #[test]
    fn invalid_definitions_never_enter_the_catalog() {
        let mut builder = CatalogBuilder::new();
        let broken = slime().with_tags([TagId(1), TagId(2), TagId(3)]);
        assert!(builder.register(broken).is_err());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn ids_are_listed_lexically() {
        let mut builder = CatalogBuilder::new();
        builder
            .register(EffectTypeDefinition::new("parasite", "", vec![StageConfig::new()]))
            .unwrap()
            .register(slime())
            .unwrap()
            .register(EffectTypeDefinition::new("bound", "", vec![StageConfig::new()]))
            .unwrap();
        let catalog = builder.build();
        let ids: Vec<_> = catalog.type_ids().map(EffectTypeId::as_str).collect();
        assert_eq!(ids, ["bound", "parasite", "slime"]);
    }

    #[test]
    fn callbacks_require_registered_type() {
        struct Quiet;
        impl EffectCallbacks for Quiet {}

        let mut builder = CatalogBuilder::new();
        assert!(matches!(
            builder.attach_callbacks("ghost", CallbackHandle::new(Quiet)),
            Err(CatalogError::CallbacksForUnknownType(_))
        ));
        builder.register(slime()).unwrap();
        builder
            .attach_callbacks("slime", CallbackHandle::new(Quiet))
            .unwrap();
        assert!(builder.build().get("slime").unwrap().callbacks.is_some());
    }

    #[test]
    fn builtin_handlers_register_once() {
        let mut builder = CatalogBuilder::new();
        builder.with_builtin_handlers().unwrap();
        assert!(builder.with_builtin_handlers().is_err());
        let catalog = builder.build();
        let keys: Vec<_> = catalog.handler_keys().collect();
        assert_eq!(keys, ["contagion", "drain"]);
    }
}
