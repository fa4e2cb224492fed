//! Sample roles and behaviours
//!
//! A small FOAF-flavoured model: `Named` <- `Agent` <- `Person`, plus the
//! unrelated `Document` and `Counter` roles.

use crate::store::MemoryPropertyStore;
use persona_composition::{BehaviourDef, Composer, Payload};
use persona_core::{
    MethodSig, PersonaConfig, RoleCatalog, RoleDef, RoleName, StorageMode, Value, ValueType,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Namespace of the agent roles
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";

/// Namespace of the document role
pub const DCTERMS: &str = "http://purl.org/dc/terms/";

/// Role name shorthand
pub fn role(name: &str) -> RoleName {
    RoleName::new(name)
}

/// Catalog of the sample roles
pub fn sample_catalog() -> Arc<RoleCatalog> {
    let catalog = RoleCatalog::new();
    catalog
        .register(
            RoleDef::new("Named")
                .namespace(FOAF)
                .method(MethodSig::getter("getName", ValueType::Text))
                .method(MethodSig::setter("setName", ValueType::Text)),
        )
        .unwrap();
    catalog
        .register(
            RoleDef::new("Agent")
                .extends("Named")
                .namespace(FOAF)
                .method(MethodSig::getter(
                    "getMbox",
                    ValueType::collection(ValueType::Text),
                ))
                .method(MethodSig::setter(
                    "setMbox",
                    ValueType::collection(ValueType::Text),
                ))
                .method(MethodSig::getter("isActive", ValueType::Boolean)),
        )
        .unwrap();
    catalog
        .register(
            RoleDef::new("Person")
                .extends("Agent")
                .namespace(FOAF)
                .method(MethodSig::getter("getAge", ValueType::Integer))
                .method(
                    MethodSig::setter("setAge", ValueType::Integer)
                        .returning(ValueType::Role(role("Person"))),
                )
                .method(MethodSig::getter("greet", ValueType::Text)),
        )
        .unwrap();
    catalog
        .register(
            RoleDef::new("Document")
                .namespace(DCTERMS)
                .method(MethodSig::getter("getTitle", ValueType::Text).localized())
                .method(MethodSig::setter("setTitle", ValueType::Text))
                .method(MethodSig::getter("describe", ValueType::Text)),
        )
        .unwrap();
    catalog
        .register(RoleDef::new("Counter").method(MethodSig::getter("increment", ValueType::Integer)))
        .unwrap();
    Arc::new(catalog)
}

/// Greets with the composite's current name
pub fn person_behaviour() -> BehaviourDef {
    BehaviourDef::new("PersonSupport")
        .implements("Person")
        .method("Person", "greet", |inv| {
            let name = inv.this().property_value("name")?;
            let name = name.as_single().and_then(Value::as_str).unwrap_or("stranger");
            Ok(Payload::value(format!("Hello, {name}")))
        })
}

/// Describes a document by its title
pub fn document_behaviour() -> BehaviourDef {
    BehaviourDef::new("DocumentSupport")
        .implements("Document")
        .method("Document", "describe", |inv| {
            let title = inv.this().property_value("title")?;
            Ok(Payload::value(format!(
                "Document {}",
                title.as_single().and_then(Value::as_str).unwrap_or("untitled")
            )))
        })
}

/// Counts calls per composite instance
pub fn counter_behaviour() -> BehaviourDef {
    BehaviourDef::new("CounterSupport")
        .implements("Counter")
        .state(|_| AtomicI64::new(0))
        .method("Counter", "increment", |inv| {
            let count = inv.state::<AtomicI64>()?.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Payload::value(count))
        })
}

/// Register every sample behaviour with `composer`
pub fn register_sample_behaviours(composer: &Composer) {
    composer.register_behaviour(person_behaviour()).unwrap();
    composer.register_behaviour(document_behaviour()).unwrap();
    composer.register_behaviour(counter_behaviour()).unwrap();
}

/// Composer over the sample catalog with transient storage
pub fn sample_composer() -> Composer {
    let composer = Composer::new(sample_catalog()).unwrap();
    register_sample_behaviours(&composer);
    composer
}

/// Composer over the sample catalog writing through to `store`
pub fn durable_composer(store: Arc<MemoryPropertyStore>) -> Composer {
    let mut config = PersonaConfig::default();
    config.properties.storage = StorageMode::Durable;
    let composer = Composer::builder(sample_catalog())
        .config(config)
        .store(store)
        .build()
        .unwrap();
    register_sample_behaviours(&composer);
    composer
}
