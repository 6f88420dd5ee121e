use std::sync::Arc;

use affliction_core::{
    AfflictionEngine, CatalogBuilder, EffectTypeDefinition, EngineConfig, EntityAfflictions,
    EntityHost, MemoryHost, StageConfig, TagId, TemplateId, Tick, TransformAction,
};

fn engine() -> AfflictionEngine {
    let mut builder = CatalogBuilder::new();
    builder
        .register(
            EffectTypeDefinition::new(
                "slime",
                "Slime",
                vec![StageConfig::new(), StageConfig::new(), StageConfig::new()],
            )
            .with_tags([TagId(47), TagId(48), TagId(49)]),
        )
        .unwrap()
        .register(EffectTypeDefinition::new(
            "hypnosis",
            "Hypnosis",
            vec![StageConfig::new().transform(TransformAction::hostile(TemplateId(6), false))],
        ))
        .unwrap();
    AfflictionEngine::new(Arc::new(builder.build()), EngineConfig::default())
}

#[test]
fn entity_record_survives_bincode() {
    let mut saved = engine();
    let mut host = MemoryHost::new();
    let hero = host.spawn_member("Ann", 1, 10);
    host.set_encounter_active(true);
    saved.apply(&mut host, hero, "slime", 2, Tick(30)).unwrap();
    saved.apply(&mut host, hero, "hypnosis", 1, Tick(31)).unwrap();

    let bytes = bincode::serialize(&saved.export_entity(hero)).unwrap();
    let record: EntityAfflictions = bincode::deserialize(&bytes).unwrap();

    let mut fresh_host = MemoryHost::new();
    let fresh_hero = fresh_host.spawn_member("Ann", 1, 10);
    let mut loaded = engine();
    let dropped = loaded.import_entity(&mut fresh_host, fresh_hero, record);

    assert!(dropped.is_empty());
    assert_eq!(loaded.stage(fresh_hero, "slime"), 2);
    assert_eq!(
        loaded.manager().store().get(fresh_hero, "slime").unwrap().applied_at,
        Tick(30)
    );
    assert!(fresh_host.has_tag(fresh_hero, TagId(48)));
    assert!(fresh_host.has_tag(fresh_hero, EngineConfig::DEFAULT_TERMINAL_TAG));
    assert!(loaded.manager().is_converted(fresh_hero));
}
