use std::sync::Arc;

use affliction_core::{
    AbilityId, AfflictionEngine, AfflictionError, AfflictionEvent, BehaviorOverride,
    CatalogBuilder, EffectTypeDefinition, EngineConfig, EntityHost, MemoryHost, RoleId,
    RoleLearning, StageConfig, TagId, TemplateId, Tick, TransformAction,
};

const TERMINAL: TagId = TagId(1);

fn engine() -> AfflictionEngine {
    let mut builder = CatalogBuilder::new();
    builder
        .register(EffectTypeDefinition::new(
            "hypnosis",
            "Hypnosis",
            vec![
                StageConfig::new(),
                StageConfig::new(),
                StageConfig::new()
                    .behavior(BehaviorOverride::Charmed)
                    .transform(TransformAction::hostile(TemplateId(6), true)),
            ],
        ))
        .unwrap()
        .register(EffectTypeDefinition::new(
            "drone",
            "Drone",
            vec![
                StageConfig::new(),
                StageConfig::new().transform(TransformAction {
                    forget_abilities: vec![AbilityId(3)],
                    ..TransformAction::role(RoleId(5), true).with_hostile(TemplateId(6), false)
                }),
            ],
        ))
        .unwrap();
    AfflictionEngine::new(Arc::new(builder.build()), EngineConfig::default())
}

#[test]
fn conversion_in_encounter_spawns_exactly_once() {
    let mut engine = engine();
    let mut host = MemoryHost::new();
    let hero = host.spawn_member("Harold", 4, 40);
    host.set_encounter_active(true);

    let outcome = engine.apply(&mut host, hero, "hypnosis", 3, Tick(0)).unwrap();
    let spawned = outcome.transform.and_then(|report| report.spawned).unwrap();

    assert_eq!(host.hostiles(), &[spawned]);
    assert_eq!(host.name(spawned).as_deref(), Some("Harold"));
    assert!(host.has_tag(hero, TERMINAL));
    assert!(engine.manager().is_converted(hero));

    let again = engine.apply(&mut host, hero, "hypnosis", 3, Tick(1)).unwrap();
    assert!(again.change.is_unchanged());
    assert!(again.transform.is_none());
    assert_eq!(host.hostiles().len(), 1);

    let converted: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, AfflictionEvent::EntityConverted { .. }))
        .collect();
    assert_eq!(
        converted,
        vec![AfflictionEvent::EntityConverted {
            original: hero,
            spawned,
            template: TemplateId(6),
        }]
    );
}

#[test]
fn conversion_outside_encounter_keeps_role_change() {
    let mut engine = engine();
    let mut host = MemoryHost::new();
    let hero = host.spawn_member("Harold", 4, 40);
    host.define_role(
        RoleId(5),
        vec![
            RoleLearning {
                level: 2,
                ability: AbilityId(20),
            },
            RoleLearning {
                level: 8,
                ability: AbilityId(21),
            },
        ],
    );
    host.grant_ability(hero, AbilityId(3));

    let outcome = engine.apply(&mut host, hero, "drone", 2, Tick(0)).unwrap();
    let report = outcome.transform.unwrap();

    assert_eq!(report.role_changed, Some(RoleId(5)));
    assert_eq!(report.skipped, Some(AfflictionError::ConversionUnavailable(hero)));
    assert!(report.spawned.is_none());

    let record = host.entity(hero).unwrap();
    assert_eq!(record.role, Some(RoleId(5)));
    assert_eq!(record.level, 4);
    assert!(record.abilities.contains(&AbilityId(20)));
    assert!(!record.abilities.contains(&AbilityId(21)));
    assert!(!record.abilities.contains(&AbilityId(3)));
    assert!(!host.has_tag(hero, TERMINAL));
    assert!(!engine.manager().is_converted(hero));
}

#[test]
fn restore_is_explicit_and_clears_terminal_tag() {
    let mut engine = engine();
    let mut host = MemoryHost::new();
    let hero = host.spawn_member("Harold", 4, 40);
    host.set_encounter_active(true);
    engine.apply(&mut host, hero, "hypnosis", 3, Tick(0)).unwrap();

    engine.remove(&mut host, hero, "hypnosis", Tick(1)).unwrap();
    assert!(host.has_tag(hero, TERMINAL));

    assert_eq!(engine.restore_converted(&mut host, hero), Some(TERMINAL));
    assert!(!host.has_tag(hero, TERMINAL));
    assert_eq!(engine.restore_converted(&mut host, hero), None);
}

#[test]
fn queries_never_trigger_transforms() {
    let mut engine = engine();
    let mut host = MemoryHost::new();
    let hero = host.spawn_member("Harold", 4, 40);
    host.set_encounter_active(true);
    engine.apply(&mut host, hero, "hypnosis", 3, Tick(0)).unwrap();

    for _ in 0..3 {
        let agg = engine.aggregator();
        agg.behavior_override(hero);
        agg.visual_overlay(hero);
        engine.describe(hero);
    }
    assert_eq!(host.hostiles().len(), 1);
}
