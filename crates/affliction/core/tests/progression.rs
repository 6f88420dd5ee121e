use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use affliction_core::{
    AfflictionEngine, AfflictionEvent, BehaviorOverride, CallbackContext, CallbackHandle,
    CatalogBuilder, EffectCallbacks, EffectTypeDefinition, EngineConfig, EntityId, MemoryHost,
    Stage, StageChange, StageConfig, TagId, Tick,
};

#[derive(Default)]
struct Counter {
    applied: AtomicUsize,
    advanced: AtomicUsize,
    removed: AtomicUsize,
    maxed: AtomicUsize,
}

impl EffectCallbacks for Counter {
    fn on_apply(&self, _ctx: &mut CallbackContext<'_>, _stage: Stage) {
        self.applied.fetch_add(1, Ordering::SeqCst);
    }

    fn on_advance(&self, _ctx: &mut CallbackContext<'_>, _from: Stage, _to: Stage) {
        self.advanced.fetch_add(1, Ordering::SeqCst);
    }

    fn on_remove(&self, _ctx: &mut CallbackContext<'_>) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_max_stage(&self, _ctx: &mut CallbackContext<'_>) {
        self.maxed.fetch_add(1, Ordering::SeqCst);
    }
}

fn slime() -> EffectTypeDefinition {
    EffectTypeDefinition::new(
        "slime",
        "Slime Corruption",
        vec![
            StageConfig::new().movement(0),
            StageConfig::new().movement(-1),
            StageConfig::new().movement(-2),
            StageConfig::new().movement(-3).behavior(BehaviorOverride::Confused),
        ],
    )
    .with_tags([TagId(47), TagId(48), TagId(49), TagId(50)])
}

fn hypnosis() -> EffectTypeDefinition {
    EffectTypeDefinition::new(
        "hypnosis",
        "Hypnosis",
        vec![
            StageConfig::new().stat("atk", 0.9),
            StageConfig::new()
                .stat("atk", 0.9)
                .behavior(BehaviorOverride::CannotAct),
        ],
    )
}

fn bound() -> EffectTypeDefinition {
    EffectTypeDefinition::new(
        "bound",
        "Bound",
        vec![StageConfig::new().stat("atk", 0.8).rate("eva", -0.1)],
    )
}

fn setup(counter: Option<Arc<Counter>>) -> (AfflictionEngine, MemoryHost, EntityId) {
    let mut slime = slime();
    if let Some(counter) = counter {
        slime.callbacks = Some(CallbackHandle::from_arc(counter));
    }

    let mut builder = CatalogBuilder::new();
    builder
        .register_all([slime, hypnosis(), bound()])
        .unwrap();
    let engine = AfflictionEngine::new(Arc::new(builder.build()), EngineConfig::default());

    let mut host = MemoryHost::new();
    let hero = host.spawn_member("Harold", 3, 40);
    (engine, host, hero)
}

#[test]
fn requested_stage_is_clamped() {
    let (mut engine, mut host, hero) = setup(None);

    engine.apply(&mut host, hero, "slime", 0, Tick(0)).unwrap();
    assert_eq!(engine.stage(hero, "slime"), 1);

    engine.apply(&mut host, hero, "slime", 4 + 5, Tick(1)).unwrap();
    assert_eq!(engine.stage(hero, "slime"), 4);
}

#[test]
fn remove_clears_instance_and_every_linked_tag() {
    let (mut engine, mut host, hero) = setup(None);
    engine.apply(&mut host, hero, "slime", 3, Tick(0)).unwrap();
    assert!(host.entity(hero).unwrap().tags.contains(&TagId(49)));

    assert_eq!(engine.remove(&mut host, hero, "slime", Tick(1)), Ok(true));

    assert!(!engine.is_active(hero, "slime"));
    let tags = &host.entity(hero).unwrap().tags;
    for tag in [47, 48, 49, 50] {
        assert!(!tags.contains(&TagId(tag)));
    }
}

#[test]
fn advance_on_fresh_pair_equals_apply() {
    let (mut advanced, mut host_a, hero_a) = setup(None);
    let (mut applied, mut host_b, hero_b) = setup(None);

    let a = advanced
        .advance(&mut host_a, hero_a, "slime", 1, Tick(7))
        .unwrap();
    let b = applied.apply(&mut host_b, hero_b, "slime", 1, Tick(7)).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.change, StageChange::Applied(1));
    assert_eq!(
        advanced.manager().store().get(hero_a, "slime"),
        applied.manager().store().get(hero_b, "slime")
    );
    assert_eq!(host_a.entity(hero_a).unwrap().tags, host_b.entity(hero_b).unwrap().tags);
}

#[test]
fn stat_multipliers_from_distinct_types_multiply() {
    let (mut engine, mut host, hero) = setup(None);
    engine.apply(&mut host, hero, "hypnosis", 1, Tick(0)).unwrap();
    engine.apply(&mut host, hero, "bound", 1, Tick(0)).unwrap();

    let agg = engine.aggregator();
    assert!((agg.stat_multiplier(hero, "atk") - 0.72).abs() < 1e-9);
    assert!((agg.rate_additive(hero, "eva") + 0.1).abs() < 1e-9);
    assert_eq!(agg.stat_multiplier(hero, "mat"), 1.0);
}

#[test]
fn cannot_act_outranks_confused() {
    let (mut engine, mut host, hero) = setup(None);
    engine.apply(&mut host, hero, "slime", 4, Tick(0)).unwrap();
    assert_eq!(engine.aggregator().behavior_override(hero), BehaviorOverride::Confused);

    engine.apply(&mut host, hero, "hypnosis", 2, Tick(0)).unwrap();
    assert_eq!(engine.aggregator().behavior_override(hero), BehaviorOverride::CannotAct);
    assert!(!engine.aggregator().can_control(hero));
}

#[test]
fn slime_scenario_fires_callbacks_once_per_transition() {
    let counter = Arc::new(Counter::default());
    let (mut engine, mut host, hero) = setup(Some(Arc::clone(&counter)));

    engine.apply(&mut host, hero, "slime", 3, Tick(0)).unwrap();
    assert_eq!(engine.aggregator().movement_delta(hero), -2);
    assert_eq!(counter.applied.load(Ordering::SeqCst), 1);

    let outcome = engine.advance(&mut host, hero, "slime", 1, Tick(1)).unwrap();
    assert_eq!(outcome.change, StageChange::Changed { from: 3, to: 4 });
    assert_eq!(engine.aggregator().movement_delta(hero), -3);
    assert_eq!(counter.advanced.load(Ordering::SeqCst), 1);
    assert_eq!(counter.maxed.load(Ordering::SeqCst), 1);

    let outcome = engine.advance(&mut host, hero, "slime", 1, Tick(2)).unwrap();
    assert_eq!(outcome.change, StageChange::Unchanged(4));
    assert_eq!(engine.aggregator().movement_delta(hero), -3);
    assert_eq!(counter.advanced.load(Ordering::SeqCst), 1);
    assert_eq!(counter.maxed.load(Ordering::SeqCst), 1);

    engine.remove(&mut host, hero, "slime", Tick(3)).unwrap();
    engine.remove(&mut host, hero, "slime", Tick(4)).unwrap();
    assert_eq!(counter.removed.load(Ordering::SeqCst), 1);
}

#[test]
fn events_describe_each_transition() {
    let (mut engine, mut host, hero) = setup(None);
    engine.apply(&mut host, hero, "slime", 3, Tick(0)).unwrap();
    engine.advance(&mut host, hero, "slime", 5, Tick(1)).unwrap();
    engine.remove(&mut host, hero, "slime", Tick(2)).unwrap();

    assert_eq!(
        engine.drain_events(),
        vec![
            AfflictionEvent::Applied {
                entity: hero,
                type_id: "slime".into(),
                stage: 3,
            },
            AfflictionEvent::StageChanged {
                entity: hero,
                type_id: "slime".into(),
                from: 3,
                to: 4,
            },
            AfflictionEvent::MaxStageReached {
                entity: hero,
                type_id: "slime".into(),
            },
            AfflictionEvent::Removed {
                entity: hero,
                type_id: "slime".into(),
                stage: 4,
            },
        ]
    );
    assert!(engine.drain_events().is_empty());
}

#[test]
fn remove_all_walks_types_in_lexical_order() {
    let (mut engine, mut host, hero) = setup(None);
    engine.apply(&mut host, hero, "slime", 1, Tick(0)).unwrap();
    engine.apply(&mut host, hero, "bound", 1, Tick(0)).unwrap();
    engine.apply(&mut host, hero, "hypnosis", 1, Tick(0)).unwrap();

    let removed = engine.remove_all(&mut host, hero, Tick(1));
    let removed: Vec<_> = removed.iter().map(|id| id.as_str()).collect();
    assert_eq!(removed, ["bound", "hypnosis", "slime"]);
    assert!(engine.list_active(hero).is_empty());
}
