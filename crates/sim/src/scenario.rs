//! Scripted party scenario.

use affliction_core::{
    AbilityId, AfflictionEngine, Command, CommandOutcome, EntityId, HandlerArgs, MemoryHost, NoteTag,
    RoleId, RoleLearning, SpriteKind, Tick,
};
use anyhow::Result;
use tracing::{info, warn};

use crate::config::SimConfig;

const SCRIPT: &[&str] = &[
    "COR APPLY 0 slime 2",
    "CORRUPTION ADVANCE 1 parasite",
    "APPLY 2 bound",
    "TIMEPROGRESSION on",
];

const ENEMY_SKILL_NOTE: &str = "Tentacle lash. <CorruptAttack: hypnosis, 1, 0.6> <CorruptOnTouch: slime>";

const DRONE_ROLE: RoleId = RoleId(5);

pub fn run(mut engine: AfflictionEngine, sim: &SimConfig) -> Result<()> {
    let mut host = MemoryHost::new();
    let harold = host.spawn_member("Harold", 5, 120);
    let therese = host.spawn_member("Therese", 3, 80);
    let marsha = host.spawn_member("Marsha", 4, 90);
    host.define_role(
        DRONE_ROLE,
        vec![
            RoleLearning {
                level: 1,
                ability: AbilityId(40),
            },
            RoleLearning {
                level: 10,
                ability: AbilityId(41),
            },
        ],
    );

    let mut now = Tick::ZERO;

    for line in SCRIPT {
        let command: Command = line.parse()?;
        match engine.execute(&mut host, &command, now) {
            Ok(CommandOutcome::Staged(outcome)) => info!(line, stage = outcome.stage(), "command applied"),
            Ok(outcome) => info!(line, ?outcome, "command executed"),
            Err(err) => warn!(line, %err, "command rejected"),
        }
    }

    for tag in NoteTag::parse_all(ENEMY_SKILL_NOTE)? {
        let hit = engine.trigger_note(&mut host, harold, &tag, now)?;
        info!(trigger = %tag.trigger, type_id = %tag.type_id, landed = hit.is_some(), "note tag fired");
    }

    let spread = engine.invoke_handler("contagion", &mut host, harold, &HandlerArgs::spread("slime", 1.0), now)?;
    info!(infected = spread.affected.len(), "slime spread through the party");

    for _ in 0..sim.ticks {
        now = now + sim.tick_step;
        for progression in engine.tick(&mut host, now) {
            info!(
                entity = %progression.entity,
                type_id = %progression.type_id,
                from = progression.from,
                to = progression.to,
                "time progression"
            );
        }
    }

    host.set_encounter_active(true);
    let outcome = engine.apply(&mut host, therese, "drone", 4, now)?;
    if let Some(report) = outcome.transform {
        info!(
            role_changed = ?report.role_changed,
            learned = report.learned.len(),
            spawned = ?report.spawned,
            "drone transformation"
        );
    }

    let drained = engine.invoke_handler("drain", &mut host, marsha, &HandlerArgs::amount(200), now)?;
    info!(affected = drained.affected.len(), "drain resolved");

    let events = engine.drain_events();
    let dirty = engine.take_dirty();
    info!(events = events.len(), dirty = dirty.len(), "frame flushed");

    println!("== registered types ==");
    for registered in engine.describe_types() {
        let interval = registered
            .progression_interval
            .map_or_else(|| "manual".to_string(), |ticks| format!("every {ticks} ticks"));
        println!(
            "{:<10} {:<22} stages={} {}",
            registered.id, registered.name, registered.max_stage, interval
        );
    }

    println!();
    println!("== party at {now} ==");
    for &entity in host.party() {
        report(&engine, &host, entity);
    }

    Ok(())
}

fn report(engine: &AfflictionEngine, host: &MemoryHost, entity: EntityId) {
    let name = host
        .entity(entity)
        .map_or_else(|| entity.to_string(), |record| record.name.clone());
    let modifiers = engine.aggregator();

    println!("{name} ({entity})");
    for active in engine.describe(entity) {
        println!("  {} {}/{}", active.name, active.stage, active.max_stage);
    }
    println!(
        "  agi x{:.2}  atk x{:.2}  eva {:+.2}  move {:+}  behavior {}  control {}",
        modifiers.stat_multiplier(entity, "agi"),
        modifiers.stat_multiplier(entity, "atk"),
        modifiers.rate_additive(entity, "eva"),
        modifiers.movement_delta(entity),
        modifiers.behavior_override(entity),
        modifiers.can_control(entity),
    );
    println!(
        "  sprite {}  battler {}  composed {}",
        modifiers.sprite_name(entity, SpriteKind::Character, "Actor1"),
        modifiers.sprite_name(entity, SpriteKind::Battler, "Actor1"),
        modifiers.build_sprite_name(entity, "Actor1", "{base}_{type}{stage}"),
    );
    if engine.manager().is_converted(entity) {
        println!("  converted into a hostile");
    }
}
