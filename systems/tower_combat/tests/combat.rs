use std::{collections::BTreeMap, time::Duration};

use rampart_core::{EntityRef, Event, ProjectileColor, StructureId, UnitId, Vec2};
use rampart_system_projectiles::ProjectilePool;
use rampart_system_tower_combat::{CombatResolver, CombatTargets, Shot, DEFAULT_FLIGHT_TIME};

#[derive(Default)]
struct Arena {
    positions: BTreeMap<EntityRef, Vec2>,
    damage: Vec<(EntityRef, f32)>,
    attackers: Vec<(StructureId, UnitId)>,
}

impl Arena {
    fn place(&mut self, entity: EntityRef, x: f32, y: f32) {
        let _ = self.positions.insert(entity, Vec2::new(x, y));
    }

    fn remove(&mut self, entity: EntityRef) {
        let _ = self.positions.remove(&entity);
    }
}

impl CombatTargets for Arena {
    fn locate(&self, entity: EntityRef) -> Option<Vec2> {
        self.positions.get(&entity).copied()
    }

    fn apply_damage(&mut self, entity: EntityRef, amount: f32, _out: &mut Vec<Event>) {
        self.damage.push((entity, amount));
    }

    fn register_attacker(&mut self, structure: StructureId, unit: UnitId) {
        self.attackers.push((structure, unit));
    }
}

const TOWER: EntityRef = EntityRef::Structure(StructureId::new(1));
const GRUNT: EntityRef = EntityRef::Unit(UnitId::new(7));

fn shot(source: EntityRef, target: EntityRef, damage: f32) -> Shot {
    Shot {
        source,
        target,
        damage,
        color: ProjectileColor::from_rgb(255, 0, 0),
    }
}

fn arena() -> Arena {
    let mut arena = Arena::default();
    arena.place(TOWER, 0.0, 0.0);
    arena.place(GRUNT, 10.0, 0.0);
    arena
}

#[test]
fn projectile_lands_after_flight_time() {
    let mut resolver = CombatResolver::default();
    let mut arena = arena();
    let mut out = Vec::new();

    let projectile = resolver
        .fire(shot(TOWER, GRUNT, 4.0), &mut arena, &mut out)
        .expect("shot launches");
    resolver.advance(Duration::from_millis(500), &mut arena, &mut out);
    assert!(arena.damage.is_empty());

    resolver.advance(Duration::from_millis(500), &mut arena, &mut out);
    assert_eq!(arena.damage, vec![(GRUNT, 4.0)]);
    assert_eq!(
        out,
        vec![
            Event::ProjectileFired {
                projectile,
                source: TOWER,
                target: GRUNT,
            },
            Event::ProjectileHit {
                projectile,
                target: GRUNT,
                damage: 4.0,
            },
        ]
    );
    assert_eq!(resolver.pool().active_count(), 0);
}

#[test]
fn target_dying_mid_flight_returns_projectile_without_damage() {
    let mut resolver = CombatResolver::default();
    let mut arena = arena();
    let mut out = Vec::new();
    let idle_before = resolver.pool().idle_count();

    let projectile = resolver
        .fire(shot(TOWER, GRUNT, 4.0), &mut arena, &mut out)
        .expect("shot launches");
    resolver.advance(Duration::from_millis(400), &mut arena, &mut out);
    arena.remove(GRUNT);
    resolver.advance(Duration::from_millis(400), &mut arena, &mut out);

    assert!(arena.damage.is_empty());
    assert!(!out
        .iter()
        .any(|event| matches!(event, Event::ProjectileHit { .. })));
    assert_eq!(
        out.last(),
        Some(&Event::ProjectileExpired {
            projectile,
            target: GRUNT,
        })
    );
    assert_eq!(resolver.pool().idle_count(), idle_before);
}

#[test]
fn projectile_follows_moving_target() {
    let mut resolver = CombatResolver::default();
    let mut arena = arena();
    let mut out = Vec::new();

    let projectile = resolver
        .fire(shot(TOWER, GRUNT, 1.0), &mut arena, &mut out)
        .expect("shot launches");
    resolver.advance(Duration::from_millis(500), &mut arena, &mut out);
    let halfway = resolver.pool().get(projectile).expect("slot").position();
    assert!((halfway - Vec2::new(5.0, 0.0)).length() < 1e-4);

    arena.place(GRUNT, 0.0, 20.0);
    resolver.advance(Duration::from_millis(250), &mut arena, &mut out);
    let bent = resolver.pool().get(projectile).expect("slot").position();
    assert!((bent - Vec2::new(0.0, 15.0)).length() < 1e-4);
}

#[test]
fn unit_firing_at_structure_registers_as_attacker() {
    let mut resolver = CombatResolver::default();
    let mut arena = arena();
    let mut out = Vec::new();

    let _ = resolver.fire(shot(GRUNT, TOWER, 3.0), &mut arena, &mut out);
    let _ = resolver.fire(shot(TOWER, GRUNT, 3.0), &mut arena, &mut out);

    assert_eq!(arena.attackers, vec![(StructureId::new(1), UnitId::new(7))]);
}

#[test]
fn shots_at_missing_entities_are_dropped() {
    let mut resolver = CombatResolver::default();
    let mut arena = arena();
    let mut out = Vec::new();
    let ghost = EntityRef::Unit(UnitId::new(99));

    assert!(resolver.fire(shot(TOWER, ghost, 1.0), &mut arena, &mut out).is_none());
    assert!(resolver.fire(shot(ghost, TOWER, 1.0), &mut arena, &mut out).is_none());
    assert!(out.is_empty());
    assert!(arena.attackers.is_empty());
    assert_eq!(resolver.pool().active_count(), 0);
}

#[test]
fn pool_is_reused_across_volleys() {
    let mut resolver = CombatResolver::new(ProjectilePool::new(), DEFAULT_FLIGHT_TIME);
    let mut arena = arena();
    let mut out = Vec::new();

    for _ in 0..5 {
        let _ = resolver.fire(shot(TOWER, GRUNT, 1.0), &mut arena, &mut out);
        let _ = resolver.fire(shot(TOWER, GRUNT, 1.0), &mut arena, &mut out);
        resolver.advance(DEFAULT_FLIGHT_TIME, &mut arena, &mut out);
    }

    assert_eq!(resolver.pool().capacity(), 2);
    assert_eq!(arena.damage.len(), 10);
}
