//! Integration tests for mimic_ai

use mimic_ai::prelude::*;
use mimic_event::{BroadcastChannel, SimulationEvent, SoundEvent};
use mimic_math::Vec3;
use mimic_nav::{GridAgent, NavGrid};
use parking_lot::Mutex;
use rand::rngs::mock::StepRng;
use std::sync::Arc;

const DT: f32 = 0.05;

struct Player {
    position: Mutex<Vec3>,
    hidden: Mutex<bool>,
}

impl Player {
    fn at(position: Vec3) -> Arc<Self> {
        Arc::new(Self {
            position: Mutex::new(position),
            hidden: Mutex::new(false),
        })
    }

    fn move_to(&self, position: Vec3) {
        *self.position.lock() = position;
    }
}

impl TargetableEntity for Player {
    fn is_hidden(&self) -> bool {
        *self.hidden.lock()
    }

    fn position(&self) -> Vec3 {
        *self.position.lock()
    }

    fn detection_anchors(&self) -> Vec<Vec3> {
        let p = *self.position.lock();
        vec![p, p + Vec3::Y * 0.5]
    }
}

#[derive(Default)]
struct MimicryLog(Mutex<Vec<f32>>);

impl MimicryStrengthControl for MimicryLog {
    fn set_target_strength(&self, strength: f32) {
        self.0.lock().push(strength);
    }
}

#[derive(Default)]
struct SaveLog(Mutex<Vec<SaveCategory>>);

impl SaveCategorySink for SaveLog {
    fn record(&self, category: SaveCategory) {
        self.0.lock().push(category);
    }
}

struct Harness {
    mimic: Mimic,
    player: Arc<Player>,
    stun: Arc<StunMeter>,
    traps: Arc<TrapPointRegistry>,
    vents: Arc<VentRegistry>,
    mimicry: Arc<MimicryLog>,
    saves: Arc<SaveLog>,
    changes: Arc<Mutex<Vec<StateChange>>>,
    sounds: BroadcastChannel<SoundEvent>,
    simulation: BroadcastChannel<SimulationEvent>,
}

fn sight_config() -> MimicConfig {
    MimicConfig::default().with_perception(
        PerceptionConfig::default()
            .with_max_sight_range(10.0)
            .with_view_angle(60.0)
            .with_eye_height(0.0),
    )
}

fn harness(rows: &[&str], start: Vec3, config: MimicConfig, rng: Option<StepRng>) -> Harness {
    let grid = Arc::new(NavGrid::from_rows(rows, 1.0, Vec3::ZERO).unwrap());
    let player = Player::at(Vec3::new(-100.0, 0.0, -100.0));
    let stun = Arc::new(StunMeter::new(0.0));
    let traps = Arc::new(TrapPointRegistry::new());
    let vents = Arc::new(VentRegistry::new());
    let mimicry = Arc::new(MimicryLog::default());
    let saves = Arc::new(SaveLog::default());

    let world = WorldContext::new(player.clone(), grid.clone())
        .with_stun(stun.clone())
        .with_traps(traps.clone())
        .with_vents(vents.clone())
        .with_mimicry(mimicry.clone())
        .with_save_sink(saves.clone());

    let agent = GridAgent::new(grid, start);
    let mut mimic = Mimic::new(config, Box::new(agent), world).unwrap();
    if let Some(rng) = rng {
        mimic = mimic.with_rng(Box::new(rng));
    }

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    mimic.on_state_change(move |change| sink.lock().push(*change));

    let sounds = BroadcastChannel::new();
    let simulation = BroadcastChannel::new();
    mimic.activate(&sounds, &simulation);

    Harness {
        mimic,
        player,
        stun,
        traps,
        vents,
        mimicry,
        saves,
        changes,
        sounds,
        simulation,
    }
}

fn open_room() -> Vec<&'static str> {
    vec!["............"; 12]
}

fn fixed_roll(roll: f32) -> StepRng {
    StepRng::new((roll as f64 * 4294967296.0) as u64, 0)
}

#[test]
fn test_activation_enters_wander() {
    let h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    assert_eq!(h.saves.0.lock().as_slice(), &[SaveCategory::Idle]);
    assert_eq!(h.sounds.subscriber_count(), 1);
    assert_eq!(h.simulation.subscriber_count(), 1);
}

#[test]
fn test_target_in_view_starts_preparing() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.player.move_to(Vec3::new(1.5, 0.0, 6.5));

    h.mimic.tick(DT);
    assert!(h.mimic.perception().has_target);
    assert_eq!(h.mimic.state(), BehaviorKind::PreparingToChase);
    assert_eq!(h.mimic.save_category(), SaveCategory::Chasing);
}

#[test]
fn test_target_beyond_range_ignored() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 0.5), sight_config(), None);
    h.player.move_to(Vec3::new(1.5, 0.0, 11.0));

    h.mimic.tick(DT);
    assert!(!h.mimic.perception().has_target);
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
}

#[test]
fn test_sound_within_path_length_starts_search() {
    let corridor = ["..............."];
    let mut h = harness(&corridor, Vec3::new(0.5, 0.0, 0.5), sight_config(), None);

    // Path length 12 against a threshold of 10
    h.sounds.publish(SoundEvent::new(Vec3::new(12.5, 0.0, 0.5), 10.0));
    h.mimic.tick(DT);
    assert!(h.mimic.perception().point_of_interest.is_none());
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);

    // Path length 8
    h.sounds.publish(SoundEvent::new(Vec3::new(8.5, 0.0, 0.5), 10.0));
    h.mimic.tick(DT);
    assert_eq!(
        h.mimic.perception().point_of_interest,
        Some(Vec3::new(8.5, 0.0, 0.5))
    );
    assert_eq!(h.mimic.state(), BehaviorKind::Search);
}

#[test]
fn test_search_clears_point_and_returns_to_wander() {
    let corridor = ["..........."];
    let mut h = harness(&corridor, Vec3::new(0.5, 0.0, 0.5), sight_config(), None);
    h.sounds.publish(SoundEvent::new(Vec3::new(4.5, 0.0, 0.5), 10.0));

    for _ in 0..200 {
        h.mimic.tick(DT);
    }
    assert!(h.mimic.perception().point_of_interest.is_none());
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    let visited: Vec<BehaviorKind> = h.changes.lock().iter().map(|c| c.to).collect();
    assert_eq!(visited, vec![BehaviorKind::Search, BehaviorKind::Wander]);
}

fn trap_config() -> MimicConfig {
    sight_config()
        .with_wander(
            WanderConfig::default()
                .with_decision_interval(0.1, 0.1)
                .with_trap_probability(0.2),
        )
        .with_set_trap(SetTrapConfig::default().with_detection_radius(20.0))
}

#[test]
fn test_trap_roll_below_probability_sets_trap() {
    let mut h = harness(
        &open_room(),
        Vec3::new(1.5, 0.0, 1.5),
        trap_config(),
        Some(fixed_roll(0.15)),
    );
    h.traps
        .register(TrapPoint::new(Vec3::new(6.5, 0.0, 6.5), Vec3::X));

    for _ in 0..3 {
        h.mimic.tick(DT);
    }
    assert_eq!(h.mimic.state(), BehaviorKind::SetTrap);
    assert!(h.mimic.behaviors().set_trap.trap().is_some());
}

#[test]
fn test_trap_roll_above_probability_keeps_wandering() {
    let mut h = harness(
        &open_room(),
        Vec3::new(1.5, 0.0, 1.5),
        trap_config(),
        Some(fixed_roll(0.25)),
    );
    h.traps
        .register(TrapPoint::new(Vec3::new(6.5, 0.0, 6.5), Vec3::X));

    for _ in 0..10 {
        h.mimic.tick(DT);
    }
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    assert!(h.changes.lock().is_empty());
}

#[test]
fn test_failed_trap_exits_and_respects_cooldown() {
    let config = trap_config().with_set_trap(SetTrapConfig::default().with_cooldown(100.0));
    let mut h = harness(
        &open_room(),
        Vec3::new(1.5, 0.0, 1.5),
        config,
        Some(fixed_roll(0.15)),
    );

    // No trap points registered: entry fails and exits next tick
    for _ in 0..4 {
        h.mimic.tick(DT);
    }
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);

    for _ in 0..20 {
        h.mimic.tick(DT);
    }
    let entries = h
        .changes
        .lock()
        .iter()
        .filter(|c| c.to == BehaviorKind::SetTrap)
        .count();
    assert_eq!(entries, 1);
}

#[test]
fn test_chase_catches_target_same_tick() {
    let config = sight_config().with_chase(ChaseConfig::default().with_catch_radius(0.75));
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), config, None);
    h.mimic.force_state(BehaviorKind::Chase);
    h.player.move_to(Vec3::new(1.5, 0.0, 2.0));

    h.mimic.tick(DT);
    assert!(h.mimic.has_caught_target());
    assert_eq!(h.mimic.state(), BehaviorKind::Chase);
}

#[test]
fn test_chase_gives_up_when_target_lost() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.mimic.force_state(BehaviorKind::Chase);

    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    assert!(h.mimic.movement().overrides().is_empty());
}

#[test]
fn test_preparing_leads_to_chase_after_delay() {
    let config = sight_config()
        .with_preparing_to_chase(PreparingToChaseConfig::default().with_delay(0.2));
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), config, None);
    h.player.move_to(Vec3::new(1.5, 0.0, 8.5));

    for _ in 0..8 {
        h.mimic.tick(DT);
    }
    assert_eq!(h.mimic.state(), BehaviorKind::Chase);
    assert_eq!(
        h.mimic.movement().overrides().speed,
        Some(ChaseConfig::default().speed)
    );
}

#[test]
fn test_stun_preempts_and_returns_to_wander() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.player.move_to(Vec3::new(1.5, 0.0, 5.5));
    h.mimic.force_state(BehaviorKind::Chase);
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Chase);

    h.stun.apply_stun(1.0);
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Stunned);
    assert!(h.mimic.movement().is_stopped());
    // Chase overrides do not leak into Stunned
    assert!(h.mimic.movement().overrides().is_empty());

    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Stunned);

    h.stun.clear();
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    assert!(!h.mimic.movement().is_stopped());
}

#[test]
fn test_exit_runs_before_enter() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.player.move_to(Vec3::new(1.5, 0.0, 5.5));
    h.mimic.force_state(BehaviorKind::Chase);
    h.mimic.tick(DT);
    h.mimicry.0.lock().clear();

    h.stun.apply_stun(1.0);
    h.mimic.tick(DT);

    // Chase exit restores full strength, then Stunned enter zeroes it
    assert_eq!(h.mimicry.0.lock().as_slice(), &[1.0, 0.0]);

    let last = *h.changes.lock().last().unwrap();
    assert_eq!(last.from, BehaviorKind::Chase);
    assert_eq!(last.to, BehaviorKind::Stunned);
}

#[test]
fn test_save_category_follows_transitions() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.mimic.force_state(BehaviorKind::Chase);
    h.mimic.force_state(BehaviorKind::Search);
    assert_eq!(
        h.saves.0.lock().as_slice(),
        &[SaveCategory::Idle, SaveCategory::Chasing, SaveCategory::Idle]
    );
}

#[test]
fn test_pause_and_resume() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.mimic.tick(DT);
    let time = h.mimic.time();

    h.simulation.publish(SimulationEvent::PauseAll);
    h.mimic.tick(DT);
    assert!(h.mimic.is_paused());
    assert!(h.mimic.movement().is_stopped());
    assert_eq!(h.mimic.time(), time);

    h.simulation.publish(SimulationEvent::ResumeAll);
    h.mimic.tick(DT);
    assert!(!h.mimic.is_paused());
    assert!(!h.mimic.movement().is_stopped());
    assert!(h.mimic.time() > time);
}

#[test]
fn test_deactivate_releases_subscriptions() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.mimic.deactivate();
    assert!(!h.mimic.is_active());
    assert_eq!(h.sounds.subscriber_count(), 0);
    assert_eq!(h.simulation.subscriber_count(), 0);

    let position = h.mimic.position();
    h.mimic.tick(DT);
    assert_eq!(h.mimic.position(), position);
}

#[test]
fn test_invalid_config_rejected() {
    let grid = Arc::new(NavGrid::from_rows(&["..."], 1.0, Vec3::ZERO).unwrap());
    let world = WorldContext::new(Player::at(Vec3::ZERO), grid.clone());
    let config = MimicConfig::default()
        .with_perception(PerceptionConfig::default().with_view_angle(400.0));
    let agent = GridAgent::new(grid, Vec3::new(0.5, 0.0, 0.5));
    assert!(matches!(
        Mimic::new(config, Box::new(agent), world),
        Err(mimic_ai::AiError::InvalidConfig(_))
    ));
}

fn visited(h: &Harness) -> Vec<(BehaviorKind, BehaviorKind)> {
    h.changes.lock().iter().map(|c| (c.from, c.to)).collect()
}

fn tick_until(h: &mut Harness, kind: BehaviorKind, max_ticks: usize) {
    for _ in 0..max_ticks {
        if h.mimic.state() == kind {
            return;
        }
        h.mimic.tick(DT);
    }
}

#[test]
fn test_force_state_ignored_while_inactive() {
    let grid = Arc::new(NavGrid::from_rows(&open_room(), 1.0, Vec3::ZERO).unwrap());
    let saves = Arc::new(SaveLog::default());
    let world = WorldContext::new(Player::at(Vec3::ZERO), grid.clone()).with_save_sink(saves.clone());
    let agent = GridAgent::new(grid, Vec3::new(1.5, 0.0, 1.5));
    let mut mimic = Mimic::new(sight_config(), Box::new(agent), world).unwrap();

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    mimic.on_state_change(move |change: &StateChange| sink.lock().push(*change));

    mimic.force_state(BehaviorKind::Chase);
    assert!(!mimic.is_active());
    assert_eq!(mimic.state(), BehaviorKind::Wander);
    assert!(changes.lock().is_empty());
    assert!(saves.0.lock().is_empty());
    assert!(mimic.movement().overrides().is_empty());
}

#[test]
fn test_target_seen_while_searching_starts_preparing() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.sounds.publish(SoundEvent::new(Vec3::new(1.5, 0.0, 9.5), 10.0));
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Search);

    h.player.move_to(Vec3::new(1.5, 0.0, 5.5));
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::PreparingToChase);
    assert_eq!(
        visited(&h),
        vec![
            (BehaviorKind::Wander, BehaviorKind::Search),
            (BehaviorKind::Search, BehaviorKind::PreparingToChase),
        ]
    );
}

#[test]
fn test_target_seen_while_trapping_starts_preparing() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.traps
        .register(TrapPoint::new(Vec3::new(1.5, 0.0, 8.5), Vec3::X));
    h.mimic.force_state(BehaviorKind::SetTrap);
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::SetTrap);
    assert_eq!(h.mimic.movement().overrides().stopping_distance, Some(0.0));

    h.player.move_to(Vec3::new(1.5, 0.0, 5.5));
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::PreparingToChase);
    // SetTrap exit dropped its override
    assert!(h.mimic.movement().overrides().is_empty());
}

#[test]
fn test_sound_while_trapping_starts_search() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.traps
        .register(TrapPoint::new(Vec3::new(1.5, 0.0, 8.5), Vec3::X));
    h.mimic.force_state(BehaviorKind::SetTrap);
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::SetTrap);

    h.sounds.publish(SoundEvent::new(Vec3::new(1.5, 0.0, 9.5), 10.0));
    h.mimic.tick(DT);
    assert_eq!(h.mimic.state(), BehaviorKind::Search);
    assert_eq!(
        h.mimic.perception().point_of_interest,
        Some(Vec3::new(1.5, 0.0, 9.5))
    );
}

#[test]
fn test_trap_wait_times_out_to_wander() {
    let config = sight_config().with_set_trap(SetTrapConfig::default().with_max_wait(0.5));
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), config, None);
    h.traps
        .register(TrapPoint::new(Vec3::new(1.5, 0.0, 3.5), Vec3::X));
    h.mimic.force_state(BehaviorKind::SetTrap);
    h.mimic.tick(DT);
    assert!(h.mimic.behaviors().set_trap.trap().is_some());

    tick_until(&mut h, BehaviorKind::Wander, 200);
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    assert_eq!(
        visited(&h).last(),
        Some(&(BehaviorKind::SetTrap, BehaviorKind::Wander))
    );
    assert!((h.mimic.position().z - 3.5).abs() < 0.2);
    assert!(!h.mimic.movement().is_stopped());
    assert!(!h.mimic.behaviors().set_trap.cooldown_elapsed(h.mimic.time()));
}

#[test]
fn test_vent_crossing_returns_to_wander() {
    let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
    h.vents.register(Vent {
        id: 3,
        entrances: vec![Vec3::new(1.5, 0.0, 3.5), Vec3::new(9.5, 0.0, 9.5)],
    });
    h.mimic.force_state(BehaviorKind::Vent);
    assert_eq!(
        h.mimic.behaviors().vent.entrance().map(|e| e.index),
        Some(0)
    );

    tick_until(&mut h, BehaviorKind::Wander, 200);
    assert_eq!(h.mimic.state(), BehaviorKind::Wander);
    assert_eq!(
        visited(&h).last(),
        Some(&(BehaviorKind::Vent, BehaviorKind::Wander))
    );
    assert!(h.mimic.position().distance(Vec3::new(9.5, 0.0, 9.5)) < 1e-3);
    assert!(!h.mimic.behaviors().vent.cooldown_elapsed(h.mimic.time()));
}

#[test]
fn test_stun_preempts_every_state() {
    let states = [
        BehaviorKind::Wander,
        BehaviorKind::Search,
        BehaviorKind::SetTrap,
        BehaviorKind::PreparingToChase,
        BehaviorKind::Vent,
    ];
    for kind in states {
        let mut h = harness(&open_room(), Vec3::new(1.5, 0.0, 1.5), sight_config(), None);
        h.traps
            .register(TrapPoint::new(Vec3::new(1.5, 0.0, 8.5), Vec3::X));
        h.vents.register(Vent {
            id: 1,
            entrances: vec![Vec3::new(1.5, 0.0, 6.5), Vec3::new(9.5, 0.0, 9.5)],
        });
        if kind != BehaviorKind::Wander {
            h.mimic.force_state(kind);
        }
        assert_eq!(h.mimic.state(), kind);

        h.stun.apply_stun(1.0);
        h.mimic.tick(DT);
        assert_eq!(h.mimic.state(), BehaviorKind::Stunned, "from {:?}", kind);
        assert!(h.mimic.movement().is_stopped());
        assert!(h.mimic.movement().overrides().is_empty());
        assert_eq!(
            visited(&h).last(),
            Some(&(kind, BehaviorKind::Stunned))
        );

        h.stun.clear();
        h.mimic.tick(DT);
        assert_eq!(h.mimic.state(), BehaviorKind::Wander, "after {:?}", kind);
        assert!(!h.mimic.movement().is_stopped());
    }
}
