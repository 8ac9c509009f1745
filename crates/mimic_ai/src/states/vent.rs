//! Slip through the vent network to another entrance

use crate::config::VentConfig;
use crate::state_machine::{Behavior, BehaviorContext, BehaviorKind};
use crate::world::VentEntrance;
use rand::Rng;

pub struct VentState {
    config: VentConfig,
    entrance: Option<VentEntrance>,
    finished: bool,
    last_exit: Option<f32>,
}

impl VentState {
    pub fn new(config: VentConfig) -> Self {
        Self {
            config,
            entrance: None,
            finished: false,
            last_exit: None,
        }
    }

    /// Entrance the agent is heading for
    pub fn entrance(&self) -> Option<VentEntrance> {
        self.entrance
    }

    /// Crossed over, or no entrance was reachable
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Chance per Wander decision of heading for a vent
    pub fn probability(&self) -> f32 {
        self.config.probability
    }

    /// Enough time has passed since the last exit to enter again
    pub fn cooldown_elapsed(&self, time: f32) -> bool {
        self.last_exit
            .map_or(true, |exit| time - exit >= self.config.cooldown)
    }

    /// Nearest entrance by path length; ties keep the first found
    fn nearest_entrance(&self, ctx: &BehaviorContext<'_>) -> Option<VentEntrance> {
        let mut best: Option<(f32, VentEntrance)> = None;
        let candidates = ctx
            .world
            .vents
            .entrances_within_range(ctx.movement.position(), self.config.search_radius);

        for entrance in candidates {
            let Some(path) = ctx.movement.calculate_path(entrance.position) else {
                continue;
            };
            if !path.is_complete() {
                continue;
            }
            let length = path.length();
            if best.map_or(true, |(best_length, _)| length < best_length) {
                best = Some((length, entrance));
            }
        }

        best.map(|(_, entrance)| entrance)
    }
}

impl Behavior for VentState {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Vent
    }

    fn enter(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.finished = false;
        self.entrance = self.nearest_entrance(ctx);

        match self.entrance {
            Some(entrance) => {
                ctx.movement.set_is_stopped(false);
                if !ctx.movement.set_destination(entrance.position) {
                    self.finished = true;
                }
            }
            None => {
                log::debug!("No reachable vent entrance");
                self.finished = true;
            }
        }
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>) {
        if self.finished {
            return;
        }
        let Some(entrance) = self.entrance else {
            return;
        };
        if !ctx.movement.has_reached_destination() {
            return;
        }

        let Some(vent) = ctx.world.vents.vent(entrance.vent_id) else {
            self.finished = true;
            return;
        };
        let exits: Vec<usize> = (0..vent.entrances.len())
            .filter(|&i| i != entrance.index)
            .collect();
        let exit = if exits.is_empty() {
            entrance.index
        } else {
            exits[ctx.rng.gen_range(0..exits.len())]
        };

        let destination = vent.entrances[exit];
        if ctx.movement.warp(destination) {
            log::info!("Crossed vent {} to entrance {}", vent.id, exit);
        }
        self.finished = true;
    }

    fn exit(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.last_exit = Some(ctx.time);
        self.entrance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::test_support::Fixture;
    use crate::world::Vent;
    use mimic_math::Vec3;

    const MAP: &[&str] = &["....#....", "....#...."];

    #[test]
    fn test_picks_nearest_reachable_entrance() {
        let mut fx = Fixture::new(MAP, Vec3::new(0.5, 0.0, 0.5));
        fx.world.vents.register(Vent {
            id: 1,
            entrances: vec![
                Vec3::new(3.5, 0.0, 0.5),
                // Behind the wall
                Vec3::new(5.5, 0.0, 0.5),
            ],
        });
        fx.world.vents.register(Vent {
            id: 2,
            entrances: vec![Vec3::new(1.5, 0.0, 1.5), Vec3::new(8.5, 0.0, 1.5)],
        });

        let mut vent = VentState::new(VentConfig::default());
        vent.enter(&mut fx.ctx(0.0));
        let chosen = vent.entrance().unwrap();
        assert_eq!(chosen.vent_id, 2);
        assert_eq!(chosen.index, 0);
        assert!(!vent.is_finished());
    }

    #[test]
    fn test_crosses_to_other_entrance() {
        let mut fx = Fixture::new(MAP, Vec3::new(0.5, 0.0, 0.5));
        fx.world.vents.register(Vent {
            id: 7,
            entrances: vec![Vec3::new(1.5, 0.0, 0.5), Vec3::new(7.5, 0.0, 1.5)],
        });

        let mut vent = VentState::new(VentConfig::default());
        vent.enter(&mut fx.ctx(0.0));
        for _ in 0..100 {
            fx.sense_and_move(0.05);
            vent.tick(&mut fx.ctx(0.05));
            if vent.is_finished() {
                break;
            }
        }
        assert!(vent.is_finished());
        assert_eq!(fx.movement.position(), Vec3::new(7.5, 0.0, 1.5));

        vent.exit(&mut fx.ctx(0.0));
        assert!(!vent.cooldown_elapsed(fx.time));
    }

    #[test]
    fn test_no_entrance_finishes_immediately() {
        let mut fx = Fixture::new(MAP, Vec3::new(0.5, 0.0, 0.5));
        let mut vent = VentState::new(VentConfig::default());
        vent.enter(&mut fx.ctx(0.0));
        assert!(vent.is_finished());
    }
}
