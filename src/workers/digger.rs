use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;

use super::grid::{DiggerRequester, StrategyGrid};
use super::state::{JobEffect, JobEvent, JobState, transition};
use crate::constants::DIG_ACTION_DURATION;
use crate::logistics::{RequestId, SimulationRng};
use crate::messages::{DeliveryOutcome, DeliveryReport};
use crate::tile_pos::{Locatable, TilePosExt};
use crate::units::Capability;

/// The digger request a unit is working on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct DiggerJob {
    pub request: RequestId,
    pub site: Entity,
}

/// Levels the footprint of a construction site, one tile at a time.
///
/// Several diggers can work the same site; each claims the tile it walks to so
/// that no two of them dig the same spot.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DiggerStrategy {
    unit: Entity,
    position: TilePos,
    state: JobState,
    job: Option<DiggerJob>,
    claimed: Option<TilePos>,
}

impl DiggerStrategy {
    pub fn new(unit: Entity, position: TilePos) -> Self {
        Self {
            unit,
            position,
            state: JobState::Jobless,
            job: None,
            claimed: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn job(&self) -> Option<DiggerJob> {
        self.job
    }

    pub fn position(&self) -> TilePos {
        self.position
    }

    pub fn claimed(&self) -> Option<TilePos> {
        self.claimed
    }

    /// Registers the unit as idle, as done once when it enters the world
    pub fn announce(&self, grid: &mut dyn StrategyGrid) {
        grid.report_jobless(self.unit, Capability::Digger, self.position);
    }

    pub fn moved_to(&mut self, position: TilePos) {
        self.position = position;
    }

    /// Accepts a job; rejected unless the unit is idle
    pub fn set_job(&mut self, job: DiggerJob) -> bool {
        match transition(self.state, JobEvent::JobOffered) {
            Some(step) => {
                self.state = step.next;
                self.job = Some(job);
                true
            }
            None => false,
        }
    }

    /// Advances the unit while it stands still (not walking)
    pub fn tick(
        &mut self,
        grid: &mut dyn StrategyGrid,
        requester: &mut dyn DiggerRequester,
        rng: &mut SimulationRng,
    ) -> Option<DeliveryReport> {
        match self.state {
            JobState::Jobless | JobState::Dead => None,
            JobState::InitJob => self.go_to_diggable_position(grid, requester, rng),
            JobState::PlayingAction => {
                self.fire(JobEvent::ActionCompleted, None, grid, Some(&mut *requester));
                if !requester.is_digger_request_active() {
                    return self.fire(JobEvent::JobEnded, None, grid, Some(requester));
                }
                self.work_or_move_on(grid, requester, rng)
            }
            JobState::GoingToPos => self.work_or_move_on(grid, requester, rng),
        }
    }

    /// The site no longer needs diggers, for example because it was cancelled
    pub fn job_ended(&mut self, grid: &mut dyn StrategyGrid) -> Option<DeliveryReport> {
        self.fire(JobEvent::JobEnded, None, grid, None)
    }

    pub fn path_aborted(
        &mut self,
        grid: &mut dyn StrategyGrid,
        requester: Option<&mut dyn DiggerRequester>,
    ) -> Option<DeliveryReport> {
        self.fire(JobEvent::PathAborted, None, grid, requester)
    }

    pub fn killed(
        &mut self,
        grid: &mut dyn StrategyGrid,
        requester: Option<&mut dyn DiggerRequester>,
    ) -> Option<DeliveryReport> {
        self.fire(JobEvent::Killed, None, grid, requester)
    }

    fn work_or_move_on(
        &mut self,
        grid: &mut dyn StrategyGrid,
        requester: &mut dyn DiggerRequester,
        rng: &mut SimulationRng,
    ) -> Option<DeliveryReport> {
        if needs_work(self.position, grid, requester) {
            self.fire(JobEvent::ArrivedAtWork, None, grid, Some(requester))
        } else {
            self.go_to_diggable_position(grid, requester, rng)
        }
    }

    fn go_to_diggable_position(
        &mut self,
        grid: &mut dyn StrategyGrid,
        requester: &mut dyn DiggerRequester,
        rng: &mut SimulationRng,
    ) -> Option<DeliveryReport> {
        // Our own mark must not hide the current tile from the search
        if let Some(previous) = self.claimed.take() {
            grid.set_marked(previous, false);
        }

        match diggable_position(grid, requester, rng) {
            Some(target) if grid.go_to(self.unit, target) => {
                self.fire(JobEvent::TargetClaimed, Some(target), grid, Some(requester))
            }
            _ => self.fire(JobEvent::NoTarget, None, grid, Some(requester)),
        }
    }

    fn fire(
        &mut self,
        event: JobEvent,
        target: Option<TilePos>,
        grid: &mut dyn StrategyGrid,
        mut requester: Option<&mut dyn DiggerRequester>,
    ) -> Option<DeliveryReport> {
        let step = transition(self.state, event)?;
        let job = self.job;
        let mut outcome = None;

        for effect in step.effects {
            match effect {
                JobEffect::ClaimTarget => {
                    if let Some(target) = target {
                        grid.set_marked(target, true);
                        self.claimed = Some(target);
                    }
                }
                JobEffect::ReleaseClaim => {
                    if let Some(claimed) = self.claimed.take() {
                        grid.set_marked(claimed, false);
                    }
                }
                JobEffect::StartAction => grid.play_action(self.unit, DIG_ACTION_DURATION),
                JobEffect::ApplyWork => {
                    if let Some(requester) = requester.as_deref_mut() {
                        grid.change_height_towards(self.position, requester.target_height());
                    }
                }
                JobEffect::ReportFailure => {
                    if let Some(requester) = requester.as_deref_mut() {
                        requester.digger_request_failed();
                    }
                    outcome = Some(DeliveryOutcome::Failed);
                }
                JobEffect::ReportJobless => {
                    self.job = None;
                    grid.report_jobless(self.unit, Capability::Digger, self.position);
                    if outcome.is_none() {
                        outcome = Some(DeliveryOutcome::Delivered(1));
                    }
                }
                JobEffect::WithdrawJobless => grid.withdraw_jobless(self.unit),
            }
        }

        self.state = step.next;
        if self.state == JobState::Dead {
            self.job = None;
        }
        debug!("Digger {:?}: {:?} -> {:?}", self.unit, event, self.state);

        let job = job?;
        outcome.map(|outcome| DeliveryReport {
            request: job.request,
            outcome,
        })
    }
}

fn needs_work(pos: TilePos, grid: &dyn StrategyGrid, requester: &dyn DiggerRequester) -> bool {
    grid.height_at(pos) != requester.target_height() || !grid.is_flattened(pos)
}

/// First unclaimed footprint tile that still needs work, scanning from a
/// random offset so that diggers spread over the site.
fn diggable_position(
    grid: &dyn StrategyGrid,
    requester: &dyn DiggerRequester,
    rng: &mut SimulationRng,
) -> Option<TilePos> {
    let footprint = requester.building_type().protected_tiles();
    let origin = requester.position();
    let offset = rng.index(footprint.len());

    (0..footprint.len())
        .filter_map(|i| origin.offset_by(footprint[(i + offset) % footprint.len()]))
        .find(|pos| !grid.is_marked(*pos) && needs_work(*pos, grid, requester))
}
