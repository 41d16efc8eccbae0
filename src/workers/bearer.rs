use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;

use super::grid::StrategyGrid;
use super::state::{JobEffect, JobEvent, JobState, transition};
use crate::constants::DROP_ACTION_DURATION;
use crate::logistics::{Pickup, RequestId};
use crate::messages::{DeliveryOutcome, DeliveryReport};
use crate::units::{Capability, UnitType};

/// One unit of delivery: collect at `pickup` if there is one, drop at `drop`.
/// A job with `converts_to` ends with the bearer becoming that unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct BearerJob {
    pub request: RequestId,
    pub pickup: Option<Pickup>,
    pub drop: TilePos,
    pub converts_to: Option<UnitType>,
}

impl BearerJob {
    /// A job that only needs the unit itself at `drop`
    pub fn walk_to(request: RequestId, drop: TilePos) -> Self {
        Self {
            request,
            pickup: None,
            drop,
            converts_to: None,
        }
    }
}

/// Carries a single promised unit to its requester.
///
/// Bricklayers use the same walk without a pickup leg: they report to the
/// construction site once per request. Material that was reserved for a job
/// but never delivered is put back on offer where the bearer left it.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct BearerStrategy {
    unit: Entity,
    capability: Capability,
    position: TilePos,
    state: JobState,
    job: Option<BearerJob>,
    target: Option<TilePos>,
    carrying: bool,
    delivered: bool,
}

impl BearerStrategy {
    pub fn new(unit: Entity, capability: Capability, position: TilePos) -> Self {
        Self {
            unit,
            capability,
            position,
            state: JobState::Jobless,
            job: None,
            target: None,
            carrying: false,
            delivered: false,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn job(&self) -> Option<BearerJob> {
        self.job
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying
    }

    pub fn announce(&self, grid: &mut dyn StrategyGrid) {
        grid.report_jobless(self.unit, self.capability, self.position);
    }

    pub fn moved_to(&mut self, position: TilePos) {
        self.position = position;
    }

    pub fn set_job(&mut self, job: BearerJob) -> bool {
        let Some(step) = transition(self.state, JobEvent::JobOffered) else {
            return false;
        };
        self.state = step.next;
        self.job = Some(job);
        self.carrying = job.pickup.is_none();
        self.delivered = false;
        true
    }

    pub fn tick(&mut self, grid: &mut dyn StrategyGrid) -> Option<DeliveryReport> {
        let job = self.job?;
        match self.state {
            JobState::Jobless | JobState::Dead => None,
            JobState::InitJob => {
                let first_leg = job.pickup.map_or(job.drop, |pickup| pickup.position);
                self.walk_to(first_leg, grid)
            }
            JobState::GoingToPos => self.fire(JobEvent::ArrivedAtWork, None, grid),
            JobState::PlayingAction => {
                self.fire(JobEvent::ActionCompleted, None, grid);
                if self.delivered {
                    self.fire(JobEvent::JobEnded, None, grid)
                } else {
                    self.walk_to(job.drop, grid)
                }
            }
        }
    }

    /// The request was cancelled while the unit was on its way
    pub fn job_ended(&mut self, grid: &mut dyn StrategyGrid) -> Option<DeliveryReport> {
        self.fire(JobEvent::JobEnded, None, grid)
    }

    pub fn path_aborted(&mut self, grid: &mut dyn StrategyGrid) -> Option<DeliveryReport> {
        self.fire(JobEvent::PathAborted, None, grid)
    }

    pub fn killed(&mut self, grid: &mut dyn StrategyGrid) -> Option<DeliveryReport> {
        self.fire(JobEvent::Killed, None, grid)
    }

    fn walk_to(&mut self, target: TilePos, grid: &mut dyn StrategyGrid) -> Option<DeliveryReport> {
        if grid.go_to(self.unit, target) {
            self.fire(JobEvent::TargetClaimed, Some(target), grid)
        } else {
            self.fire(JobEvent::PathAborted, None, grid)
        }
    }

    fn fire(
        &mut self,
        event: JobEvent,
        target: Option<TilePos>,
        grid: &mut dyn StrategyGrid,
    ) -> Option<DeliveryReport> {
        let step = transition(self.state, event)?;
        let job = self.job;
        let mut outcome = None;
        let ends_job = matches!(step.next, JobState::Jobless | JobState::Dead);
        if ends_job && !self.delivered {
            self.return_cargo(grid);
        }
        let converts_to = job
            .and_then(|job| job.converts_to)
            .filter(|_| self.delivered);

        for effect in step.effects {
            match effect {
                JobEffect::ClaimTarget => self.target = target,
                JobEffect::ReleaseClaim => self.target = None,
                JobEffect::StartAction => grid.play_action(self.unit, DROP_ACTION_DURATION),
                JobEffect::ApplyWork => {
                    if self.carrying {
                        self.carrying = false;
                        self.delivered = true;
                    } else {
                        self.carrying = true;
                    }
                }
                JobEffect::ReportFailure => outcome = Some(DeliveryOutcome::Failed),
                JobEffect::ReportJobless => {
                    if self.delivered {
                        outcome = Some(DeliveryOutcome::Delivered(1));
                    }
                    self.job = None;
                    self.carrying = false;
                    self.delivered = false;
                    match converts_to {
                        Some(unit_type) => grid.convert_unit(self.unit, unit_type),
                        None => grid.report_jobless(self.unit, self.capability, self.position),
                    }
                }
                JobEffect::WithdrawJobless => grid.withdraw_jobless(self.unit),
            }
        }

        self.state = step.next;
        if self.state == JobState::Dead {
            self.job = None;
        }
        debug!("Bearer {:?}: {:?} -> {:?}", self.unit, event, self.state);

        let job = job?;
        outcome.map(|outcome| DeliveryReport {
            request: job.request,
            outcome,
        })
    }

    /// Material still at the pickup goes back to its stack; material in hand
    /// is dropped where the bearer stands.
    fn return_cargo(&self, grid: &mut dyn StrategyGrid) {
        let Some(pickup) = self.job.and_then(|job| job.pickup) else {
            return;
        };
        let position = if self.carrying {
            self.position
        } else {
            pickup.position
        };
        grid.return_material(self.unit, pickup.material, position);
    }
}
