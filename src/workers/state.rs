use bevy::prelude::*;

/// Lifecycle of a unit executing scheduler jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum JobState {
    #[default]
    Jobless,
    /// Accepted a job, has not picked a target yet
    InitJob,
    GoingToPos,
    PlayingAction,
    Dead,
}

impl JobState {
    pub fn is_working(self) -> bool {
        matches!(
            self,
            JobState::InitJob | JobState::GoingToPos | JobState::PlayingAction
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobEvent {
    JobOffered,
    TargetClaimed,
    NoTarget,
    ArrivedAtWork,
    ActionCompleted,
    /// The requester no longer needs the job done
    JobEnded,
    PathAborted,
    Killed,
}

/// Side effects of a transition, executed in order by the strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobEffect {
    ClaimTarget,
    ReleaseClaim,
    StartAction,
    ApplyWork,
    ReportJobless,
    WithdrawJobless,
    ReportFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: JobState,
    pub effects: &'static [JobEffect],
}

const fn to(next: JobState, effects: &'static [JobEffect]) -> Option<Transition> {
    Some(Transition { next, effects })
}

/// The job state table. `None` means the event is rejected in that state.
pub fn transition(state: JobState, event: JobEvent) -> Option<Transition> {
    use JobEffect::*;
    use JobEvent::*;
    use JobState::*;

    match (state, event) {
        (Jobless, JobOffered) => to(InitJob, &[]),
        (Jobless, Killed) => to(Dead, &[WithdrawJobless]),

        (InitJob | GoingToPos | PlayingAction, TargetClaimed) => {
            to(GoingToPos, &[ReleaseClaim, ClaimTarget])
        }
        (GoingToPos | PlayingAction, ArrivedAtWork) => to(PlayingAction, &[StartAction]),
        (PlayingAction, ActionCompleted) => to(GoingToPos, &[ApplyWork]),

        (InitJob | GoingToPos | PlayingAction, JobEnded | NoTarget) => {
            to(Jobless, &[ReleaseClaim, ReportJobless])
        }
        (InitJob | GoingToPos | PlayingAction, PathAborted) => {
            to(Jobless, &[ReleaseClaim, ReportFailure, ReportJobless])
        }
        (InitJob | GoingToPos | PlayingAction, Killed) => {
            to(Dead, &[ReleaseClaim, ReportFailure])
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [JobState; 5] = [
        JobState::Jobless,
        JobState::InitJob,
        JobState::GoingToPos,
        JobState::PlayingAction,
        JobState::Dead,
    ];

    const EVENTS: [JobEvent; 8] = [
        JobEvent::JobOffered,
        JobEvent::TargetClaimed,
        JobEvent::NoTarget,
        JobEvent::ArrivedAtWork,
        JobEvent::ActionCompleted,
        JobEvent::JobEnded,
        JobEvent::PathAborted,
        JobEvent::Killed,
    ];

    #[test]
    fn offers_are_only_accepted_while_jobless() {
        for state in STATES {
            let accepted = transition(state, JobEvent::JobOffered).is_some();
            assert_eq!(accepted, state == JobState::Jobless, "{state:?}");
        }
    }

    #[test]
    fn dead_units_ignore_everything() {
        for event in EVENTS {
            assert_eq!(transition(JobState::Dead, event), None, "{event:?}");
        }
    }

    #[test]
    fn every_live_state_can_die() {
        for state in STATES.into_iter().filter(|state| *state != JobState::Dead) {
            let result = transition(state, JobEvent::Killed).unwrap();
            assert_eq!(result.next, JobState::Dead);
        }
    }

    #[test]
    fn working_units_report_failure_when_killed_or_stuck() {
        for state in STATES.into_iter().filter(|state| state.is_working()) {
            for event in [JobEvent::Killed, JobEvent::PathAborted] {
                let result = transition(state, event).unwrap();
                assert_eq!(result.effects[0], JobEffect::ReleaseClaim);
                assert!(result.effects.contains(&JobEffect::ReportFailure));
            }
        }
        let jobless = transition(JobState::Jobless, JobEvent::Killed).unwrap();
        assert_eq!(jobless.effects, &[JobEffect::WithdrawJobless]);
    }

    #[test]
    fn work_loop_alternates_between_walking_and_acting() {
        let mut state = JobState::Jobless;
        for event in [
            JobEvent::JobOffered,
            JobEvent::TargetClaimed,
            JobEvent::ArrivedAtWork,
            JobEvent::ActionCompleted,
            JobEvent::TargetClaimed,
            JobEvent::ArrivedAtWork,
            JobEvent::ActionCompleted,
            JobEvent::NoTarget,
        ] {
            state = transition(state, event).unwrap().next;
        }
        assert_eq!(state, JobState::Jobless);
    }

    #[test]
    fn acting_requires_a_target() {
        assert_eq!(transition(JobState::InitJob, JobEvent::ArrivedAtWork), None);
        assert_eq!(transition(JobState::GoingToPos, JobEvent::ActionCompleted), None);
        assert_eq!(transition(JobState::Jobless, JobEvent::PathAborted), None);
    }
}
