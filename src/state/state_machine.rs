//! Session lifecycle for one debate: phase, round position, turn clock and the
//! recordings captured so far. Every accepted mutation bumps the session version.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    recording::AudioRecording,
    rounds::{self, DebateConfig, DebateRound, Team},
    timer::DebateTimer,
};

/// Lifecycle phases of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebatePhase {
    /// Configured but not started; the timer holds the first round's duration.
    Setup,
    /// A turn is in progress.
    Running,
    /// Moderator paused the debate.
    Paused,
    /// Terminal phase; no further transitions are accepted.
    Finished,
}

/// Transitions that can be requested on a [`DebateSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Begin the first round.
    Start,
    /// Stop the clock and enter the paused phase.
    Pause,
    /// Leave the paused phase.
    Resume,
    /// End the debate.
    Finish,
    /// Jump to the next turn held by the given team.
    AdvanceToNextTurn(Team),
    /// Move to the following round without starting the clock.
    NextRound,
    /// Move to the following round and start the clock.
    SkipToNextRound,
    /// Move back one round with the clock stopped.
    PreviousRound,
}

/// Error returned when an action cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {action:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the action was received.
    pub from: DebatePhase,
    /// The action that cannot be applied from this phase.
    pub action: SessionAction,
}

/// Reasons a transition was rejected. A rejected transition leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The action is not legal from the current phase or position.
    #[error(transparent)]
    Illegal(#[from] InvalidTransition),
    /// No round held by the requested team lies ahead of the current one.
    #[error("no turn for team {0} lies ahead")]
    NoTurnAhead(Team),
}

/// Outcome of a single [`DebateSession::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock not running; nothing changed.
    Idle,
    /// One second elapsed.
    Ticked,
    /// The current turn ran out of time and the clock stopped.
    Expired,
    /// The last turn ran out of time and the debate finished.
    Finished,
}

/// Serializable view of a session, published to live subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Increments on every state change.
    pub version: u64,
    /// Lifecycle phase.
    pub phase: DebatePhase,
    /// 0-based position in the round sequence.
    pub current_round_index: usize,
    /// Round at that position.
    pub current_round: DebateRound,
    /// Team holding the floor.
    pub current_team: Team,
    /// Display name of that team.
    pub current_team_name: String,
    /// Seconds left in the turn.
    pub time_remaining: u32,
    /// Whether the clock counts down.
    pub is_timer_running: bool,
    /// The current round is the final one.
    pub is_last_round: bool,
    /// A following round exists.
    pub can_advance: bool,
    /// A preceding round exists.
    pub can_retreat: bool,
    /// Turns captured so far, in capture order.
    pub recordings: Vec<AudioRecording>,
}

/// Debate session state machine: round position, phase, timer and captured recordings.
#[derive(Debug, Clone)]
pub struct DebateSession {
    config: DebateConfig,
    rounds: Vec<DebateRound>,
    phase: DebatePhase,
    index: usize,
    timer: DebateTimer,
    recordings: Vec<AudioRecording>,
    version: u64,
}

impl DebateSession {
    /// Create a session in the setup phase for `config`.
    pub fn new(config: DebateConfig) -> Self {
        let rounds = rounds::generate(&config);
        let timer = DebateTimer::new(rounds.first().map_or(0, |round| round.duration));
        Self {
            config,
            rounds,
            phase: DebatePhase::Setup,
            index: 0,
            timer,
            recordings: Vec::new(),
            version: 0,
        }
    }

    /// Discard all progress and return to setup with a new config.
    pub fn reinitialize(&mut self, config: DebateConfig) {
        let version = self.version + 1;
        *self = Self::new(config);
        self.version = version;
    }

    /// Configuration the rounds were generated from.
    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Full round sequence.
    pub fn rounds(&self) -> &[DebateRound] {
        &self.rounds
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DebatePhase {
        self.phase
    }

    /// 0-based index of the current round.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Clock of the current turn.
    pub fn timer(&self) -> &DebateTimer {
        &self.timer
    }

    /// Seconds left in the current turn.
    pub fn time_remaining(&self) -> u32 {
        self.timer.time_remaining()
    }

    /// Whether ticks count the clock down.
    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Change counter; starts at 0.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Captured turns in capture order.
    pub fn recordings(&self) -> &[AudioRecording] {
        &self.recordings
    }

    /// Append a captured recording.
    pub fn add_recording(&mut self, recording: AudioRecording) {
        self.recordings.push(recording);
        self.bump();
    }

    /// Round at the current position.
    pub fn current_round(&self) -> &DebateRound {
        &self.rounds[self.index]
    }

    /// Team holding the floor.
    pub fn current_team(&self) -> Team {
        self.current_round().team
    }

    /// Display name of the team holding the floor.
    pub fn current_team_name(&self) -> &str {
        self.config.team_name(self.current_team())
    }

    /// The current round is the final one.
    pub fn is_last_round(&self) -> bool {
        self.index + 1 >= self.rounds.len()
    }

    /// A following round exists.
    pub fn can_advance(&self) -> bool {
        !self.is_last_round()
    }

    /// A preceding round exists.
    pub fn can_retreat(&self) -> bool {
        self.index > 0
    }

    /// Whether any round of `team` lies after the current one.
    pub fn has_next_turn(&self, team: Team) -> bool {
        self.next_turn_of(team).is_some()
    }

    /// Whether jumping to `team`'s next turn lands on the immediately following round,
    /// so a jump never skips the other side.
    pub fn can_navigate_to_turn(&self, team: Team) -> bool {
        self.next_turn_of(team) == Some(self.index + 1)
    }

    /// Start the first round. Legal only from setup.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.ensure(SessionAction::Start, &[DebatePhase::Setup])?;
        self.load_round(0);
        self.timer.set_running(true);
        self.phase = DebatePhase::Running;
        self.bump();
        Ok(())
    }

    /// Stop the clock. Legal only while running.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.ensure(SessionAction::Pause, &[DebatePhase::Running])?;
        self.phase = DebatePhase::Paused;
        self.timer.set_running(false);
        self.bump();
        Ok(())
    }

    /// Restart the clock after a pause.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.ensure(SessionAction::Resume, &[DebatePhase::Paused])?;
        self.phase = DebatePhase::Running;
        self.timer.set_running(true);
        self.bump();
        Ok(())
    }

    /// End the debate. Calling it again once finished is accepted and changes nothing.
    pub fn finish(&mut self) -> Result<(), TransitionError> {
        if self.phase == DebatePhase::Finished {
            return Ok(());
        }
        self.ensure(
            SessionAction::Finish,
            &[DebatePhase::Running, DebatePhase::Paused],
        )?;
        self.enter_finished();
        Ok(())
    }

    /// Jump to the next round ahead held by `team` and run its clock.
    pub fn advance_to_next_turn(&mut self, team: Team) -> Result<(), TransitionError> {
        self.ensure(
            SessionAction::AdvanceToNextTurn(team),
            &[DebatePhase::Running, DebatePhase::Paused],
        )?;
        let target = self
            .next_turn_of(team)
            .ok_or(TransitionError::NoTurnAhead(team))?;
        self.load_round(target);
        self.timer.set_running(true);
        self.phase = DebatePhase::Running;
        self.bump();
        Ok(())
    }

    /// Move to the following round with the clock stopped; finishes on the last round.
    pub fn next_round(&mut self) -> Result<(), TransitionError> {
        self.ensure(
            SessionAction::NextRound,
            &[DebatePhase::Running, DebatePhase::Paused],
        )?;
        if self.is_last_round() {
            self.enter_finished();
            return Ok(());
        }
        self.load_round(self.index + 1);
        self.timer.set_running(false);
        self.bump();
        Ok(())
    }

    /// Move to the following round and run its clock; finishes on the last round.
    pub fn skip_to_next_round(&mut self) -> Result<(), TransitionError> {
        self.ensure(
            SessionAction::SkipToNextRound,
            &[DebatePhase::Running, DebatePhase::Paused],
        )?;
        if self.is_last_round() {
            self.enter_finished();
            return Ok(());
        }
        self.load_round(self.index + 1);
        self.timer.set_running(true);
        self.phase = DebatePhase::Running;
        self.bump();
        Ok(())
    }

    /// Step back one round with the clock stopped. Fails on the first round.
    pub fn previous_round(&mut self) -> Result<(), TransitionError> {
        let action = SessionAction::PreviousRound;
        self.ensure(action, &[DebatePhase::Running, DebatePhase::Paused])?;
        if !self.can_retreat() {
            return Err(InvalidTransition {
                from: self.phase,
                action,
            }
            .into());
        }
        self.load_round(self.index - 1);
        self.timer.set_running(false);
        self.bump();
        Ok(())
    }

    /// Apply one second of elapsed time. A running clock already at zero expires at once.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != DebatePhase::Running || !self.timer.is_running() {
            return TickOutcome::Idle;
        }
        let expired = if self.timer.time_remaining() == 0 {
            self.timer.set_running(false);
            true
        } else {
            self.timer.decrement()
        };
        self.bump();
        if !expired {
            return TickOutcome::Ticked;
        }
        if self.is_last_round() {
            self.enter_finished();
            return TickOutcome::Finished;
        }
        TickOutcome::Expired
    }

    /// Apply a named action.
    pub fn apply(&mut self, action: SessionAction) -> Result<(), TransitionError> {
        match action {
            SessionAction::Start => self.start(),
            SessionAction::Pause => self.pause(),
            SessionAction::Resume => self.resume(),
            SessionAction::Finish => self.finish(),
            SessionAction::AdvanceToNextTurn(team) => self.advance_to_next_turn(team),
            SessionAction::NextRound => self.next_round(),
            SessionAction::SkipToNextRound => self.skip_to_next_round(),
            SessionAction::PreviousRound => self.previous_round(),
        }
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: self.version,
            phase: self.phase,
            current_round_index: self.index,
            current_round: self.current_round().clone(),
            current_team: self.current_team(),
            current_team_name: self.current_team_name().to_owned(),
            time_remaining: self.timer.time_remaining(),
            is_timer_running: self.timer.is_running(),
            is_last_round: self.is_last_round(),
            can_advance: self.can_advance(),
            can_retreat: self.can_retreat(),
            recordings: self.recordings.clone(),
        }
    }

    fn ensure(&self, action: SessionAction, allowed: &[DebatePhase]) -> Result<(), InvalidTransition> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.phase,
                action,
            })
        }
    }

    fn next_turn_of(&self, team: Team) -> Option<usize> {
        (self.index + 1..self.rounds.len()).find(|&i| self.rounds[i].team == team)
    }

    fn load_round(&mut self, index: usize) {
        self.index = index;
        self.timer.reset(self.rounds[index].duration);
    }

    fn enter_finished(&mut self) {
        self.phase = DebatePhase::Finished;
        self.timer.set_running(false);
        self.bump();
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::rounds::{FormatVariant, RoundType};

    fn session() -> DebateSession {
        DebateSession::new(DebateConfig::new(
            "Azul",
            "Rojo",
            "Tema",
            FormatVariant::Upct,
        ))
    }

    fn running() -> DebateSession {
        let mut session = session();
        session.start().unwrap();
        session
    }

    fn apply(session: &mut DebateSession, action: SessionAction) -> DebatePhase {
        session.apply(action).unwrap();
        session.phase()
    }

    #[test]
    fn initial_state_is_setup() {
        let session = session();
        assert_eq!(session.phase(), DebatePhase::Setup);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.time_remaining(), 180);
        assert!(!session.is_timer_running());
    }

    #[test]
    fn happy_path_through_debate() {
        let mut session = session();
        assert_eq!(apply(&mut session, SessionAction::Start), DebatePhase::Running);
        assert!(session.is_timer_running());
        assert_eq!(apply(&mut session, SessionAction::Pause), DebatePhase::Paused);
        assert!(!session.is_timer_running());
        assert_eq!(apply(&mut session, SessionAction::Resume), DebatePhase::Running);
        assert!(session.is_timer_running());
        assert_eq!(apply(&mut session, SessionAction::Finish), DebatePhase::Finished);
        assert!(!session.is_timer_running());
    }

    #[test]
    fn pause_outside_running_is_rejected_without_change() {
        let mut session = session();
        let before = session.snapshot();
        let err = session.pause().unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal(InvalidTransition {
                from: DebatePhase::Setup,
                action: SessionAction::Pause,
            })
        );
        assert_eq!(session.snapshot(), before);

        let mut session = running();
        session.finish().unwrap();
        let before = session.snapshot();
        assert!(session.pause().is_err());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn finish_is_idempotent_and_terminal() {
        let mut session = running();
        session.finish().unwrap();
        let version = session.version();
        session.finish().unwrap();
        assert_eq!(session.version(), version);
        assert!(session.resume().is_err());
        assert!(session.start().is_err());
        assert!(session.skip_to_next_round().is_err());
    }

    #[test]
    fn finish_from_setup_is_rejected() {
        let mut session = session();
        assert!(matches!(
            session.finish(),
            Err(TransitionError::Illegal(InvalidTransition {
                from: DebatePhase::Setup,
                ..
            }))
        ));
    }

    #[test]
    fn advance_jumps_to_next_turn_of_team() {
        let mut session = running();
        session.pause().unwrap();

        session.advance_to_next_turn(Team::B).unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.phase(), DebatePhase::Running);
        assert!(session.is_timer_running());

        session.advance_to_next_turn(Team::B).unwrap();
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.current_round().round_type, RoundType::PrimerRefutador);
        assert_eq!(session.time_remaining(), 240);
    }

    #[test]
    fn advance_without_turn_ahead_changes_nothing() {
        let mut session = running();
        for _ in 0..7 {
            session.next_round().unwrap();
        }
        assert!(session.is_last_round());
        let before = session.snapshot();
        assert_eq!(
            session.advance_to_next_turn(Team::B),
            Err(TransitionError::NoTurnAhead(Team::B))
        );
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn navigation_only_targets_immediate_round() {
        let mut session = running();
        assert!(session.can_navigate_to_turn(Team::B));
        assert!(!session.can_navigate_to_turn(Team::A));
        assert!(session.has_next_turn(Team::A));

        // index 5 is B; 6 is B, 7 is A
        for _ in 0..5 {
            session.next_round().unwrap();
        }
        assert_eq!(session.current_index(), 5);
        assert!(session.can_navigate_to_turn(Team::B));
        assert!(!session.can_navigate_to_turn(Team::A));

        session.next_round().unwrap();
        assert!(session.can_navigate_to_turn(Team::A));
        assert!(!session.has_next_turn(Team::B));
    }

    #[test]
    fn next_round_stops_clock_and_skip_starts_it() {
        let mut session = running();
        session.next_round().unwrap();
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_timer_running());
        assert_eq!(session.phase(), DebatePhase::Running);

        session.pause().unwrap();
        session.skip_to_next_round().unwrap();
        assert_eq!(session.current_index(), 2);
        assert!(session.is_timer_running());
        assert_eq!(session.phase(), DebatePhase::Running);
    }

    #[test]
    fn next_round_on_last_round_finishes() {
        let mut session = running();
        for _ in 0..7 {
            session.skip_to_next_round().unwrap();
        }
        session.skip_to_next_round().unwrap();
        assert_eq!(session.phase(), DebatePhase::Finished);
        assert_eq!(session.current_index(), 7);
    }

    #[test]
    fn previous_round_requires_a_round_behind() {
        let mut session = running();
        assert!(session.previous_round().is_err());

        session.skip_to_next_round().unwrap();
        session.tick();
        session.previous_round().unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.time_remaining(), 180);
        assert!(!session.is_timer_running());
    }

    #[test]
    fn ticks_count_down_and_expire() {
        let mut config = DebateConfig::new("A", "B", "t", FormatVariant::Upct);
        config.round_durations.insert(RoundType::Introduccion, 2);
        let mut session = DebateSession::new(config);

        assert_eq!(session.tick(), TickOutcome::Idle);
        session.start().unwrap();
        assert_eq!(session.tick(), TickOutcome::Ticked);
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.time_remaining(), 0);
        assert!(!session.is_timer_running());
        assert_eq!(session.phase(), DebatePhase::Running);
        assert_eq!(session.tick(), TickOutcome::Idle);
    }

    #[test]
    fn auto_finish_happens_once_on_last_round() {
        let mut config = DebateConfig::new("A", "B", "t", FormatVariant::Upct);
        config.round_durations.insert(RoundType::Conclusion, 1);
        let mut session = DebateSession::new(config);
        session.start().unwrap();
        for _ in 0..7 {
            session.skip_to_next_round().unwrap();
        }

        assert_eq!(session.tick(), TickOutcome::Finished);
        assert_eq!(session.phase(), DebatePhase::Finished);
        let version = session.version();
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.version(), version);
    }

    #[test]
    fn zero_length_turns_expire_on_first_tick() {
        let mut config = DebateConfig::new("A", "B", "t", FormatVariant::Upct);
        for round_type in FormatVariant::Upct.round_types() {
            config.round_durations.insert(round_type, 0);
        }
        let mut session = DebateSession::new(config);
        session.start().unwrap();
        assert_eq!(session.time_remaining(), 0);

        assert_eq!(session.tick(), TickOutcome::Expired);
        assert!(!session.is_timer_running());
        assert_eq!(session.phase(), DebatePhase::Running);
        let version = session.version();
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.version(), version);

        for _ in 0..7 {
            session.skip_to_next_round().unwrap();
        }
        assert!(session.is_last_round());
        assert_eq!(session.tick(), TickOutcome::Finished);
        assert_eq!(session.phase(), DebatePhase::Finished);
    }

    #[test]
    fn reinitialize_returns_to_setup() {
        let mut session = running();
        session.skip_to_next_round().unwrap();
        session.reinitialize(DebateConfig::new("X", "Y", "Z", FormatVariant::Retor));
        assert_eq!(session.phase(), DebatePhase::Setup);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.time_remaining(), 360);
        assert!(session.recordings().is_empty());
        assert_eq!(session.current_team_name(), "X");
    }

    #[test]
    fn getters_follow_position() {
        let mut session = running();
        assert_eq!(session.current_team(), Team::A);
        assert_eq!(session.current_team_name(), "Azul");
        assert!(session.can_advance());
        assert!(!session.can_retreat());
        session.next_round().unwrap();
        assert_eq!(session.current_team_name(), "Rojo");
        assert!(session.can_retreat());
    }
}
