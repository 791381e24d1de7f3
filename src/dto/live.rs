//! DTO definitions for live sessions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::state_machine::{SessionAction, SessionSnapshot};

/// Live session view: the debate it belongs to plus the latest snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionResponse {
    /// Debate the session belongs to.
    pub debate_id: Uuid,
    /// Latest session state.
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

/// Map the `{action}` path segment onto a session action. Team jumps use their own route.
pub fn parse_action(name: &str) -> Option<SessionAction> {
    let action = match name.to_ascii_lowercase().as_str() {
        "start" => SessionAction::Start,
        "pause" => SessionAction::Pause,
        "resume" => SessionAction::Resume,
        "finish" => SessionAction::Finish,
        "next" => SessionAction::NextRound,
        "skip" => SessionAction::SkipToNextRound,
        "previous" => SessionAction::PreviousRound,
        _ => return None,
    };
    Some(action)
}

/// Path below `/debates/{debateId}/live` that requests `action`.
pub fn action_path(action: SessionAction) -> String {
    let name = match action {
        SessionAction::Start => "start",
        SessionAction::Pause => "pause",
        SessionAction::Resume => "resume",
        SessionAction::Finish => "finish",
        SessionAction::NextRound => "next",
        SessionAction::SkipToNextRound => "skip",
        SessionAction::PreviousRound => "previous",
        SessionAction::AdvanceToNextTurn(team) => return format!("advance/{team}"),
    };
    name.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_map_to_transitions() {
        assert_eq!(parse_action("start"), Some(SessionAction::Start));
        assert_eq!(parse_action("Skip"), Some(SessionAction::SkipToNextRound));
        assert_eq!(parse_action("previous"), Some(SessionAction::PreviousRound));
        assert_eq!(parse_action("advance"), None);
    }

    #[test]
    fn action_paths_are_accepted_by_the_router() {
        assert_eq!(action_path(SessionAction::NextRound), "next");
        assert_eq!(parse_action(&action_path(SessionAction::Finish)), Some(SessionAction::Finish));
        assert_eq!(
            action_path(SessionAction::AdvanceToNextTurn(crate::state::rounds::Team::B)),
            "advance/B"
        );
    }
}
