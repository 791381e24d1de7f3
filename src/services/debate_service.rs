//! Business logic behind the debate routes: creation, lookup, status and results.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        debate_store::DebateStore,
        models::{DebateAggregate, DebateEntity, DebateStatus},
    },
    dto::debate::{
        CreateDebateRequest, DebateConfigInput, DebateResponse, DebateSummary, ResultsResponse,
        UpdateStatusRequest,
    },
    error::{ErrorCode, ServiceError},
    state::{
        SharedState,
        rounds::{DebateConfig, FormatVariant, RoundType},
    },
};

/// Parse a path identifier, reporting malformed ids as missing resources.
pub(crate) fn parse_id(raw: &str, code: ErrorCode, label: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::not_found(code, format!("{label} {raw} not found")))
}

/// Load a debate or fail with `DEBATE_NOT_FOUND`.
pub(crate) async fn require_debate(
    store: &Arc<dyn DebateStore>,
    id: Uuid,
) -> Result<DebateAggregate, ServiceError> {
    store
        .find_debate(id)
        .await?
        .ok_or_else(|| debate_not_found(id))
}

pub(crate) fn debate_not_found(id: impl std::fmt::Display) -> ServiceError {
    ServiceError::not_found(ErrorCode::DebateNotFound, format!("Debate {id} not found"))
}

/// Turn submitted config fields into a [`DebateConfig`], checking each one.
pub fn build_config(input: DebateConfigInput) -> Result<DebateConfig, ServiceError> {
    input.validate()?;
    let DebateConfigInput {
        team_a_name,
        team_b_name,
        debate_topic,
        format,
        round_durations,
    } = input;

    let (Some(team_a_name), Some(team_b_name), Some(debate_topic)) =
        (team_a_name, team_b_name, debate_topic)
    else {
        return Err(ServiceError::invalid(
            ErrorCode::InvalidInput,
            "Missing required fields: teamAName, teamBName, debateTopic",
        ));
    };

    let format = match format {
        Some(raw) => raw
            .parse::<FormatVariant>()
            .map_err(|err| ServiceError::invalid(ErrorCode::InvalidFormat, err.to_string()))?,
        None => FormatVariant::default(),
    };

    let mut config = DebateConfig::new(
        team_a_name.trim(),
        team_b_name.trim(),
        debate_topic.trim(),
        format,
    );
    for (key, seconds) in round_durations.unwrap_or_default() {
        let round_type = key
            .parse::<RoundType>()
            .map_err(|err| ServiceError::invalid(ErrorCode::InvalidRoundType, err.to_string()))?;
        if !format.round_types().contains(&round_type) {
            return Err(ServiceError::invalid(
                ErrorCode::InvalidRoundType,
                format!("{round_type} is not a round of the {} format", format.as_str()),
            ));
        }
        if seconds == 0 {
            return Err(ServiceError::invalid(
                ErrorCode::InvalidInput,
                format!("duration of {round_type} must be positive"),
            ));
        }
        config.round_durations.insert(round_type, seconds);
    }
    Ok(config)
}

/// Create and persist a new debate in the `active` status.
pub async fn create_debate(
    state: &SharedState,
    request: CreateDebateRequest,
) -> Result<DebateResponse, ServiceError> {
    let config = build_config(request.into_input())?;
    let store = state.require_debate_store().await?;

    let now = OffsetDateTime::now_utc();
    let debate = store
        .create_debate(DebateEntity {
            id: Uuid::new_v4(),
            config,
            status: DebateStatus::Active,
            created_at: now,
            updated_at: now,
        })
        .await?;

    info!(
        debate_id = %debate.id,
        team_a = %debate.config.team_a_name,
        team_b = %debate.config.team_b_name,
        format = debate.config.format.as_str(),
        "debate created"
    );

    Ok(DebateAggregate {
        debate,
        recordings: Vec::new(),
        evaluations: Vec::new(),
    }
    .into())
}

/// All debates, newest first.
pub async fn list_debates(state: &SharedState) -> Result<Vec<DebateResponse>, ServiceError> {
    let store = state.require_debate_store().await?;
    let debates = store.list_debates().await?;
    Ok(debates.into_iter().map(Into::into).collect())
}

/// Debate by id with its recordings, evaluations and totals.
pub async fn get_debate(state: &SharedState, raw_id: &str) -> Result<DebateResponse, ServiceError> {
    let id = parse_id(raw_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    Ok(require_debate(&store, id).await?.into())
}

/// Set the lifecycle status. The status value is checked before the debate is looked up.
pub async fn update_status(
    state: &SharedState,
    raw_id: &str,
    request: UpdateStatusRequest,
) -> Result<DebateResponse, ServiceError> {
    let status = request
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<DebateStatus>().ok())
        .ok_or_else(|| ServiceError::invalid(ErrorCode::InvalidStatus, "Invalid status value"))?;
    let id = parse_id(raw_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;

    if !store
        .update_status(id, status, OffsetDateTime::now_utc())
        .await?
    {
        return Err(debate_not_found(id));
    }
    info!(debate_id = %id, %status, "debate status updated");

    Ok(require_debate(&store, id).await?.into())
}

/// Debate header, evaluations and per-team totals.
pub async fn get_results(state: &SharedState, raw_id: &str) -> Result<ResultsResponse, ServiceError> {
    let id = parse_id(raw_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    let DebateAggregate {
        debate,
        evaluations,
        ..
    } = require_debate(&store, id).await?;
    let totals = store.team_totals(id).await?;

    Ok(ResultsResponse {
        debate: DebateSummary {
            id: debate.id,
            config: debate.config,
            status: debate.status,
            created_at: debate.created_at,
        },
        evaluations: evaluations.into_iter().map(Into::into).collect(),
        total_score: totals.into(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::ServiceError;

    fn input() -> DebateConfigInput {
        DebateConfigInput {
            team_a_name: Some("Rojo".into()),
            team_b_name: Some("Azul".into()),
            debate_topic: Some("La IA en la educación".into()),
            ..Default::default()
        }
    }

    fn code_of(err: ServiceError) -> ErrorCode {
        match err {
            ServiceError::InvalidInput { code, .. } | ServiceError::NotFound { code, .. } => code,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_invalid_input() {
        let err = build_config(DebateConfigInput {
            debate_topic: None,
            ..input()
        })
        .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidInput);
    }

    #[test]
    fn blank_names_are_invalid_input() {
        let err = build_config(DebateConfigInput {
            team_a_name: Some("   ".into()),
            ..input()
        })
        .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidInput);
    }

    #[test]
    fn defaults_follow_format() {
        let config = build_config(DebateConfigInput {
            format: Some("retor".into()),
            ..input()
        })
        .unwrap();
        assert_eq!(config.format, FormatVariant::Retor);
        assert_eq!(config.duration_for(RoundType::Contextualizacion), 360);
    }

    #[test]
    fn duration_overrides_use_aliases() {
        let config = build_config(DebateConfigInput {
            round_durations: Some(BTreeMap::from([
                ("primerRefutador".to_owned(), 300),
                ("Conclusión".to_owned(), 120),
            ])),
            ..input()
        })
        .unwrap();
        assert_eq!(config.duration_for(RoundType::PrimerRefutador), 300);
        assert_eq!(config.duration_for(RoundType::Conclusion), 120);
        assert_eq!(config.duration_for(RoundType::Introduccion), 180);
    }

    #[test]
    fn foreign_or_unknown_round_types_are_rejected() {
        let unknown = build_config(DebateConfigInput {
            round_durations: Some(BTreeMap::from([("réplica".to_owned(), 60)])),
            ..input()
        })
        .unwrap_err();
        assert_eq!(code_of(unknown), ErrorCode::InvalidRoundType);

        let foreign = build_config(DebateConfigInput {
            round_durations: Some(BTreeMap::from([("definicion".to_owned(), 60)])),
            ..input()
        })
        .unwrap_err();
        assert_eq!(code_of(foreign), ErrorCode::InvalidRoundType);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = build_config(DebateConfigInput {
            format: Some("BP".into()),
            ..input()
        })
        .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidFormat);
    }

    #[test]
    fn malformed_ids_read_as_not_found() {
        let err = parse_id("abc", ErrorCode::DebateNotFound, "Debate").unwrap_err();
        assert_eq!(code_of(err), ErrorCode::DebateNotFound);
    }
}
