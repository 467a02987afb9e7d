use parley_core::DebateState;

use crate::error::DbError;

/// Row shape of the `debates` table.
///
/// The whole `DebateState` lives in the JSON `state` column; id, status
/// and timestamps are mirrored into columns for listing and indexing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DebateRow {
    pub id: String,
    pub status: String,
    pub state: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DebateRow {
    pub fn into_domain(self) -> Result<DebateState, DbError> {
        Ok(serde_json::from_str(&self.state)?)
    }
}

impl TryFrom<&DebateState> for DebateRow {
    type Error = DbError;

    fn try_from(state: &DebateState) -> Result<Self, DbError> {
        Ok(Self {
            id: state.id.to_string(),
            status: state.status.as_str().to_string(),
            state: serde_json::to_string(state)?,
            created_at: state.created_at.timestamp(),
            updated_at: state.updated_at.timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::DebateStatus;

    #[test]
    fn test_row_round_trip() {
        let state = DebateState::new("cache or recompute?", Some("latency budget 5ms".into()));
        let row = DebateRow::try_from(&state).unwrap();
        assert_eq!(row.id, state.id.to_string());
        assert_eq!(row.status, "pending");

        let back = row.into_domain().unwrap();
        assert_eq!(back.id, state.id);
        assert_eq!(back.problem, state.problem);
        assert_eq!(back.status, DebateStatus::Pending);
    }
}
