use serde::{Deserialize, Serialize};

/// One completed exchange, owned by the caller. The assistant receives the
/// recent turns ordered oldest to newest and never persists them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub message: String,
    pub sql_used: Option<String>,
    pub had_data: bool,
    pub summary: String,
}

impl ConversationTurn {
    pub fn conversational(message: impl Into<String>, summary: impl Into<String>) -> Self {
        Self { message: message.into(), sql_used: None, had_data: false, summary: summary.into() }
    }

    pub fn with_query(
        message: impl Into<String>,
        sql: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            sql_used: Some(sql.into()),
            had_data: true,
            summary: summary.into(),
        }
    }
}
