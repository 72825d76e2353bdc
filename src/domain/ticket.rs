use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Session-local marker; the backend never sees or sends it.
    #[serde(skip)]
    pub is_rewritten: bool,
}

impl Ticket {
    pub fn description_or_placeholder(&self) -> &str {
        self.description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or("No description")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenTicket {
    pub key: String,
    pub original_title: String,
    pub rewritten_title: String,
    pub rewritten_description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOutcome {
    pub success: bool,
    #[serde(default)]
    pub failed_tickets: Vec<FailedTicket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailedTicket {
    pub key: String,
}

impl UpdateOutcome {
    pub fn failed_keys(&self) -> Vec<String> {
        self.failed_tickets
            .iter()
            .map(|ticket| ticket.key.clone())
            .collect()
    }
}
