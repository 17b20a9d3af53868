use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reply shown to the end user in place of an answer when an invocation fails.
pub const FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

const RECENT_COMMENT_LIMIT: usize = 3;

/// A comment on a ticket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    /// Display name of whoever wrote the comment
    pub author: String,
    /// Comment text
    pub body: String,
}

impl Comment {
    /// Create a new comment.
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
        }
    }
}

/// Support ticket fields used to ground a query.
///
/// Every field is optional; empty strings count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketContext {
    pub id: Option<u64>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Oldest first
    pub comments: Vec<Comment>,
}

impl TicketContext {
    /// Render the ticket lines that precede the user's query.
    fn context_lines(&self) -> Vec<String> {
        let fields = [
            ("Ticket Subject", &self.subject),
            ("Ticket Description", &self.description),
            ("Customer Name", &self.requester_name),
            ("Ticket Status", &self.status),
            ("Priority", &self.priority),
        ];

        let mut lines: Vec<String> = fields
            .into_iter()
            .filter_map(|(label, value)| match value.as_deref() {
                Some(value) if !value.is_empty() => Some(format!("{}: {}", label, value)),
                _ => None,
            })
            .collect();

        if !self.comments.is_empty() {
            let skip = self.comments.len().saturating_sub(RECENT_COMMENT_LIMIT);
            let recent: Vec<String> = self.comments[skip..]
                .iter()
                .map(|comment| format!("- {}: {}", comment.author, comment.body))
                .collect();
            lines.push(format!("Recent Comments:\n{}", recent.join("\n")));
        }

        lines
    }
}

/// Combine the user's input with ticket context into a single prompt.
///
/// Without context, or with a context that has nothing to say, the input is
/// returned unchanged.
pub fn build_prompt(user_input: &str, context: Option<&TicketContext>) -> String {
    let lines = context.map(TicketContext::context_lines).unwrap_or_default();

    if lines.is_empty() {
        return user_input.to_string();
    }

    format!(
        "[Zendesk Ticket Context]\n{}\n\n[User Query]\n{}",
        lines.join("\n"),
        user_input
    )
}

/// Canned queries offered alongside the free-form input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Summarize,
    Suggest,
    Analyze,
}

impl QuickAction {
    /// Every available action.
    pub const ALL: [QuickAction; 3] = [
        QuickAction::Summarize,
        QuickAction::Suggest,
        QuickAction::Analyze,
    ];

    /// Query text sent for this action.
    pub fn prompt(&self) -> &'static str {
        match self {
            QuickAction::Summarize => {
                "Please summarize this ticket concisely, highlighting the main issue and any important details."
            }
            QuickAction::Suggest => {
                "Please suggest a professional and helpful response to this customer ticket."
            }
            QuickAction::Analyze => {
                "Please analyze the sentiment of this ticket and provide insights about the customer's emotional state and urgency level."
            }
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            QuickAction::Summarize => "summarize",
            QuickAction::Suggest => "suggest",
            QuickAction::Analyze => "analyze",
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuickAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QuickAction::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| format!("Unknown quick action: {}", value))
    }
}
