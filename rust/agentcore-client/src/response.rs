use serde_json::Value;

use crate::AgentError;

/// A non-streaming agent response, classified by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentResponse {
    /// `{"completion": "..."}`
    Completion(String),
    /// `{"output": {"text": "..."}}`
    OutputText(String),
    /// A bare JSON string, or a body that is not JSON at all
    Text(String),
    /// Anything else; rendered back as compact JSON
    Other(Value),
}

impl AgentResponse {
    /// Classify a decoded JSON value.
    ///
    /// `completion` wins over `output.text`; empty strings do not count as
    /// present.
    pub fn from_value(value: Value) -> Self {
        if let Some(completion) = non_empty_str(value.get("completion")) {
            return AgentResponse::Completion(completion.to_string());
        }

        if let Some(text) = non_empty_str(value.get("output").and_then(|output| output.get("text")))
        {
            return AgentResponse::OutputText(text.to_string());
        }

        match value {
            Value::String(text) => AgentResponse::Text(text),
            other => AgentResponse::Other(other),
        }
    }

    /// Classify a raw response body.
    pub fn from_body(body: &[u8]) -> Result<Self, AgentError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Ok(Self::from_value(value)),
            Err(_) => {
                let text = String::from_utf8(body.to_vec()).map_err(|error| {
                    AgentError::StreamDecodeError(format!("Response body is not UTF-8: {}", error))
                })?;
                Ok(AgentResponse::Text(text))
            }
        }
    }

    /// Collapse the response into the single string handed to callers.
    pub fn into_text(self) -> String {
        match self {
            AgentResponse::Completion(text)
            | AgentResponse::OutputText(text)
            | AgentResponse::Text(text) => text,
            AgentResponse::Other(value) => value.to_string(),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
