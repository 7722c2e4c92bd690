//! Verdict mapper: review status codes to notification text.

use serde_json::Value;

use herald_common::error::PollError;
use herald_common::types::Submission;

const STATUS_KEY: &str = "status";
const NAME_KEY: &str = "homework_name";

/// Known review verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Reviewing,
    Rejected,
}

impl Verdict {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "approved" => Some(Verdict::Approved),
            "reviewing" => Some(Verdict::Reviewing),
            "rejected" => Some(Verdict::Rejected),
            _ => None,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Verdict::Approved => {
                "The work has been reviewed: the reviewer liked everything. Hooray!"
            }
            Verdict::Reviewing => "The work has been taken for review by the reviewer.",
            Verdict::Rejected => "The work has been reviewed: the reviewer has comments.",
        }
    }
}

/// Extract status and name from a raw submission record.
///
/// A missing or null field is an [`PollError::UnknownStatus`]; a record that
/// is not a mapping has neither field.
pub fn parse_submission(record: &Value) -> Result<Submission, PollError> {
    let status = field(record, STATUS_KEY)
        .ok_or_else(|| PollError::UnknownStatus("submission has no status".to_string()))?;
    let homework_name = field(record, NAME_KEY)
        .ok_or_else(|| PollError::UnknownStatus("submission has no homework_name".to_string()))?;

    Ok(Submission {
        status,
        homework_name,
    })
}

/// Build the notification text for a submission.
pub fn verdict_message(submission: &Submission) -> Result<String, PollError> {
    let verdict = Verdict::from_code(&submission.status).ok_or_else(|| {
        PollError::UnknownStatus(format!("unrecognized status \"{}\"", submission.status))
    })?;

    Ok(format!(
        "Review status changed for \"{}\". {}",
        submission.homework_name,
        verdict.text()
    ))
}

/// Map a raw submission record straight to its notification text.
pub fn parse_status(record: &Value) -> Result<String, PollError> {
    verdict_message(&parse_submission(record)?)
}

fn field(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
