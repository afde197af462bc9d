//! Stack existence and change set states

use crate::api::{ChangeSetDescription, StackSummary};
use chrono::{DateTime, Utc};

/// Prefix of the status reason reported for a change set with nothing to apply.
const NO_CHANGES_REASON: &str = "The submitted information didn't contain changes.";

/// Whether the project's stack exists remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackPresence {
    Absent,
    Present { stack_id: String },
}

impl From<Option<StackSummary>> for StackPresence {
    fn from(summary: Option<StackSummary>) -> Self {
        match summary {
            Some(summary) => Self::Present {
                stack_id: summary.stack_id,
            },
            None => Self::Absent,
        }
    }
}

/// What a described change set tells the deployer to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetOutcome {
    /// Still being computed
    Pending,
    /// Nothing differs from the deployed stack
    NoChanges,
    /// Ready to execute
    HasChanges,
    DeleteFailed(String),
    Failed(String),
}

impl From<&ChangeSetDescription> for ChangeSetOutcome {
    fn from(description: &ChangeSetDescription) -> Self {
        let reason = description.status_reason.clone().unwrap_or_default();
        match description.status.as_str() {
            "DELETE_FAILED" => Self::DeleteFailed(reason),
            _ if is_no_changes_reason(&reason) => Self::NoChanges,
            "CREATE_PENDING" | "CREATE_IN_PROGRESS" => Self::Pending,
            "FAILED" => Self::Failed(reason),
            _ => Self::HasChanges,
        }
    }
}

/// The single place the remote "no changes" reason text is matched.
pub fn is_no_changes_reason(reason: &str) -> bool {
    reason.starts_with(NO_CHANGES_REASON)
}

/// `Update<YYYY-MM-DD-HH-MM-SS>`
pub fn change_set_name(now: DateTime<Utc>) -> String {
    format!("Update{}", now.format("%Y-%m-%d-%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn described(status: &str, reason: Option<&str>) -> ChangeSetOutcome {
        ChangeSetOutcome::from(&ChangeSetDescription {
            status: status.to_string(),
            status_reason: reason.map(String::from),
        })
    }

    #[test]
    fn test_presence_from_summary() {
        assert_eq!(StackPresence::from(None), StackPresence::Absent);
        assert_eq!(
            StackPresence::from(Some(StackSummary {
                stack_id: "arn:stack/demo".to_string(),
                status: "CREATE_COMPLETE".to_string(),
            })),
            StackPresence::Present {
                stack_id: "arn:stack/demo".to_string()
            }
        );
    }

    #[test]
    fn test_no_changes_reason() {
        assert!(is_no_changes_reason(
            "The submitted information didn't contain changes. Submit different information to create a change set."
        ));
        assert!(!is_no_changes_reason("Template format error"));
        assert!(!is_no_changes_reason(""));
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(described("CREATE_PENDING", None), ChangeSetOutcome::Pending);
        assert_eq!(described("CREATE_IN_PROGRESS", None), ChangeSetOutcome::Pending);
        assert_eq!(described("CREATE_COMPLETE", None), ChangeSetOutcome::HasChanges);
        assert_eq!(
            described(
                "FAILED",
                Some("The submitted information didn't contain changes. Submit different information.")
            ),
            ChangeSetOutcome::NoChanges
        );
        assert_eq!(
            described("FAILED", Some("boom")),
            ChangeSetOutcome::Failed("boom".to_string())
        );
        assert_eq!(
            described("DELETE_FAILED", Some("role in use")),
            ChangeSetOutcome::DeleteFailed("role in use".to_string())
        );
    }

    #[test]
    fn test_change_set_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(change_set_name(now), "Update2024-03-09-07-05-01");
    }
}
