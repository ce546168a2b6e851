//! Job lifecycle status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Enum representing the lifecycle status of a job.
///
/// Stored transitions move forward only:
/// `Queued → Executing → {Successful, Failed, Cancelled}`, with
/// `Queued → {Failed, Cancelled}` also legal for jobs that never start.
/// No transition leaves a terminal status.
///
/// `Expired` is special: it is derived at read time from a `Queued` or
/// `Executing` record whose expiration timestamp has passed, and is never
/// written to storage.
///
/// Serialized as lowercase string tags; decoding an unknown tag is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Executing,
    Successful,
    Failed,
    Cancelled,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Executing => "executing",
            JobStatus::Successful => "successful",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Expired => "expired",
        }
    }

    /// Sort position for status-ordered listings: non-terminal statuses first.
    pub fn ordinal(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Executing => 1,
            JobStatus::Successful => 2,
            JobStatus::Failed => 3,
            JobStatus::Cancelled => 4,
            JobStatus::Expired => 5,
        }
    }

    /// Whether this status admits no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Successful | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Expired
        )
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "executing" => Some(JobStatus::Executing),
            "successful" => Some(JobStatus::Successful),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            "expired" => Some(JobStatus::Expired),
            _ => None,
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::from_str_opt(s).ok_or_else(|| format!("Invalid JobStatus: {}", s))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 6] = [
        JobStatus::Queued,
        JobStatus::Executing,
        JobStatus::Successful,
        JobStatus::Failed,
        JobStatus::Cancelled,
        JobStatus::Expired,
    ];

    #[test]
    fn test_tag_round_trip() {
        for status in ALL {
            assert_eq!(JobStatus::from_str_opt(status.as_str()), Some(status));
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert_eq!(JobStatus::from_str_opt("running"), None);
        assert!("RUNNING".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&JobStatus::Successful).unwrap();
        assert_eq!(json, "\"successful\"");
        let decoded: JobStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(decoded, JobStatus::Cancelled);
    }

    #[test]
    fn test_serde_rejects_unknown_tag() {
        let result = serde_json::from_str::<JobStatus>("\"paused\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_terminal_sorts_first() {
        assert!(JobStatus::Queued.ordinal() < JobStatus::Executing.ordinal());
        for status in ALL {
            if status.is_terminal() {
                assert!(status.ordinal() > JobStatus::Executing.ordinal());
            }
        }
    }
}
