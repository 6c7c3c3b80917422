use modload_core::{Candidate, FailedAttempt, LoadError, LoadedModule};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CandidateReport {
    pub location: &'static str,
    pub path: String,
}

impl From<&Candidate> for CandidateReport {
    fn from(candidate: &Candidate) -> Self {
        Self {
            location: candidate.location.as_str(),
            path: candidate.path.display().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttemptReport {
    pub path: String,
    pub reason: String,
}

impl From<&FailedAttempt> for AttemptReport {
    fn from(attempt: &FailedAttempt) -> Self {
        Self {
            path: attempt.path.display().to_string(),
            reason: attempt.reason.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub name: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub failed_attempts: Vec<AttemptReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<i32>,
}

impl LoadReport {
    pub fn success<H>(module: &LoadedModule<H>, result: Option<i32>) -> Self {
        Self {
            name: module.name().to_string(),
            loaded: true,
            path: Some(module.path().display().to_string()),
            entry: Some(format!("{:p}", module.entry().as_ptr())),
            error: None,
            failed_attempts: module.failed_attempts().iter().map(Into::into).collect(),
            result,
        }
    }

    pub fn failure(name: &str, error: &LoadError) -> Self {
        let failed_attempts = match error {
            LoadError::PathExhausted { attempts, .. } => attempts.iter().map(Into::into).collect(),
            _ => Vec::new(),
        };

        Self {
            name: name.to_string(),
            loaded: false,
            path: None,
            entry: None,
            error: Some(error.to_string()),
            failed_attempts,
            result: None,
        }
    }

    /// One line for the console, with `^N` colour codes for success or failure.
    pub fn summary(&self) -> String {
        match &self.path {
            Some(path) => format!("^2Loaded module \"{}\"^7 from {path}", self.name),
            None => format!(
                "^1Failed to load \"{}\":^7 {}",
                self.name,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
