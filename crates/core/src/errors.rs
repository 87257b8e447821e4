use thiserror::Error;

/// Navigation and validation failures raised by the wizard itself.
/// These are recoverable: the wizard stays on its current step and the
/// operator can correct the input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot advance: step {step} is incomplete")]
    StepIncomplete { step: usize },

    #[error("cannot jump to step {target}: step {blocking} is incomplete")]
    JumpBlocked { target: usize, blocking: usize },

    #[error("step {step} is out of range for a {total}-step flow")]
    StepOutOfRange { step: usize, total: usize },

    #[error("submission blocked, missing required fields: {fields:?}")]
    MissingFields { fields: Vec<String> },
}

/// Failures crossing the backend boundary, classified by where the
/// exchange broke down.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// Top-level error for a wizard session, carrying either a local
/// wizard failure or a backend failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Short operator-facing message, safe to show inline next to the
    /// step rather than as a dead end.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::Wizard(WizardError::MissingFields { .. }) => {
                "Some required details are missing. Review the highlighted fields and try again."
            }
            SessionError::Wizard(_) => "Complete the current step before moving on.",
            SessionError::Api(ApiError::Transport(_)) => {
                "Could not reach the hire desk service. Check the connection and try again."
            }
            SessionError::Api(ApiError::Backend { .. }) => {
                "The hire desk service rejected the request. Review the details and resubmit."
            }
            SessionError::Api(ApiError::Decode(_)) => {
                "The hire desk service returned an unexpected response."
            }
        }
    }
}
