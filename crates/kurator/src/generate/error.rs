use thiserror::Error;

/// Failure of one generation attempt sequence for one object.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The provider kept rate-limiting us until the retry budget ran out.
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// The provider stayed unreachable or kept failing server-side until
    /// the retry budget ran out.
    #[error("Service unavailable after {attempts} attempts")]
    ServiceUnavailable { attempts: u32 },

    /// This object's request could not be assembled, e.g. no usable
    /// image. Not retryable, but the run continues with the next object.
    #[error("Unusable request payload: {0}")]
    Payload(String),

    /// Non-transient provider rejection, e.g. bad credentials. Retrying
    /// other objects would fail the same way, so the run stops.
    #[error("Fatal generation error: {0}")]
    Fatal(String),
}

impl GenerationError {
    /// Whether this failure makes continuing with further objects
    /// pointless.
    pub fn aborts_run(&self) -> bool {
        matches!(self, GenerationError::Fatal(_))
    }
}
