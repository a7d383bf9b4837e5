use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer registry is full ({capacity} timers armed)")]
    RegistryFull { capacity: usize },
    #[error("timer {0} is not registered")]
    UnknownTimer(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("cloud task has not been set up")]
    NotStarted,
    #[error("publish to {topic} rejected: {reason}")]
    PublishRejected { topic: String, reason: String },
    #[error("payload serialization failed: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("secure element initialization failed")]
    InitFailed,
    #[error("device id generation failed, unspecified error")]
    GenerationFailed,
    #[error("device id generation failed, bad argument")]
    BadParameter,
    #[error("device id generation failed")]
    Unavailable,
}
