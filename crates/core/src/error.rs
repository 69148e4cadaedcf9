use thiserror::Error;

/// Alias for results produced by this crate's fallible operations.
pub type SimResult<T> = Result<T, SimError>;

/// The error taxonomy for the simulation core. Every fallible operation in
/// this crate returns one of these variants, so callers (and the HTTP layer
/// above) can match on the kind rather than parsing messages.
///
/// Arithmetic and routing helpers never error for well-formed data; anything
/// that *can* fail does so either at construction time (configs, placement)
/// or when a caller passes an out-of-domain argument.
#[derive(Debug, Error)]
pub enum SimError {
    /// An input value is outside the domain of the operation, e.g. a
    /// probability outside [0, 1] or an empty slice passed to `pick`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration value failed validation at construction time.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A seed value that cannot be normalized to a u32 (NaN or infinite).
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// A handler, system, or stream was registered under a name that is
    /// already taken.
    #[error("duplicate name: {0:?}")]
    DuplicateName(String),

    /// A serialized state was loaded into a target whose identity (master
    /// seed or stream origin seed) does not match the snapshot.
    #[error("state mismatch: {0}")]
    StateMismatch(String),

    /// A process-wide singleton (world or engine) was initialized twice.
    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),

    /// A process-wide singleton was used before being initialized.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),
}
