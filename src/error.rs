use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by the channel/transform/domain pipeline.
///
/// All failures are immediate and fatal for the current mark build; there is no retry or
/// partial-failure path.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An unrecognized sort order token (only `ascending`/`descending` are valid).
    #[error("invalid order: {token}")]
    InvalidOrder { token: String },

    /// A channel-mode sort was compiled where only a transform context is available.
    #[error("channel sort requires an initializer")]
    ChannelSortRequiresInitializer,

    /// A transform stage was layered after an initializer was already in play.
    #[error("transforms cannot be applied after initializers")]
    TransformAfterInitializer,

    /// Domain inference targeted a scale with no bound channel.
    #[error("missing channel for scale: {scale}")]
    MissingScaleChannel { scale: String },

    /// A channel lookup by name (including alias fallback) found nothing.
    #[error("missing channel: {name}")]
    MissingChannel { name: String },

    /// A value specifier named a column absent from the schema.
    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    /// A reducer name not present in the reducer registry.
    #[error("unknown reducer: {name}")]
    UnknownReducer { name: String },

    /// A reducer was paired with a payload kind it cannot consume (e.g. a numeric
    /// reducer over raw data rows).
    #[error("reducer '{reducer}' is incompatible with the '{payload}' payload")]
    ReducerPayloadMismatch { reducer: String, payload: String },
}
