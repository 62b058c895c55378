/// Convenience result type used across reelwright.
pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy for a production run.
///
/// Section-local variants are caught by the pipeline and turn into "skip this section";
/// only [`ReelError::AssemblyEmpty`] and [`ReelError::CompilerFailure`] end a run.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Section absent, empty, or below the minimum length.
    #[error("content missing: {0}")]
    ContentMissing(String),

    /// Narrator produced no audio artifact.
    #[error("synthesis failure: {0}")]
    SynthesisFailure(String),

    /// Optional asset (image, track, theme) could not be used.
    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Composer or frame renderer failed for one section.
    #[error("render failure: {0}")]
    RenderFailure(String),

    /// Zero scenes survived to assembly.
    #[error("assembly empty: {0}")]
    AssemblyEmpty(String),

    /// The media compiler failed to encode the output.
    #[error("compiler failure: {0}")]
    CompilerFailure(String),

    /// Invalid configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::ContentMissing`] value.
    pub fn content_missing(msg: impl Into<String>) -> Self {
        Self::ContentMissing(msg.into())
    }

    /// Build a [`ReelError::SynthesisFailure`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::SynthesisFailure(msg.into())
    }

    /// Build a [`ReelError::AssetUnavailable`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::AssetUnavailable(msg.into())
    }

    /// Build a [`ReelError::RenderFailure`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderFailure(msg.into())
    }

    /// Build a [`ReelError::AssemblyEmpty`] value.
    pub fn assembly_empty(msg: impl Into<String>) -> Self {
        Self::AssemblyEmpty(msg.into())
    }

    /// Build a [`ReelError::CompilerFailure`] value.
    pub fn compiler(msg: impl Into<String>) -> Self {
        Self::CompilerFailure(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` when the error only invalidates the section that raised it.
    pub fn is_section_local(&self) -> bool {
        matches!(
            self,
            Self::ContentMissing(_)
                | Self::SynthesisFailure(_)
                | Self::AssetUnavailable(_)
                | Self::RenderFailure(_)
        )
    }

    /// Short machine-readable label, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentMissing(_) => "content_missing",
            Self::SynthesisFailure(_) => "synthesis_failure",
            Self::AssetUnavailable(_) => "asset_unavailable",
            Self::RenderFailure(_) => "render_failure",
            Self::AssemblyEmpty(_) => "assembly_empty",
            Self::CompilerFailure(_) => "compiler_failure",
            Self::Validation(_) => "validation",
            Self::Serde(_) => "serde",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
