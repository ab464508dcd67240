//! Build-time errors. Data mismatches at parse time are not errors in this
//! sense; they are returned as `runtime::ParseFailure` values.
use thiserror::Error;

use crate::oracle::Location;

/// Failure to turn a type reference into a model. Always fatal for the build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelGenerationError {
    /// E-MODEL-001
    #[error("{location}: unsupported syntax: {what}")]
    UnsupportedSyntax { what: String, location: Location },

    /// E-MODEL-002
    #[error("{location}: cannot resolve `{name}`")]
    UnresolvedSymbol { name: String, location: Location },

    /// E-MODEL-003
    #[error("{location}: type parameter `{name}` is not bound")]
    UnboundTypeParameter { name: String, location: Location },

    /// E-MODEL-004
    #[error("{location}: missing type argument for `{parameter}` of `{name}`")]
    MissingTypeArgument { name: String, parameter: String, location: Location },

    /// E-MODEL-005
    #[error("{location}: references to class types are not supported (`{name}`)")]
    ClassReference { name: String, location: Location },

    /// E-MODEL-006
    #[error("{location}: `{name}` has neither value nor type information")]
    MissingTypeInformation { name: String, location: Location },

    /// E-MODEL-007
    #[error("{location}: the type checker could not evaluate {what}")]
    UnresolvedType { what: String, location: Location },

    /// E-MODEL-008
    #[error("{location}: type nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded { limit: usize, location: Location },

    /// E-MODEL-009: a reserved slot was never filled; indicates a builder bug.
    #[error("`{name}` was reserved but never built")]
    IncompleteDependency { name: String },
}

impl ModelGenerationError {
    pub fn unsupported(what: impl Into<String>, location: &Location) -> Self {
        ModelGenerationError::UnsupportedSyntax { what: what.into(), location: location.clone() }
    }

    /// Where the offending construct lives, if the error has a location.
    pub fn location(&self) -> Option<&Location> {
        match self {
            ModelGenerationError::UnsupportedSyntax { location, .. }
            | ModelGenerationError::UnresolvedSymbol { location, .. }
            | ModelGenerationError::UnboundTypeParameter { location, .. }
            | ModelGenerationError::MissingTypeArgument { location, .. }
            | ModelGenerationError::ClassReference { location, .. }
            | ModelGenerationError::MissingTypeInformation { location, .. }
            | ModelGenerationError::UnresolvedType { location, .. }
            | ModelGenerationError::DepthLimitExceeded { location, .. } => Some(location),
            ModelGenerationError::IncompleteDependency { .. } => None,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            ModelGenerationError::UnsupportedSyntax { .. } => "E-MODEL-001",
            ModelGenerationError::UnresolvedSymbol { .. } => "E-MODEL-002",
            ModelGenerationError::UnboundTypeParameter { .. } => "E-MODEL-003",
            ModelGenerationError::MissingTypeArgument { .. } => "E-MODEL-004",
            ModelGenerationError::ClassReference { .. } => "E-MODEL-005",
            ModelGenerationError::MissingTypeInformation { .. } => "E-MODEL-006",
            ModelGenerationError::UnresolvedType { .. } => "E-MODEL-007",
            ModelGenerationError::DepthLimitExceeded { .. } => "E-MODEL-008",
            ModelGenerationError::IncompleteDependency { .. } => "E-MODEL-009",
        }
    }
}

/// Failure to lower a model into validators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("reference to `{name}` has no entry in the dependency map")]
    MissingDependency { name: String },

    #[error("template literal cannot interpolate {kind}")]
    UnsupportedTemplateFragment { kind: String },

    #[error("template literal compiled to an invalid pattern `{pattern}`: {message}")]
    InvalidTemplatePattern { pattern: String, message: String },

    #[error("index signature keys must be string, number or a template literal, not {key}")]
    UnsupportedIndexKey { key: String },

    #[error("no root or dependency named `{name}`")]
    UnknownRoot { name: String },

    /// `type A = A | string`: validating `A` would call itself on the same input.
    #[error("`{cycle}` refers back to itself without reaching a member or element")]
    UnproductiveCycle { cycle: String },
}
