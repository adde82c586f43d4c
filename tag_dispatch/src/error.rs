//! Error types for hierarchies, multimethod dispatch and capability lookup.
//!
//! Every fallible operation in the crate returns [`DispatchResult`]. Errors are
//! never retried automatically; the only internally recovered condition is the
//! single stale-hierarchy retry inside [`MultiFn`](crate::multifn::MultiFn).

use thiserror::Error;

use crate::tag::Tag;

/// Crate-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `derive(tag, tag)`.
    #[error("Cannot derive {tag} from itself")]
    SelfDerivation { tag: Tag },

    /// The requested edge would make `tag` its own ancestor.
    #[error("Cyclic derivation: {parent} has {tag} as ancestor")]
    CyclicDerivation { tag: Tag, parent: Tag },

    /// `parent` is already an indirect ancestor of `tag`.
    #[error("{tag} already has {parent} as ancestor")]
    RedundantDerivation { tag: Tag, parent: Tag },

    /// Two matching methods where neither dominates the other.
    #[error(
        "Multiple methods in multimethod '{name}' match dispatch value: {value} -> {first} and {second}, and neither is preferred"
    )]
    AmbiguousDispatch {
        name: String,
        value: Tag,
        first: Tag,
        second: Tag,
    },

    /// Nothing matched and no method is installed under the default dispatch value.
    #[error("No method in multimethod '{name}' for dispatch value: {value}")]
    NoMatchingMethod { name: String, value: Tag },

    /// `prefer_method(preferred, other)` when `other` is already preferred to `preferred`.
    #[error("Preference conflict in multimethod '{name}': {other} is already preferred to {preferred}")]
    ConflictingPreference {
        name: String,
        preferred: Tag,
        other: Tag,
    },

    /// A capability table has no entry for the value's type and no wildcard.
    #[error("No protocol method {protocol} defined for type {type_name}: {value}")]
    MissingImplementation {
        protocol: String,
        type_name: String,
        value: String,
    },

    /// An atom validator rejected a new state.
    #[error("Invalid reference state")]
    InvalidReferenceState,

    /// A host value that has no tag representation was used as a dispatch value.
    #[error("Cannot use {0} as a dispatch value")]
    NotATag(String),

    /// Wrong number of arguments passed to a callable.
    #[error("Wrong number of args ({got}) passed to: {name}")]
    Arity { name: String, got: usize },

    /// Malformed tag literal.
    #[error("Invalid tag literal {input:?}: {reason}")]
    TagSyntax { input: String, reason: String },

    /// Malformed hierarchy configuration.
    #[error("Invalid hierarchy config: {0}")]
    Config(String),

    /// Error raised by a user-supplied method body.
    #[error("{0}")]
    Custom(String),
}

impl DispatchError {
    /// Create a custom error from a user method body.
    pub fn custom(msg: impl Into<String>) -> Self {
        DispatchError::Custom(msg.into())
    }

    /// True for the hierarchy-shape rejections raised by `derive`.
    pub fn is_derivation_error(&self) -> bool {
        matches!(
            self,
            DispatchError::SelfDerivation { .. }
                | DispatchError::CyclicDerivation { .. }
                | DispatchError::RedundantDerivation { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type DispatchResult<T> = Result<T, DispatchError>;
