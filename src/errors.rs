//! Error types with rich diagnostics using miette
//!
//! Symbol code errors carry source spans pointing at the offending
//! characters. Generation errors are classified by whether the graphic should
//! be emptied or keep its previous successful state.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// Symbol Code Errors
// ============================================================================

/// Errors that occur while parsing a symbol identification code
#[derive(Error, Diagnostic, Debug)]
pub enum SymbolCodeError {
    #[error("symbol code must be 15 characters, found {len}")]
    #[diagnostic(
        code(tacgraph::symbol_code::wrong_length),
        help("MIL-STD-2525C codes look like `GFGPGLP---****X`")
    )]
    WrongLength {
        len: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this code has {len} characters")]
        span: SourceSpan,
    },

    #[error("invalid character {found:?} in {field}")]
    #[diagnostic(code(tacgraph::symbol_code::invalid_character))]
    InvalidCharacter {
        found: char,
        field: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("not allowed in the {field} field")]
        span: SourceSpan,
    },
}

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Errors raised by a stencil catalog implementation
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("catalog unavailable while looking up {key}: {reason}")]
    #[diagnostic(code(tacgraph::catalog::unavailable))]
    Unavailable { key: String, reason: String },

    #[error("catalog entry {key} is malformed: {reason}")]
    #[diagnostic(code(tacgraph::catalog::malformed))]
    Malformed { key: String, reason: String },
}

// ============================================================================
// Generation Errors
// ============================================================================

/// Errors that abort one regeneration of a graphic
#[derive(Error, Diagnostic, Debug)]
pub enum GraphicError {
    #[error("invalid symbol code")]
    #[diagnostic(code(tacgraph::graphic::invalid_symbol_code))]
    InvalidSymbolCode(
        #[from]
        #[diagnostic_source]
        SymbolCodeError,
    ),

    #[error("stencil {key} is not cataloged")]
    #[diagnostic(code(tacgraph::graphic::not_cataloged))]
    NotCataloged { key: String },

    #[error("{stencil} needs at least {needed} anchors, got {got}")]
    #[diagnostic(code(tacgraph::graphic::insufficient_anchors))]
    InsufficientAnchors {
        stencil: String,
        needed: usize,
        got: usize,
    },

    #[error("stencil catalog failed")]
    #[diagnostic(code(tacgraph::graphic::catalog))]
    Catalog(
        #[from]
        #[diagnostic_source]
        CatalogError,
    ),

    #[error("non-finite geometry while computing {stage}")]
    #[diagnostic(
        code(tacgraph::graphic::non_finite),
        help("coincident or invalid anchors produce degenerate transforms")
    )]
    NonFinite { stage: &'static str },
}

impl GraphicError {
    /// Collaborator failures and numeric blowups leave the last good graphic
    /// in place; bad input empties it.
    pub fn keeps_previous_state(&self) -> bool {
        matches!(self, GraphicError::Catalog(_) | GraphicError::NonFinite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors_for_state_policy() {
        let catalog = GraphicError::from(CatalogError::Unavailable {
            key: "G*G*GLP".into(),
            reason: "offline".into(),
        });
        assert!(catalog.keeps_previous_state());
        assert!(GraphicError::NonFinite { stage: "fit" }.keeps_previous_state());
        assert!(
            !GraphicError::NotCataloged {
                key: "G*G*XXX".into()
            }
            .keeps_previous_state()
        );
        assert!(
            !GraphicError::InsufficientAnchors {
                stencil: "PhaseLine".into(),
                needed: 2,
                got: 1,
            }
            .keeps_previous_state()
        );
    }

    #[test]
    fn messages_name_the_stencil() {
        let err = GraphicError::InsufficientAnchors {
            stencil: "Contain".into(),
            needed: 3,
            got: 1,
        };
        assert_eq!(err.to_string(), "Contain needs at least 3 anchors, got 1");
    }
}
