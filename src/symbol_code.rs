//! Symbol identification code parsing and stencil key derivation.

use miette::{NamedSource, SourceSpan};
use pest::Parser;
use pest::error::InputLocation;
use pest_derive::Parser;

use crate::errors::SymbolCodeError;

#[derive(Parser)]
#[grammar = "symbol_code.pest"]
struct SymbolCodeParser;

/// Number of characters in a symbol identification code
pub const CODE_LEN: usize = 15;

/// Number of leading characters that form a stencil key
const KEY_LEN: usize = 10;

/// Field names by character position, for diagnostics
const FIELDS: [&str; CODE_LEN] = [
    "coding scheme",
    "affiliation",
    "battle dimension",
    "status",
    "function id",
    "function id",
    "function id",
    "function id",
    "function id",
    "function id",
    "size/mobility modifier",
    "size/mobility modifier",
    "country code",
    "country code",
    "order of battle",
];

/// A parsed, upper-cased MIL-STD-2525C symbol code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCode {
    code: String,
    scheme: char,
    affiliation: char,
    dimension: char,
    status: char,
    function_id: String,
    modifier: String,
    country: String,
    order_of_battle: char,
}

impl SymbolCode {
    /// Parse a 15-character code. Lower case is accepted and normalized.
    pub fn parse(input: &str) -> Result<SymbolCode, SymbolCodeError> {
        let len = input.chars().count();
        if len != CODE_LEN {
            return Err(SymbolCodeError::WrongLength {
                len,
                src: NamedSource::new("symbol code", input.to_string()),
                span: (0, input.len()).into(),
            });
        }

        let code = input.to_ascii_uppercase();
        let pairs = SymbolCodeParser::parse(Rule::code, &code)
            .map_err(|e| invalid_character(input, &e.location))?;

        let mut parsed = SymbolCode {
            code: code.clone(),
            scheme: ' ',
            affiliation: ' ',
            dimension: ' ',
            status: ' ',
            function_id: String::new(),
            modifier: String::new(),
            country: String::new(),
            order_of_battle: ' ',
        };

        let first = |s: &str| s.chars().next().unwrap_or(' ');
        for pair in pairs.flatten() {
            let text = pair.as_str();
            match pair.as_rule() {
                Rule::scheme => parsed.scheme = first(text),
                Rule::affiliation => parsed.affiliation = first(text),
                Rule::dimension => parsed.dimension = first(text),
                Rule::status => parsed.status = first(text),
                Rule::function_id => parsed.function_id = text.to_string(),
                Rule::modifier => parsed.modifier = text.to_string(),
                Rule::country => parsed.country = text.to_string(),
                Rule::order_of_battle => parsed.order_of_battle = first(text),
                _ => {}
            }
        }

        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn scheme(&self) -> char {
        self.scheme
    }

    pub fn affiliation(&self) -> char {
        self.affiliation
    }

    pub fn dimension(&self) -> char {
        self.dimension
    }

    pub fn status(&self) -> char {
        self.status
    }

    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn order_of_battle(&self) -> char {
        self.order_of_battle
    }

    /// The catalog key for this code, see [`stencil_key`].
    pub fn stencil_key(&self) -> String {
        stencil_key(&self.code)
    }
}

impl std::fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Derive the catalog key from a symbol code.
///
/// The first ten characters, upper-cased. From the fifth character on the key
/// stops at the first `-`; any `-` left in the first four becomes `_`.
pub fn stencil_key(code: &str) -> String {
    let head: String = code.chars().take(KEY_LEN).collect::<String>().to_ascii_uppercase();
    let cut = head
        .char_indices()
        .skip(4)
        .find(|&(_, c)| c == '-')
        .map(|(i, _)| i)
        .unwrap_or(head.len());
    head[..cut].replace('-', "_")
}

/// Whether `c` may appear at character position `index`
fn allowed(index: usize, c: char) -> bool {
    match index {
        0 => c.is_ascii_alphabetic(),
        _ => c.is_ascii_alphanumeric() || c == '-' || c == '*',
    }
}

fn invalid_character(input: &str, location: &InputLocation) -> SymbolCodeError {
    // pest reports the start of the failing field, not the character inside it
    let (index, (pos, found)) = input
        .char_indices()
        .enumerate()
        .find(|&(index, (_, c))| !allowed(index, c))
        .unwrap_or_else(|| {
            let pos = match *location {
                InputLocation::Pos(p) => p,
                InputLocation::Span((start, _)) => start,
            };
            // Upper-casing is ASCII-only, so byte offsets line up with the input.
            let pos = pos.min(input.len().saturating_sub(1));
            let found = input[pos..].chars().next().unwrap_or(' ');
            (input[..pos].chars().count(), (pos, found))
        });
    let span: SourceSpan = (pos, found.len_utf8()).into();
    SymbolCodeError::InvalidCharacter {
        found,
        field: FIELDS.get(index).copied().unwrap_or("symbol code"),
        src: NamedSource::new("symbol code", input.to_string()),
        span,
    }
}
