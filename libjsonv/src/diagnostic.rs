//! Linter-facing diagnostics.

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::options::ParseOptions;

/// Which pipeline stage rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lex,
    Syntax,
    Reference,
}

/// A positioned message, in the shape linters report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub category: Category,
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let span = err.span();
        let category = match err {
            Error::Lex { .. } => Category::Lex,
            Error::Syntax { .. } => Category::Syntax,
            Error::Reference { .. } => Category::Reference,
        };
        Diagnostic {
            message: err.message(),
            line: span.start.line,
            column: span.start.column,
            end_line: span.end.line,
            end_column: span.end.column,
            category,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Run the whole pipeline and report every error. An empty list means
/// `text` is valid.
pub fn check(text: &str, options: &ParseOptions) -> Vec<Diagnostic> {
    match crate::parse_with_options(text, options) {
        Ok(_) => Vec::new(),
        Err(failure) => failure.errors().map(Diagnostic::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_input_has_no_diagnostics() {
        assert!(check("{ a: 1, b: a }", &ParseOptions::default()).is_empty());
    }

    #[test]
    fn test_missing_value_diagnostic() {
        let diagnostics = check("{ a: }", &ParseOptions::default());
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.category, Category::Syntax);
        assert_eq!((diagnostic.line, diagnostic.column), (1, 6));
        assert_eq!((diagnostic.end_line, diagnostic.end_column), (1, 7));
        assert_eq!(
            diagnostic.to_string(),
            "1:6: Unexpected \"}\", expected a value"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let diagnostics = check("{\n  a: missing\n}", &ParseOptions::default());
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "message": "Undefined reference \"missing\"",
                "line": 2,
                "column": 6,
                "endLine": 2,
                "endColumn": 13,
                "category": "reference"
            }])
        );
    }

    #[test]
    fn test_tolerant_reports_every_error() {
        let options = ParseOptions {
            tolerant: true,
            ..ParseOptions::default()
        };
        let diagnostics = check("[1 2, 3 4]", &options);
        let columns: Vec<usize> = diagnostics.iter().map(|d| d.column).collect();
        assert_eq!(columns, vec![4, 9]);
    }
}
