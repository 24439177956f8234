//! Symbol list parsing for multi-symbol analysis.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list, upper-casing each entry.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_uppercases() {
        assert_eq!(
            parse_symbols("gold, EURUSD ,xauusd").unwrap(),
            vec!["GOLD", "EURUSD", "XAUUSD"]
        );
    }

    #[test]
    fn single_symbol() {
        assert_eq!(parse_symbols("GOLD").unwrap(), vec!["GOLD"]);
    }

    #[test]
    fn rejects_empty_token() {
        assert_eq!(parse_symbols("GOLD,,EURUSD"), Err(UniverseError::EmptyToken));
        assert_eq!(parse_symbols(""), Err(UniverseError::EmptyToken));
    }

    #[test]
    fn rejects_duplicates_case_insensitively() {
        assert_eq!(
            parse_symbols("GOLD,gold"),
            Err(UniverseError::DuplicateSymbol("GOLD".into()))
        );
    }
}
