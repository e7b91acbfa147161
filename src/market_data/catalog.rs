// =============================================================================
// Price file catalog
// =============================================================================
//
// The data directory holds one cleaned CSV per symbol, named `<SYMBOL>.csv`.

use std::path::{Path, PathBuf};

use crate::error::{ForecastError, Result};
use crate::market_data::PriceTable;

/// Path of the price file for `symbol` inside `dir`.
///
/// The ticker must consist of `A-Z`, `0-9`, `^`, `=` and `-` once
/// normalised; anything else (path separators, `..`) is rejected so the
/// lookup cannot leave `dir`.
pub fn symbol_path(dir: impl AsRef<Path>, symbol: &str) -> Result<PathBuf> {
    let symbol = checked_symbol(symbol)?;
    Ok(dir.as_ref().join(format!("{symbol}.csv")))
}

/// Upper-case and trim a user-supplied ticker. Class-share dots are written
/// with a dash in file names (`BRK.B` -> `BRK-B`).
pub fn normalise_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Normalise `symbol` and reject anything that is not a plain ticker.
pub fn checked_symbol(symbol: &str) -> Result<String> {
    let normalised = normalise_symbol(symbol);
    let valid = !normalised.is_empty()
        && normalised
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '^' | '=' | '-'));
    if !valid {
        return Err(ForecastError::invalid(
            "symbol",
            format!("'{}' is not a ticker (allowed: A-Z, 0-9, '^', '=', '-')", symbol.trim()),
        ));
    }
    Ok(normalised)
}

/// Load the price table for `symbol` from `dir`.
pub fn load_symbol(dir: impl AsRef<Path>, symbol: &str) -> Result<PriceTable> {
    PriceTable::load_csv(symbol_path(dir, symbol)?)
}

/// Every symbol with a `.csv` file in `dir`, sorted.
pub fn list_symbols(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut symbols = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            symbols.push(stem.to_string_lossy().to_uppercase());
        }
    }
    symbols.sort();
    symbols.dedup();
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["TSLA.csv", "aapl.csv", "notes.txt", "MSFT.xlsx"] {
            std::fs::write(dir.path().join(name), "Date,Close\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("raw.csv")).unwrap();

        let symbols = list_symbols(dir.path()).unwrap();
        assert_eq!(symbols, vec!["AAPL".to_string(), "TSLA".to_string()]);
    }

    #[test]
    fn symbol_path_normalises_ticker() {
        let path = symbol_path("data/cleaned", " brk.b ").unwrap();
        assert_eq!(path, PathBuf::from("data/cleaned/BRK-B.csv"));
        let path = symbol_path("data/cleaned", "^gspc").unwrap();
        assert_eq!(path, PathBuf::from("data/cleaned/^GSPC.csv"));
    }

    #[test]
    fn path_like_symbols_are_rejected() {
        for bad in ["/etc/passwd", "../secret", "a/b", "AAPL\\x", "", "  ", "MS FT"] {
            let err = symbol_path("data/cleaned", bad).unwrap_err();
            assert!(
                matches!(err, ForecastError::InvalidParameter { .. }),
                "{bad:?} was accepted"
            );
        }
    }

    #[test]
    fn load_symbol_resolves_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("MSFT.csv"),
            "Date,Close_MSFT\n2024-01-02,370.6\n2024-01-03,370.1\n",
        )
        .unwrap();

        let table = load_symbol(dir.path(), "msft").unwrap();
        assert_eq!(table.symbol, "MSFT");
        assert_eq!(table.len(), 2);

        let err = load_symbol(dir.path(), "NVDA").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_dir_is_an_error() {
        assert!(list_symbols("/no/such/price/dir").is_err());
    }
}
