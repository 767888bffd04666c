//! # Catalog Import
//!
//! Maps rows of the supplier spreadsheet export into [`IncomingProduct`]
//! records for the reconciler, and generates SKUs for manual entry.
//!
//! ## Column Layout (0-based)
//! ```text
//! ┌──────┬──────────────────────────────────────────────────────────────────┐
//! │  1   │ category (fallback)                                              │
//! │  2   │ sku                                                              │
//! │  3   │ name                  (default "Sem Nome")                       │
//! │  4   │ status                ("EM ESTOQUE" → stock 1, else 0)           │
//! │  7   │ cost                  (currency cell)                            │
//! │  8   │ price                 (currency cell)                            │
//! │  10  │ stock                 (optional numeric override of status)      │
//! │  12  │ size                                                             │
//! │  13  │ color                                                            │
//! │  14  │ category              (falls back to col 1, then "Geral")        │
//! └──────┴──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first line is a header. The delimiter is `;` or `,`, whichever
//! occurs more often outside quotes in the header. Quoted fields may contain
//! the delimiter.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::reconcile::{IncomingProduct, RowError};

const COL_CATEGORY_FALLBACK: usize = 1;
const COL_SKU: usize = 2;
const COL_NAME: usize = 3;
const COL_STATUS: usize = 4;
const COL_COST: usize = 7;
const COL_PRICE: usize = 8;
const COL_STOCK: usize = 10;
const COL_SIZE: usize = 12;
const COL_COLOR: usize = 13;
const COL_CATEGORY: usize = 14;

const MIN_COLUMNS: usize = 3;
const IN_STOCK_STATUS: &str = "EM ESTOQUE";
const DEFAULT_NAME: &str = "Sem Nome";
const DEFAULT_CATEGORY: &str = "Geral";

/// Records parsed from a file plus the rows that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCatalog {
    pub records: Vec<IncomingProduct>,
    /// Source line number of each record, parallel to `records`.
    pub lines: Vec<usize>,
    pub errors: Vec<RowError>,
}

// =============================================================================
// Tokenizing
// =============================================================================

/// Picks `;` or `,` by counting occurrences outside quotes in `header`.
pub fn detect_delimiter(header: &str) -> char {
    let mut in_quotes = false;
    let (mut semicolons, mut commas) = (0usize, 0usize);
    for c in header.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => semicolons += 1,
            ',' if !in_quotes => commas += 1,
            _ => {}
        }
    }
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Splits one line on `delimiter`, leaving delimiters inside quotes alone.
///
/// Quotes are kept in the returned cells; [`cell`] strips them.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c == delimiter && !in_quotes {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    cells.push(current);
    cells
}

/// Cell text without quotes and surrounding whitespace.
fn cell(columns: &[String], index: usize) -> String {
    columns
        .get(index)
        .map(|c| c.replace('"', "").trim().to_string())
        .unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

// =============================================================================
// Cell Parsing
// =============================================================================

/// Parses a currency cell such as `"R$ 1.234,56"` or `12.50`.
///
/// Strips `R$`, quotes and whitespace. When a comma is present, dots are
/// thousands separators and the comma is the decimal point; otherwise the
/// dot is the decimal point. Text that is not a number is zero.
///
/// ## Errors
/// A number too large to hold in cents; the row cannot be imported.
///
/// ## Example
/// ```rust
/// use moda_core::import::parse_currency;
///
/// assert_eq!(parse_currency("R$ 1.234,56").unwrap().cents(), 123_456);
/// assert_eq!(parse_currency("89.90").unwrap().cents(), 8_990);
/// assert_eq!(parse_currency("abc").unwrap().cents(), 0);
/// assert!(parse_currency("99999999999999999999").is_err());
/// ```
pub fn parse_currency(raw: &str) -> Result<Money, String> {
    let stripped: String = raw
        .replace("R$", "")
        .chars()
        .filter(|c| *c != '"' && !c.is_whitespace())
        .collect();

    let normalized = if stripped.contains(',') {
        stripped.replace('.', "").replacen(',', ".", 1)
    } else {
        stripped
    };

    match Money::parse_decimal(&normalized) {
        Ok(amount) => Ok(amount),
        Err(ValidationError::OutOfRange { .. }) => {
            Err(format!("amount '{}' is out of range", raw.trim()))
        }
        Err(_) => Ok(Money::zero()),
    }
}

/// Parses the optional stock column; blank or non-numeric means absent.
fn parse_stock(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok().map(|n| n.max(0))
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Maps the cells of one data row.
pub fn map_row(columns: &[String]) -> Result<IncomingProduct, String> {
    if columns.len() < MIN_COLUMNS {
        return Err(format!(
            "expected at least {MIN_COLUMNS} columns, found {}",
            columns.len()
        ));
    }

    let sku = cell(columns, COL_SKU);
    if sku.is_empty() {
        return Err("missing sku".to_string());
    }

    let status_stock = if cell(columns, COL_STATUS).to_uppercase() == IN_STOCK_STATUS {
        1
    } else {
        0
    };
    let stock = parse_stock(&cell(columns, COL_STOCK)).unwrap_or(status_stock);

    let category = non_empty(cell(columns, COL_CATEGORY))
        .or_else(|| non_empty(cell(columns, COL_CATEGORY_FALLBACK)))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Ok(IncomingProduct {
        sku,
        name: non_empty(cell(columns, COL_NAME)).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        category,
        size: cell(columns, COL_SIZE),
        color: cell(columns, COL_COLOR),
        price: parse_currency(&cell(columns, COL_PRICE)).map_err(|e| format!("price: {e}"))?,
        cost: parse_currency(&cell(columns, COL_COST)).map_err(|e| format!("cost: {e}"))?,
        stock,
    })
}

/// Parses a whole export: header, then one product per non-blank line.
///
/// Bad rows become [`RowError`]s with their 1-based line number; they never
/// stop the rest of the file.
pub fn parse_catalog(text: &str) -> ParsedCatalog {
    let mut parsed = ParsedCatalog::default();
    let mut lines = text.lines().enumerate();

    let Some((_, header)) = lines.next() else {
        return parsed;
    };
    let delimiter = detect_delimiter(header);

    for (index, line) in lines {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let columns = split_line(line, delimiter);
        match map_row(&columns) {
            Ok(record) => {
                parsed.records.push(record);
                parsed.lines.push(line_number);
            }
            Err(reason) => parsed.errors.push(RowError {
                row: line_number,
                sku: non_empty(cell(&columns, COL_SKU)),
                reason,
            }),
        }
    }

    parsed
}

// =============================================================================
// SKU Generation
// =============================================================================

fn first_two_upper(value: &str) -> String {
    let trimmed = value.trim();
    let source = if trimmed.is_empty() { "XX" } else { trimmed };
    source.chars().take(2).collect::<String>().to_uppercase()
}

/// Builds `BS-{CAT}-{COL}-{seq:02}-{size}` for manual catalog entry.
///
/// Category and color contribute their first two letters upper-cased
/// (`XX` when blank); size is lower-cased (`u` when blank).
///
/// ## Example
/// ```rust
/// use moda_core::import::generate_sku;
///
/// assert_eq!(generate_sku("Camisa", "Rede", "M", 1), "BS-CA-RE-01-m");
/// assert_eq!(generate_sku("", "", "", 12), "BS-XX-XX-12-u");
/// ```
pub fn generate_sku(category: &str, color: &str, size: &str, sequence: usize) -> String {
    let size = size.trim();
    let size = if size.is_empty() { "U" } else { size };
    format!(
        "BS-{}-{}-{:02}-{}",
        first_two_upper(category),
        first_two_upper(color),
        sequence,
        size.to_lowercase()
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,categoria,sku,nome,status,a,b,custo,preco,c,estoque,d,tamanho,cor,categoria2";

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("\"a;b;c\",d"), ',');
        assert_eq!(detect_delimiter(""), ',');
    }

    #[test]
    fn test_split_line_respects_quotes() {
        let cells = split_line("1,\"Camisa, manga longa\",x", ',');
        assert_eq!(cells.len(), 3);
        assert_eq!(cell(&cells, 1), "Camisa, manga longa");

        let cells = split_line("a;;c", ';');
        assert_eq!(cells, vec!["a", "", "c"]);
    }

    #[test]
    fn test_parse_currency_formats() {
        let cents = |raw: &str| parse_currency(raw).unwrap().cents();
        assert_eq!(cents("\"R$ 1.234,56\""), 123_456);
        assert_eq!(cents("R$120,00"), 12_000);
        assert_eq!(cents("120"), 12_000);
        assert_eq!(cents("89.9"), 8_990);
        assert_eq!(cents(""), 0);
        assert_eq!(cents("n/d"), 0);
    }

    #[test]
    fn test_out_of_range_price_is_a_row_error() {
        assert!(parse_currency("R$ 999.999.999.999.999.999,00").is_err());

        let text = format!(
            "{HEADER}\n1,Cat,SKU-BIG,Nome,,,,10,99999999999999999999\n1,Cat,SKU-OK,Nome,,,,10,20\n"
        );
        let parsed = parse_catalog(&text);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].sku, "SKU-OK");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].row, 2);
        assert_eq!(parsed.errors[0].sku.as_deref(), Some("SKU-BIG"));
        assert!(parsed.errors[0].reason.starts_with("price:"));
    }

    #[test]
    fn test_map_full_row() {
        let line = "1,Blusas,BS-CA-RE-01-m,Camisa Rede,Em estoque,,,\"R$ 40,00\",\"R$ 120,00\",,,,M,Rede,Camisas";
        let record = map_row(&split_line(line, ',')).unwrap();

        assert_eq!(record.sku, "BS-CA-RE-01-m");
        assert_eq!(record.name, "Camisa Rede");
        assert_eq!(record.stock, 1);
        assert_eq!(record.cost, Money::from_major(40));
        assert_eq!(record.price, Money::from_major(120));
        assert_eq!(record.size, "M");
        assert_eq!(record.color, "Rede");
        assert_eq!(record.category, "Camisas");
    }

    #[test]
    fn test_defaults_and_fallbacks() {
        let record = map_row(&split_line("1,Vestidos,SKU9,,VENDIDO", ',')).unwrap();
        assert_eq!(record.name, "Sem Nome");
        assert_eq!(record.category, "Vestidos");
        assert_eq!(record.stock, 0);
        assert_eq!(record.price, Money::zero());

        let record = map_row(&split_line("1,,SKU9", ',')).unwrap();
        assert_eq!(record.category, "Geral");
    }

    #[test]
    fn test_stock_column_overrides_status() {
        let line = "1,Cat,SKU1,Nome,EM ESTOQUE,,,10,20,,7";
        let record = map_row(&split_line(line, ',')).unwrap();
        assert_eq!(record.stock, 7);

        let line = "1,Cat,SKU1,Nome,EM ESTOQUE,,,10,20,,abc";
        let record = map_row(&split_line(line, ',')).unwrap();
        assert_eq!(record.stock, 1);
    }

    #[test]
    fn test_bad_rows_become_errors() {
        assert!(map_row(&split_line("only,two", ',')).is_err());
        assert!(map_row(&split_line("1,Cat,\"\",Nome", ',')).is_err());
    }

    #[test]
    fn test_parse_catalog_with_semicolons() {
        let text = format!(
            "{}\n1;Blusas;SKU-A;Blusa;EM ESTOQUE;;;30,00;79,90\n\n1;x\n1;Blusas;SKU-B;Saia;;;;;\n",
            HEADER.replace(',', ";")
        );
        let parsed = parse_catalog(&text);

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.lines, vec![2, 5]);
        assert_eq!(parsed.records[0].price.cents(), 7_990);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].row, 4);
    }

    #[test]
    fn test_parse_catalog_header_only() {
        assert_eq!(parse_catalog(HEADER), ParsedCatalog::default());
        assert_eq!(parse_catalog(""), ParsedCatalog::default());
    }

    #[test]
    fn test_generate_sku() {
        assert_eq!(generate_sku("Camisa", "Rede", "M", 1), "BS-CA-RE-01-m");
        assert_eq!(generate_sku("calça", "azul", "GG", 123), "BS-CA-AZ-123-gg");
        assert_eq!(generate_sku("", "", "", 3), "BS-XX-XX-03-u");
    }
}
