use serde_json::Value;
use thiserror::Error;

use crate::market_data::PriceHistory;

type JsonMap = serde_json::map::Map<String, Value>;

const CURRENCY_SYMBOL: char = '$';

#[derive(Clone, Debug, PartialEq, Error)]
pub enum QuoteDataError {
    #[error("field {0} is missing")]
    FieldUnavailable(String),
    #[error("field {0} has an unexpected format")]
    FieldFormatError(String),
    #[error("row {row}: close price {raw:?} is not a valid price")]
    PriceFormat { row: usize, raw: String },
}

impl QuoteDataError {
    pub fn new_field_format_error(field: &str) -> Self {
        QuoteDataError::FieldFormatError(field.to_owned())
    }
}

fn get_field<'a>(map: &'a JsonMap, field: &str) -> Result<&'a Value, QuoteDataError> {
    map.get(field).ok_or_else(|| QuoteDataError::FieldUnavailable(field.to_owned()))
}

fn get_object<'a>(map: &'a JsonMap, field: &str) -> Result<&'a JsonMap, QuoteDataError> {
    get_field(map, field)?.as_object()
        .ok_or_else(|| QuoteDataError::new_field_format_error(field))
}

fn get_array<'a>(map: &'a JsonMap, field: &str) -> Result<&'a Vec<Value>, QuoteDataError> {
    get_field(map, field)?.as_array()
        .ok_or_else(|| QuoteDataError::new_field_format_error(field))
}

fn get_str<'a>(map: &'a JsonMap, field: &str) -> Result<&'a str, QuoteDataError> {
    get_field(map, field)?.as_str()
        .ok_or_else(|| QuoteDataError::new_field_format_error(field))
}

/// Parses a close price such as `"$1,234.50"` into its numeric value
pub fn parse_currency(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix(CURRENCY_SYMBOL).unwrap_or(trimmed);
    let digits: String = digits.chars().filter(|c| *c != ',').collect();
    let price = digits.trim().parse::<f64>().ok()?;
    if price.is_finite() && price >= 0.0 {
        Some(price)
    } else {
        None
    }
}

fn get_close_price(row: &Value, index: usize) -> Result<f64, QuoteDataError> {
    let row_map = row.as_object()
        .ok_or_else(|| QuoteDataError::new_field_format_error("rows[] entry"))?;
    let raw = get_str(row_map, "close")?;
    parse_currency(raw).ok_or_else(|| QuoteDataError::PriceFormat { row: index, raw: raw.to_owned() })
}

/// Extracts close prices from a quote-history response.
///
/// Expects `data.tradesTable.rows[].close`. A missing or null `data` block means the
/// source does not know the symbol, and a null `tradesTable` means it has no trades in
/// the requested window.
pub fn extract_close_prices(response: &Value) -> Result<PriceHistory, QuoteDataError> {
    let response_map = response.as_object()
        .ok_or_else(|| QuoteDataError::new_field_format_error("response"))?;

    let data = match response_map.get("data") {
        None | Some(Value::Null) => return Ok(PriceHistory::InvalidTicker),
        Some(data) => data.as_object()
            .ok_or_else(|| QuoteDataError::new_field_format_error("data"))?,
    };

    let trades_table = match get_field(data, "tradesTable")? {
        Value::Null => return Ok(PriceHistory::Prices(Vec::new())),
        _ => get_object(data, "tradesTable")?,
    };

    let rows = match get_field(trades_table, "rows")? {
        Value::Null => return Ok(PriceHistory::Prices(Vec::new())),
        _ => get_array(trades_table, "rows")?,
    };

    let mut prices = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        prices.push(get_close_price(row, index)?);
    }
    Ok(PriceHistory::Prices(prices))
}
