//! JSON and XML walks driven by [`StructuredHints`].

use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::normalize::{normalize_token, NormalizedNumber};
use crate::catalog::StructuredHints;
use crate::QuoteScale;

const USD_KEY_MARKERS: [&str; 2] = ["usd", "dollar"];

pub(crate) fn scan_json(document: &Value, hints: &StructuredHints) -> Vec<NormalizedNumber> {
    let mut found = Vec::new();

    if let Some(pointer) = hints.json_pointer.as_deref() {
        if let Some(number) = document.pointer(pointer).and_then(scalar_number) {
            found.push(number);
        }
    }

    walk_json(document, hints, &mut found);
    found
}

fn walk_json(value: &Value, hints: &StructuredHints, found: &mut Vec<NormalizedNumber>) {
    match value {
        Value::Object(object) => {
            if names_currency(object, &hints.currency) {
                for field in &hints.rate_fields {
                    let matched = object
                        .iter()
                        .find(|(key, _)| field_matches(key, field))
                        .and_then(|(_, value)| scalar_number(value));
                    if let Some(number) = matched {
                        found.push(number);
                    }
                }
            }

            for (key, child) in object {
                let lowered = key.to_lowercase();
                if USD_KEY_MARKERS.iter().any(|marker| lowered.contains(marker)) {
                    if let Some(number) = scalar_number(child) {
                        found.push(number);
                    }
                }
                walk_json(child, hints, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_json(item, hints, found);
            }
        }
        _ => {}
    }
}

fn names_currency(object: &Map<String, Value>, currency: &str) -> bool {
    object
        .values()
        .any(|value| matches!(value, Value::String(text) if text.trim().eq_ignore_ascii_case(currency)))
}

fn scalar_number(value: &Value) -> Option<NormalizedNumber> {
    match value {
        Value::Number(number) => {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .map(|value| NormalizedNumber {
                    value,
                    scale: QuoteScale::Unit,
                })
        }
        Value::String(text) => normalize_token(text),
        _ => None,
    }
}

/// Case-insensitive field comparison that ignores a leading `@`
/// (XML-to-JSON converters prefix attributes with it).
fn field_matches(key: &str, field: &str) -> bool {
    key.trim_start_matches('@')
        .eq_ignore_ascii_case(field.trim_start_matches('@'))
}

/// Result of an XML scan. A parse error stops the scan but keeps the
/// numbers read from the elements before it.
#[derive(Debug, Default)]
pub(crate) struct XmlScan {
    pub(crate) found: Vec<NormalizedNumber>,
    pub(crate) error: Option<String>,
}

/// Elements carrying an attribute equal to the currency code yield their
/// preferred rate attributes, in preference order.
pub(crate) fn scan_xml(xml: &str, hints: &StructuredHints) -> XmlScan {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut scan = XmlScan::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                scan_element(&element, hints, &mut scan.found);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                scan.error = Some(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                ));
                break;
            }
            _ => {}
        }
    }

    scan
}

fn scan_element(element: &BytesStart<'_>, hints: &StructuredHints, found: &mut Vec<NormalizedNumber>) {
    let attributes = element
        .attributes()
        .flatten()
        .filter_map(|attribute| {
            let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value().ok()?.into_owned();
            Some((name, value))
        })
        .collect::<Vec<_>>();

    let names_currency = attributes
        .iter()
        .any(|(_, value)| value.trim().eq_ignore_ascii_case(&hints.currency));
    if !names_currency {
        return;
    }

    for field in &hints.rate_fields {
        let matched = attributes
            .iter()
            .find(|(name, _)| field_matches(name, field))
            .and_then(|(_, value)| normalize_token(value));
        if let Some(number) = matched {
            found.push(number);
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn values(found: &[NormalizedNumber]) -> Vec<Decimal> {
        found.iter().map(|number| number.value).collect()
    }

    #[test]
    fn json_pointer_is_read_before_the_walk() {
        let hints = StructuredHints::default().with_json_pointer("/rates/VND");
        let document = json!({"base": "USD", "rates": {"EUR": 0.92, "VND": 24011.5}});

        let found = scan_json(&document, &hints);
        assert_eq!(found.first().map(|n| n.value), Some(dec!(24011.5)));
    }

    #[test]
    fn json_currency_record_yields_fields_in_preference_order() {
        let hints = StructuredHints::usd(&["sell", "transfer"]);
        let document = json!([
            {"currency": "EUR", "sell": "26,500"},
            {"currency": "USD", "@Transfer": "23,950", "Sell": "24,011"}
        ]);

        assert_eq!(values(&scan_json(&document, &hints)), vec![dec!(24011), dec!(23950)]);
    }

    #[test]
    fn json_usd_keys_with_scalars_are_candidates() {
        let hints = StructuredHints::default();
        let document = json!({"data": {"usdRate": 23977, "usd_label": {"nested": true}}});

        assert_eq!(values(&scan_json(&document, &hints)), vec![dec!(23977)]);
    }

    #[test]
    fn xml_attributes_follow_preference_order() {
        let hints = StructuredHints::usd(&["Transfer", "Sell", "Buy"]);
        let xml = r#"<ExrateList>
            <DateTime>9/1/2023 8:00:00 AM</DateTime>
            <Exrate CurrencyCode="EUR" Buy="25,500.00" Transfer="25,700.00" Sell="26,800.00" />
            <Exrate CurrencyCode="USD" CurrencyName="US DOLLAR" Buy="23,830.00" Transfer="23,860.00" Sell="24,200.00" />
        </ExrateList>"#;

        let scan = scan_xml(xml, &hints);
        assert!(scan.error.is_none());
        assert_eq!(values(&scan.found), vec![dec!(23860.00), dec!(24200.00), dec!(23830.00)]);
    }

    #[test]
    fn malformed_xml_is_reported() {
        let hints = StructuredHints::default();
        assert!(scan_xml("<Exrate CurrencyCode=\"USD\"></Other>", &hints).error.is_some());
    }

    #[test]
    fn values_read_before_a_parse_error_are_kept() {
        let hints = StructuredHints::usd(&["Transfer"]);
        let xml = r#"<ExrateList><Exrate CurrencyCode="USD" Transfer="23,977.00"/><Source>VCB</Sourc></ExrateList>"#;

        let scan = scan_xml(xml, &hints);
        assert!(scan.error.is_some());
        assert_eq!(values(&scan.found), vec![dec!(23977.00)]);
    }
}
