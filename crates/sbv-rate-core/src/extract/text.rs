//! Regex and DOM passes over HTML pages and plain text.
//!
//! `scraper::Html` is `!Send`; every entry point here is synchronous and
//! drops the parsed document before returning.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::normalize::{normalize_token, NormalizedNumber};

/// Characters scanned after the target date on results pages.
const DATE_WINDOW_CHARS: usize = 500;

const NUMBER: &str = r"[0-9]+(?:[.,][0-9]+)*";

const RATE_SELECTORS: [&str; 8] = [
    ".exchange-rate",
    ".rate",
    ".tygia",
    ".usd-rate",
    "[class*=rate]",
    "[class*=exchange]",
    "[id*=rate]",
    "[id*=usd]",
];

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMBER).expect("number regex is valid"));

/// `N VND`, `1 Đô la Mỹ = N`, `1 USD = N`.
static DATE_ANCHORED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)({n})\s*VND",
        r"(?i)1\s*Đô\s*la\s*Mỹ\s*=\s*({n})",
        r"(?i)1\s*USD\s*[=:]\s*({n})",
    ])
});

static WHOLE_TEXT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)1\s*USD\s*[=:]\s*({n})",
        r"(?i)1\s*Đô\s*la\s*Mỹ\s*=\s*({n})",
        r"(?i)({n})\s*VND",
        r"(?i)USD[^0-9\n]*?({n})",
        r"(?i)Đô\s*la\s*Mỹ[^0-9\n]*?({n})",
    ])
});

static SCRIPT_ASSIGNMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r#"(?i)usd["']?\s*[:=]\s*["']?({n})"#,
        r#"(?i)rate["']?\s*[:=]\s*["']?({n})"#,
        r#""USD"[^}]*?["']?({n})"#,
    ])
});

static ROW_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)USD|VND|Đô\s*la\s*Mỹ").expect("row marker regex is valid"));

static RATE_SELECTOR_LIST: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    RATE_SELECTORS
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .collect()
});

static ROW_SELECTOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("tr").ok());
static SCRIPT_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("script").ok());

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&pattern.replace("{n}", NUMBER)).expect("rate pattern regex is valid")
        })
        .collect()
}

/// Plain text: date-anchored window, then whole-text patterns.
pub(crate) fn scan_plain(text: &str, vn_date: &str) -> Vec<NormalizedNumber> {
    let mut found = Vec::new();
    scan_date_window(text, vn_date, &mut found);
    apply_patterns(&WHOLE_TEXT, text, &mut found);
    found
}

/// HTML: date window, table rows, rate-like elements, scripts, whole text.
pub(crate) fn scan_html(html: &str, vn_date: &str) -> Vec<NormalizedNumber> {
    let document = Html::parse_document(html);
    let text = element_text(document.root_element());
    let mut found = Vec::new();

    scan_date_window(&text, vn_date, &mut found);

    if let Some(rows) = ROW_SELECTOR.as_ref() {
        for row in document.select(rows) {
            let row_text = element_text(row);
            if ROW_MARKER.is_match(&row_text) {
                collect_numbers(&row_text, &mut found);
            }
        }
    }

    for selector in RATE_SELECTOR_LIST.iter() {
        for element in document.select(selector) {
            apply_patterns(&WHOLE_TEXT, &element_text(element), &mut found);
        }
    }

    if let Some(scripts) = SCRIPT_SELECTOR.as_ref() {
        for script in document.select(scripts) {
            let body = script.text().collect::<String>();
            if !body.trim().is_empty() {
                apply_patterns(&SCRIPT_ASSIGNMENTS, &body, &mut found);
            }
        }
    }

    apply_patterns(&WHOLE_TEXT, &text, &mut found);
    found
}

fn scan_date_window(text: &str, vn_date: &str, found: &mut Vec<NormalizedNumber>) {
    let Some(position) = text.find(vn_date) else {
        return;
    };
    let window = text[position + vn_date.len()..]
        .chars()
        .take(DATE_WINDOW_CHARS)
        .collect::<String>();
    apply_patterns(&DATE_ANCHORED, &window, found);
}

fn apply_patterns(patterns: &[Regex], text: &str, found: &mut Vec<NormalizedNumber>) {
    for pattern in patterns {
        for captures in pattern.captures_iter(text) {
            if let Some(number) = captures.get(1).and_then(|m| normalize_token(m.as_str())) {
                found.push(number);
            }
        }
    }
}

fn collect_numbers(text: &str, found: &mut Vec<NormalizedNumber>) {
    found.extend(
        NUMBER_RE
            .find_iter(text)
            .filter_map(|m| normalize_token(m.as_str())),
    );
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
