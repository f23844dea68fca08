//! HTML table extraction for the scraped sites.
//!
//! Extraction is forgiving on purpose: a missing table yields an empty
//! result with a warning, a missing field yields `"N/A"`, and all text is
//! whitespace-normalized. Page drift must never abort a batch.
//!
//! All functions here are synchronous over `&str`; parsed documents are
//! not `Send` and must never be held across an await point.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::Value;

use crate::NOT_AVAILABLE;

/// One row of the signal-site front page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewRow {
    pub date: String,
    pub symbol: String,
    pub signal: String,
    pub buy_level: String,
    pub close_price: String,
}

/// One row of a per-symbol signal history table, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalHistoryRow {
    pub date: String,
    pub price: String,
    pub signal: String,
    pub change_pct: String,
    pub value: String,
}

/// Analyst opinion payload embedded in the quote page markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpinionSnapshot {
    pub symbol_name: String,
    pub last_price: String,
    pub percent_change: String,
    pub price_change: String,
    pub opinion: String,
}

/// One congressional trading disclosure row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CongressTrade {
    pub ticker: String,
    pub company: String,
    pub transaction_type: String,
    pub transaction_amount: String,
    pub filed_date: String,
    pub traded_date: String,
    pub gain_or_loss: String,
}

/// Extract the signal-site front page: `table.table-hover` rows of class
/// `gridRows`, with fields located by `id` attribute fragments.
pub fn extract_overview(html: &str) -> Vec<OverviewRow> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&sel("table.table-hover")).next() else {
        tracing::warn!("overview table missing from page");
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in table.select(&sel("tr.gridRows")) {
        rows.push(OverviewRow {
            date: div_with_id_fragment(row, "Tarih"),
            symbol: first_text(row, "a.dxbs-hyperlink"),
            signal: div_with_id_fragment(row, "gridlevel"),
            buy_level: div_with_id_fragment(row, "gridprice"),
            close_price: div_with_id_fragment(row, "gridclose"),
        });
    }
    rows
}

/// Extract a per-symbol signal history table. Rows with fewer than five
/// cells are skipped.
pub fn extract_signal_history(html: &str) -> Vec<SignalHistoryRow> {
    let document = Html::parse_document(html);
    let table_selector = sel("table#Content_SignalHistory_SignalShortHistoryGrid_DXMainTable");
    let Some(table) = document.select(&table_selector).next() else {
        tracing::warn!("signal history table missing from page");
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in table.select(&sel("tbody tr")) {
        let cells: Vec<String> = row
            .select(&sel("td"))
            .map(|cell| normalize_text(&element_text(cell)))
            .collect();
        if cells.len() < 5 {
            continue;
        }
        rows.push(SignalHistoryRow {
            date: cells[0].clone(),
            price: cells[1].clone(),
            signal: cells[2].clone(),
            change_pct: cells[3].clone(),
            value: cells[4].clone(),
        });
    }
    rows
}

/// Extract the opinion snapshot from the JSON blob the quote page embeds
/// in a `data-symbol` attribute under `div.note-button`.
pub fn extract_opinion(html: &str) -> Option<OpinionSnapshot> {
    let document = Html::parse_document(html);
    let anchor = document
        .select(&sel("div.note-button a"))
        .find(|a| a.value().attr("data-symbol").is_some());
    let Some(anchor) = anchor else {
        tracing::warn!("opinion payload missing from page");
        return None;
    };

    let raw = anchor.value().attr("data-symbol").unwrap_or_default();
    let payload: Value = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(%error, "opinion payload is not valid JSON");
            return None;
        }
    };

    Some(OpinionSnapshot {
        symbol_name: json_field(&payload, "symbolName"),
        last_price: json_field(&payload, "lastPrice"),
        percent_change: json_field(&payload, "percentChange"),
        price_change: json_field(&payload, "priceChange"),
        opinion: json_field(&payload, "opinion"),
    })
}

/// Extract congressional trading disclosures from `table#tradeTable`.
/// Rows with fewer than six cells are skipped.
pub fn extract_congress_trades(html: &str) -> Vec<CongressTrade> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&sel("table#tradeTable")).next() else {
        tracing::warn!("congress trade table missing from page");
        return Vec::new();
    };

    let mut trades = Vec::new();
    for row in table.select(&sel("tbody tr")) {
        let cells: Vec<ElementRef<'_>> = row.select(&sel("td")).collect();
        if cells.len() < 6 {
            continue;
        }

        let (ticker, company) = match cells[0].select(&sel("div.flex-column")).next() {
            Some(column) => (
                first_text(column, "a[href]"),
                first_text(column, "span"),
            ),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        let (transaction_type, transaction_amount) =
            match cells[1].select(&sel("a.flex-column")).next() {
                Some(link) => (first_text(link, "strong"), first_text(link, "span")),
                None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
            };

        let gain_or_loss = {
            let text = normalize_text(&element_text(cells[5]));
            if text == "-" || text.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                text
            }
        };

        trades.push(CongressTrade {
            ticker,
            company,
            transaction_type,
            transaction_amount,
            filed_date: or_na(normalize_text(&element_text(cells[2]))),
            traded_date: or_na(normalize_text(&element_text(cells[3]))),
            gain_or_loss,
        });
    }
    trades
}

/// Collapse whitespace runs, strip ends, remove embedded line breaks.
pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text of the first descendant `div` whose `id` contains `fragment`.
fn div_with_id_fragment(scope: ElementRef<'_>, fragment: &str) -> String {
    let found = scope.select(&sel("div")).find(|div| {
        div.value()
            .attr("id")
            .is_some_and(|id| id.contains(fragment))
    });
    match found {
        Some(div) => or_na(normalize_text(&element_text(div))),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Normalized text of the first element matching `css`, or `"N/A"`.
fn first_text(scope: ElementRef<'_>, css: &str) -> String {
    match scope.select(&sel(css)).next() {
        Some(element) => or_na(normalize_text(&element_text(element))),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_na(text: String) -> String {
    if text.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        text
    }
}

/// Render a JSON field as text; absent or null fields become `"N/A"`.
fn json_field(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(text)) => or_na(normalize_text(text)),
        Some(Value::Null) | None => NOT_AVAILABLE.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_runs() {
        assert_eq!(normalize_text("  BUY \n  at\t open  "), "BUY at open");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn overview_without_table_is_empty() {
        assert!(extract_overview("<html><body><p>maintenance</p></body></html>").is_empty());
    }

    #[test]
    fn overview_missing_fields_become_na() {
        let html = r#"
            <table class="table-hover">
              <tr class="gridRows">
                <td><a class="dxbs-hyperlink">AAPL</a></td>
                <td><div id="ctl_Tarih_0">3/07/2026</div></td>
              </tr>
            </table>"#;
        let rows = extract_overview(html);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].date, "3/07/2026");
        assert_eq!(rows[0].signal, "N/A");
        assert_eq!(rows[0].buy_level, "N/A");
    }

    #[test]
    fn signal_history_skips_short_rows() {
        let html = r#"
            <table id="Content_SignalHistory_SignalShortHistoryGrid_DXMainTable">
              <tbody>
                <tr><td>header-ish</td></tr>
                <tr>
                  <td> 03/07 </td><td>187.50</td><td>BUY  at
                  open</td><td>1.25%</td><td>14.6</td>
                </tr>
              </tbody>
            </table>"#;
        let rows = extract_signal_history(html);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "03/07");
        assert_eq!(rows[0].price, "187.50");
        assert_eq!(rows[0].signal, "BUY at open");
        assert_eq!(rows[0].change_pct, "1.25%");
    }

    #[test]
    fn opinion_reads_embedded_json() {
        let html = r#"
            <div class="note-button">
              <a data-symbol='{"symbolName":"Apple Inc","lastPrice":"187.50","percentChange":"1.25","opinion":"88% Buy"}'>note</a>
            </div>"#;
        let snapshot = extract_opinion(html).expect("snapshot should parse");
        assert_eq!(snapshot.symbol_name, "Apple Inc");
        assert_eq!(snapshot.last_price, "187.50");
        assert_eq!(snapshot.opinion, "88% Buy");
        assert_eq!(snapshot.price_change, "N/A");
    }

    #[test]
    fn opinion_with_bad_json_is_none() {
        let html = r#"<div class="note-button"><a data-symbol='{broken'>note</a></div>"#;
        assert!(extract_opinion(html).is_none());
    }

    #[test]
    fn congress_rows_map_dash_gain_to_na() {
        let html = r#"
            <table id="tradeTable">
              <tbody>
                <tr>
                  <td><div class="flex-column"><a href="/s/NVDA">NVDA</a><span>NVIDIA Corp</span></div></td>
                  <td><a class="flex-column"><strong>Purchase</strong><span>$1M - $5M</span></a></td>
                  <td>Jan 12, 2026</td>
                  <td>Dec 30, 2025</td>
                  <td>13</td>
                  <td>-</td>
                </tr>
              </tbody>
            </table>"#;
        let trades = extract_congress_trades(html);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].ticker, "NVDA");
        assert_eq!(trades[0].company, "NVIDIA Corp");
        assert_eq!(trades[0].transaction_type, "Purchase");
        assert_eq!(trades[0].transaction_amount, "$1M - $5M");
        assert_eq!(trades[0].gain_or_loss, "N/A");
    }
}
