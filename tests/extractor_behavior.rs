//! Behavior tests for the HTML extractors.
//!
//! These verify WHAT comes out of real-world page shapes: blocked or
//! empty pages, ragged rows, and messy whitespace.

use bullseye_core::extract::{
    extract_congress_trades, extract_opinion, extract_overview, extract_signal_history,
    normalize_text,
};

#[test]
fn table_free_pages_yield_empty_results_not_errors() {
    // Block pages and captive portals carry none of the expected markup.
    let html = "<html><body><h1>Access denied</h1></body></html>";

    assert!(extract_overview(html).is_empty());
    assert!(extract_signal_history(html).is_empty());
    assert!(extract_congress_trades(html).is_empty());
    assert!(extract_opinion(html).is_none());
}

#[test]
fn ragged_history_rows_are_skipped() {
    // Given: a history table where one row is missing cells
    let html = r#"
        <table id="Content_SignalHistory_SignalShortHistoryGrid_DXMainTable">
          <tbody>
            <tr><td>03/07</td><td>187.50</td><td>BUY</td><td>1.25%</td><td>14.6</td></tr>
            <tr><td>03/01</td><td>182.00</td></tr>
            <tr><td>02/20</td><td>179.10</td><td>SELL</td><td>-0.8%</td><td>82.1</td></tr>
          </tbody>
        </table>"#;

    // When: the table is extracted
    let rows = extract_signal_history(html);

    // Then: only the complete rows come back, in document order
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "03/07");
    assert_eq!(rows[0].signal, "BUY");
    assert_eq!(rows[1].date, "02/20");
    assert_eq!(rows[1].signal, "SELL");
}

#[test]
fn cell_whitespace_is_collapsed_to_single_spaces() {
    let html = "
        <table id=\"Content_SignalHistory_SignalShortHistoryGrid_DXMainTable\">
          <tbody>
            <tr>
              <td>  03/07 </td>
              <td>187.50</td>
              <td>BUY\n                at open</td>
              <td>1.25%</td>
              <td>14.6</td>
            </tr>
          </tbody>
        </table>";

    let rows = extract_signal_history(html);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "03/07");
    assert_eq!(rows[0].signal, "BUY at open");

    assert_eq!(normalize_text("  a \t b \n c  "), "a b c");
    assert_eq!(normalize_text(""), "");
}

#[test]
fn opinion_payload_is_read_from_the_data_attribute() {
    let html = r#"
        <div class="note-button">
          <a data-symbol='{"symbolName":"AAPL","lastPrice":"187.50","percentChange":"1.25%","priceChange":"2.31","opinion":"88% Buy"}'>notes</a>
        </div>"#;

    let snapshot = extract_opinion(html).expect("opinion present");
    assert_eq!(snapshot.symbol_name, "AAPL");
    assert_eq!(snapshot.opinion, "88% Buy");
    assert_eq!(snapshot.last_price, "187.50");
}

#[test]
fn malformed_opinion_payload_yields_none() {
    let html = r#"<div class="note-button"><a data-symbol='{broken'>notes</a></div>"#;
    assert!(extract_opinion(html).is_none());
}

#[test]
fn congress_rows_replace_missing_gain_with_not_available() {
    let html = r#"
        <table id="tradeTable">
          <tbody>
            <tr>
              <td><div class="flex-column"><a href="/stock/NVDA">NVDA</a><span>NVIDIA Corp</span></div></td>
              <td><a class="flex-column"><strong>Purchase</strong><span>$1M - $5M</span></a></td>
              <td>07/01/2026</td>
              <td>06/20/2026</td>
              <td>ignored</td>
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

#[test]
fn overview_rows_read_fields_by_id_fragment() {
    let html = r#"
        <table class="table-hover">
          <tbody>
            <tr class="gridRows">
              <td><div id="ctl00_Tarih_0">03/07</div></td>
              <td><a class="dxbs-hyperlink" href="/SignalPage.aspx?Ticker=AAPL">AAPL</a></td>
              <td><div id="ctl00_gridlevel_0">BUY</div></td>
              <td><div id="ctl00_gridprice_0">185.20</div></td>
              <td><div id="ctl00_gridclose_0">187.50</div></td>
            </tr>
          </tbody>
        </table>"#;

    let rows = extract_overview(html);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "03/07");
    assert_eq!(rows[0].symbol, "AAPL");
    assert_eq!(rows[0].signal, "BUY");
    assert_eq!(rows[0].buy_level, "185.20");
    assert_eq!(rows[0].close_price, "187.50");
}
