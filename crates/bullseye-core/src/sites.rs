//! URL templates for the scraped sites.

use crate::Symbol;

const AMERICANBULLS_BASE: &str = "https://www.americanbulls.com";
const BARCHART_BASE: &str = "https://www.barchart.com";
const QUIVERQUANT_BASE: &str = "https://www.quiverquant.com";

/// Front page listing today's signals across all tickers.
pub fn overview_url() -> String {
    format!("{AMERICANBULLS_BASE}/Default.aspx?lang=en")
}

/// Per-symbol signal history page.
pub fn signal_page_url(symbol: &Symbol) -> String {
    format!(
        "{AMERICANBULLS_BASE}/SignalPage.aspx?lang=en&Ticker={}",
        urlencoding::encode(symbol.as_str())
    )
}

/// Per-symbol analyst opinion page.
///
/// The page assembles its data with JavaScript; fetching it needs a
/// rendering transport behind [`crate::http_client::HttpClient`].
pub fn opinion_url(symbol: &Symbol) -> String {
    format!(
        "{BARCHART_BASE}/stocks/quotes/{}/opinion",
        urlencoding::encode(symbol.as_str())
    )
}

/// Congressional trading disclosures for one politician.
///
/// `politician` is the site's `Name-ID` slug, e.g. `Nancy Pelosi-P000197`.
/// Like the opinion page, the trade table is script-rendered and needs a
/// rendering transport.
pub fn congress_trades_url(politician: &str) -> String {
    format!(
        "{QUIVERQUANT_BASE}/congresstrading/politician/{}",
        urlencoding::encode(politician)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_page_encodes_ticker() {
        let symbol = Symbol::parse("BRK.B").expect("valid symbol");
        assert_eq!(
            signal_page_url(&symbol),
            "https://www.americanbulls.com/SignalPage.aspx?lang=en&Ticker=BRK.B"
        );
    }

    #[test]
    fn congress_url_encodes_spaces() {
        let url = congress_trades_url("Nancy Pelosi-P000197");
        assert_eq!(
            url,
            "https://www.quiverquant.com/congresstrading/politician/Nancy%20Pelosi-P000197"
        );
    }
}
