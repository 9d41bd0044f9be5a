//! Summary sheet rendering
//!
//! A filing has at most one aggregate per summary form. Each aggregate found is
//! rendered as a fixed block of rows on the `summary` sheet.

use crate::adapters::database::FilingSource;
use crate::core::format::{currency_or_text, date_or_text};
use crate::domain::{
    Cell, ColumnPair, FieldValue, FilingId, LinkStyle, Result, SheetRow, SummaryKind,
    SummaryRecord,
};

/// Name of the sheet holding summary blocks
pub const SUMMARY_SHEET: &str = "summary";

/// Label of the link to the report itself
pub const REPORT_LINK_LABEL: &str = "This report";

/// Label of the link to the committee's report list
pub const COMMITTEE_LINK_LABEL: &str = "All reports from this committee";

/// URL of the filing on the FEC document query service
pub fn report_url(committee_id: &str, filing_id: &FilingId) -> String {
    format!("http://docquery.fec.gov/cgi-bin/forms/{committee_id}/{filing_id}/")
}

/// URL listing every report of a committee
pub fn committee_reports_url(committee_id: &str) -> String {
    format!(
        "http://www.fec.gov/fecviewer/CandidateCommitteeDetail.do?candidateCommitteeId={committee_id}&tabIndex=3"
    )
}

/// Fetches the summary of one kind for a filing
///
/// # Errors
///
/// Propagates [`FolioError::SourceUnavailable`](crate::domain::FolioError::SourceUnavailable)
/// from the source.
pub async fn fetch_summary(
    source: &dyn FilingSource,
    filing_id: &FilingId,
    kind: SummaryKind,
) -> Result<Option<SummaryRecord>> {
    let summary = source.find_summary(filing_id, kind).await?;
    tracing::debug!(
        filing_id = %filing_id,
        kind = %kind,
        found = summary.is_some(),
        "Summary lookup finished"
    );
    Ok(summary)
}

/// Renders a summary block
///
/// Rows, in order: committee name with report links, covering period, column
/// header, cash on hand, debts, total receipts, independent expenditures
/// (PAC summaries only) and total disbursements. Amounts carry the currency
/// hint unless they cannot be parsed, in which case the raw text is kept.
pub fn render_summary(
    filing_id: &FilingId,
    summary: &SummaryRecord,
    link_style: LinkStyle,
) -> Vec<SheetRow> {
    let committee_id = summary.filer_committee_id_number.as_str();
    let mut rows = Vec::with_capacity(8);

    rows.push(vec![
        Cell::text(summary.committee_name.as_str()),
        link_cell(report_url(committee_id, filing_id), REPORT_LINK_LABEL, link_style),
        link_cell(
            committee_reports_url(committee_id),
            COMMITTEE_LINK_LABEL,
            link_style,
        ),
    ]);

    rows.push(vec![Cell::text(format!(
        "Covering period {} through {}",
        date_or_text(&summary.coverage_from_date),
        date_or_text(&summary.coverage_through_date)
    ))]);

    rows.push(vec![
        Cell::text(""),
        Cell::text("Column A This Period"),
        Cell::text(format!(
            "Column B {} to Date",
            summary.kind.to_date_label()
        )),
    ]);

    rows.push(period_only_row("Cash on Hand", &summary.cash_on_hand));
    rows.push(period_only_row("Debts", &summary.debts));
    rows.push(pair_row("Total Receipts", &summary.total_receipts));
    if let Some(ies) = &summary.independent_expenditures {
        rows.push(pair_row("Independent Expenditures", ies));
    }
    rows.push(pair_row("Total Disbursements", &summary.total_disbursements));

    rows
}

fn link_cell(url: String, label: &str, style: LinkStyle) -> Cell {
    match style {
        LinkStyle::Formula => Cell::link(url, label),
        LinkStyle::Plain => Cell::text(url),
    }
}

fn period_only_row(label: &str, value: &FieldValue) -> SheetRow {
    vec![Cell::text(label), currency_or_text(value)]
}

fn pair_row(label: &str, pair: &ColumnPair) -> SheetRow {
    vec![
        Cell::text(label),
        currency_or_text(&pair.period),
        currency_or_text(&pair.to_date),
    ]
}
