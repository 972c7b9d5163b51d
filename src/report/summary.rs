//! Weekly summary row — the aggregation step.
//!
//! One call, one row: classify every raw record into a bucket, sum sales and
//! cost per bucket, fold the `OtherMisc` tail into a human-readable note,
//! and derive the margin. Deterministic for a given input set.

use super::bucket::Bucket;
use super::numeric::{format_usd, round2, round4, to_number};
use super::RawRow;
use crate::calendar::WeekRange;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

/// Maximum number of sub-groups rendered into the misc notes.
const MISC_NOTE_CAP: usize = 12;

/// Fixed summary CSV column order.
pub const SUMMARY_HEADERS: [&str; 20] = [
    "Month",
    "Dates/Week",
    "DirectOrganic_Sales",
    "GoogleAdsPaid_Sales",
    "GoogleOrganic_Sales",
    "AttentiveSMS_Sales",
    "PriveyEmail_Sales",
    "ActiveCampaign_Sales",
    "OtherMisc_Sales",
    "Tot_Sales",
    "GoogleAdsPaid_Cost",
    "PriveyEmail_Cost",
    "AttentiveSMS_Cost",
    "Total_Cost",
    "GPM",
    "MISC_Notes",
    "Upload_Date",
    "Range_Start",
    "Range_End",
    "Country",
];

/// One week of bucketed channel performance.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub month: String,
    pub dates_week: String,
    pub direct_organic_sales: f64,
    pub google_ads_paid_sales: f64,
    pub google_organic_sales: f64,
    pub attentive_sms_sales: f64,
    pub privey_email_sales: f64,
    pub active_campaign_sales: f64,
    pub other_misc_sales: f64,
    pub total_sales: f64,
    pub google_ads_paid_cost: f64,
    pub privey_email_cost: f64,
    pub attentive_sms_cost: f64,
    pub total_cost: f64,
    /// Gross profit margin, `(sales - cost) / sales`; 0 for a zero-sales week.
    pub gpm: f64,
    pub misc_notes: String,
    pub upload_date: String,
    pub range_start: String,
    pub range_end: String,
    pub country: String,
}

impl SummaryRow {
    /// Render in `SUMMARY_HEADERS` order.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.month.clone(),
            self.dates_week.clone(),
            format!("{:.2}", self.direct_organic_sales),
            format!("{:.2}", self.google_ads_paid_sales),
            format!("{:.2}", self.google_organic_sales),
            format!("{:.2}", self.attentive_sms_sales),
            format!("{:.2}", self.privey_email_sales),
            format!("{:.2}", self.active_campaign_sales),
            format!("{:.2}", self.other_misc_sales),
            format!("{:.2}", self.total_sales),
            format!("{:.2}", self.google_ads_paid_cost),
            format!("{:.2}", self.privey_email_cost),
            format!("{:.2}", self.attentive_sms_cost),
            format!("{:.2}", self.total_cost),
            format!("{:.4}", self.gpm),
            self.misc_notes.clone(),
            self.upload_date.clone(),
            self.range_start.clone(),
            self.range_end.clone(),
            self.country.clone(),
        ]
    }
}

/// Aggregate one week of raw rows into a summary row.
///
/// `upload_date` is passed in rather than read from the clock so the result
/// is a pure function of its inputs.
pub fn aggregate(
    rows: &[RawRow],
    week: &WeekRange,
    country: &str,
    upload_date: NaiveDate,
) -> SummaryRow {
    let mut sales_by: HashMap<Bucket, f64> = HashMap::new();
    let mut cost_by: HashMap<Bucket, f64> = HashMap::new();
    let mut misc_groups: HashMap<String, f64> = HashMap::new();
    let mut total_sales = 0.0;
    let mut total_cost = 0.0;

    for row in rows {
        let blank = row.referring_platform.trim().is_empty()
            && row.channel.trim().is_empty()
            && row.channel_type.trim().is_empty()
            && row.sales.trim().is_empty()
            && row.cost.trim().is_empty();
        if blank {
            continue;
        }

        let sales = to_number(&row.sales);
        let cost = to_number(&row.cost);
        let bucket = Bucket::classify(&row.referring_platform, &row.channel, &row.channel_type);

        *sales_by.entry(bucket).or_default() += sales;
        *cost_by.entry(bucket).or_default() += cost;
        total_sales += sales;
        total_cost += cost;

        if bucket == Bucket::OtherMisc {
            let name = format!("{} ({})", row.channel.trim(), row.channel_type.trim());
            *misc_groups.entry(name).or_default() += sales;
        }
    }

    let sales = |b: Bucket| round2(sales_by.get(&b).copied().unwrap_or(0.0));
    let cost = |b: Bucket| round2(cost_by.get(&b).copied().unwrap_or(0.0));

    let gpm = if total_sales != 0.0 {
        round4((total_sales - total_cost) / total_sales)
    } else {
        0.0
    };

    SummaryRow {
        month: week.start.format("%B").to_string(),
        dates_week: week.label(),
        direct_organic_sales: sales(Bucket::DirectOrganic),
        google_ads_paid_sales: sales(Bucket::GoogleAdsPaid),
        google_organic_sales: sales(Bucket::GoogleOrganic),
        attentive_sms_sales: sales(Bucket::AttentiveSMS),
        privey_email_sales: sales(Bucket::PriveyEmail),
        active_campaign_sales: sales(Bucket::ActiveCampaign),
        other_misc_sales: sales(Bucket::OtherMisc),
        total_sales: round2(total_sales),
        google_ads_paid_cost: cost(Bucket::GoogleAdsPaid),
        privey_email_cost: cost(Bucket::PriveyEmail),
        attentive_sms_cost: cost(Bucket::AttentiveSMS),
        total_cost: round2(total_cost),
        gpm,
        misc_notes: build_misc_notes(&misc_groups),
        upload_date: upload_date.to_string(),
        range_start: week.start.to_string(),
        range_end: week.end.to_string(),
        country: country.to_string(),
    }
}

/// Fold the OtherMisc sub-groups into a pipe-delimited note.
///
/// Sorted descending by sales (name ascending on ties, so the note is
/// stable), capped at [`MISC_NOTE_CAP`] entries, positive-sales only. This
/// is a human-readable field, not a queryable structure.
fn build_misc_notes(groups: &HashMap<String, f64>) -> String {
    let mut entries: Vec<(&str, f64)> = groups.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let parts: Vec<String> = entries
        .iter()
        .take(MISC_NOTE_CAP)
        .filter(|(_, sales)| *sales > 0.0)
        .map(|(name, sales)| format!("{name} {}", format_usd(*sales)))
        .collect();
    parts.join(" | ")
}

/// Write summary rows (header + data) to a CSV file.
pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create summary CSV: {}", path.display()))?;
    writer.write_record(SUMMARY_HEADERS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}
