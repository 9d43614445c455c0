//! Daily account performance keyed by account and date.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::AdwordsServices;
use crate::dates::DateInput;
use crate::error::ReportError;
use crate::normalize::Normalized;
use crate::report::{FieldSpec, ReportRequest};
use crate::utility::{AdwordsUtility, ListAccountsOptions};

/// Account id, then date, then the remaining metrics of that day's row.
pub type AccountLookup = BTreeMap<String, BTreeMap<NaiveDate, Map<String, Value>>>;

const ACCOUNT_REPORT: &str = "ACCOUNT_PERFORMANCE_REPORT";
const ACCOUNT_ID: &str = "account_id";
const DATE: &str = "date";
const CLEANED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn account_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("Date").alias(DATE),
        FieldSpec::new("ExternalCustomerId").alias(ACCOUNT_ID),
        FieldSpec::new("Cost").alias("cost"),
        FieldSpec::new("Impressions").alias("impressions"),
        FieldSpec::new("Clicks").alias("clicks"),
        FieldSpec::new("Conversions").alias("conversions"),
    ]
}

fn account_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn row_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    NaiveDateTime::parse_from_str(text, CLEANED_DATE_FORMAT)
        .map(|dt| dt.date())
        .ok()
}

/// Fold one report row into the lookup. Later rows overwrite earlier ones
/// for the same account and date.
fn fold_row(
    lookup: &mut AccountLookup,
    header: &[String],
    row: Vec<Value>,
) -> Result<(), ReportError> {
    let mut metrics: Map<String, Value> = header.iter().cloned().zip(row).collect();

    let account_id = metrics
        .shift_remove(ACCOUNT_ID)
        .as_ref()
        .and_then(account_key)
        .ok_or_else(|| ReportError::InvalidRollupRow("row has no account id".into()))?;
    let date = metrics
        .shift_remove(DATE)
        .as_ref()
        .and_then(row_date)
        .ok_or_else(|| {
            ReportError::InvalidRollupRow(format!("row for account {} has no usable date", account_id))
        })?;

    lookup.entry(account_id).or_default().insert(date, metrics);
    Ok(())
}

impl<S: AdwordsServices> AdwordsUtility<S> {
    /// Daily cost, impressions, clicks and conversions of every listed
    /// account, zero-impression days included.
    pub fn get_all_account_info(
        &self,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
    ) -> Result<AccountLookup, ReportError> {
        self.get_all_account_info_with(start_date, end_date, &ListAccountsOptions::default())
    }

    /// Like [`get_all_account_info`](Self::get_all_account_info), listing
    /// accounts with `options`.
    pub fn get_all_account_info_with(
        &self,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
        options: &ListAccountsOptions,
    ) -> Result<AccountLookup, ReportError> {
        let request = ReportRequest::new(ACCOUNT_REPORT, start_date, end_date, account_fields())
            .include_zero_impressions(true);

        let mut lookup = AccountLookup::new();
        for account in self.list_accounts(options)? {
            let customer_id = account
                .get("customerId")
                .and_then(Normalized::to_text)
                .ok_or_else(|| ReportError::InvalidRollupRow("account has no customerId".into()))?;
            debug!(%customer_id, "Fetching account performance");

            let mut report = self.get_report(&request.clone().client_customer_id(customer_id))?;
            let header = report.header().to_vec();
            // First item is the header itself.
            report.next().transpose()?;
            for row in report {
                fold_row(&mut lookup, &header, row?)?;
            }
        }
        Ok(lookup)
    }
}
