//! Remote AdWords API surface.
//!
//! The vendor SOAP services are reached through the traits in this module so
//! that any client library (or an in-memory fake) can back the utilities.
//! Report downloads have a plain HTTP protocol and ship with a concrete
//! implementation in [`http`].

pub mod http;

use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

pub use http::HttpReportDownloader;

/// Comparison applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredicateOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    GreaterThanEquals,
    LessThan,
    LessThanEquals,
    StartsWith,
    StartsWithIgnoreCase,
    Contains,
    ContainsIgnoreCase,
    DoesNotContain,
    DoesNotContainIgnoreCase,
    ContainsAny,
    ContainsAll,
    ContainsNone,
}

impl PredicateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateOperator::Equals => "EQUALS",
            PredicateOperator::NotEquals => "NOT_EQUALS",
            PredicateOperator::In => "IN",
            PredicateOperator::NotIn => "NOT_IN",
            PredicateOperator::GreaterThan => "GREATER_THAN",
            PredicateOperator::GreaterThanEquals => "GREATER_THAN_EQUALS",
            PredicateOperator::LessThan => "LESS_THAN",
            PredicateOperator::LessThanEquals => "LESS_THAN_EQUALS",
            PredicateOperator::StartsWith => "STARTS_WITH",
            PredicateOperator::StartsWithIgnoreCase => "STARTS_WITH_IGNORE_CASE",
            PredicateOperator::Contains => "CONTAINS",
            PredicateOperator::ContainsIgnoreCase => "CONTAINS_IGNORE_CASE",
            PredicateOperator::DoesNotContain => "DOES_NOT_CONTAIN",
            PredicateOperator::DoesNotContainIgnoreCase => "DOES_NOT_CONTAIN_IGNORE_CASE",
            PredicateOperator::ContainsAny => "CONTAINS_ANY",
            PredicateOperator::ContainsAll => "CONTAINS_ALL",
            PredicateOperator::ContainsNone => "CONTAINS_NONE",
        }
    }
}

/// One value or a list of values for a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateValues {
    One(String),
    Many(Vec<String>),
}

impl PredicateValues {
    pub fn as_slice(&self) -> &[String] {
        match self {
            PredicateValues::One(value) => std::slice::from_ref(value),
            PredicateValues::Many(values) => values,
        }
    }
}

impl From<&str> for PredicateValues {
    fn from(value: &str) -> Self {
        PredicateValues::One(value.to_string())
    }
}

impl From<String> for PredicateValues {
    fn from(value: String) -> Self {
        PredicateValues::One(value)
    }
}

impl From<Vec<String>> for PredicateValues {
    fn from(values: Vec<String>) -> Self {
        PredicateValues::Many(values)
    }
}

impl From<Vec<&str>> for PredicateValues {
    fn from(values: Vec<&str>) -> Self {
        PredicateValues::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Filter passed through to the remote query untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operator: PredicateOperator,
    pub values: PredicateValues,
}

impl Predicate {
    pub fn new(
        field: impl Into<String>,
        operator: PredicateOperator,
        values: impl Into<PredicateValues>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            values: values.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, PredicateOperator::Equals, value.into())
    }
}

/// Offset window of a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub start_index: u32,
    pub number_results: u32,
}

/// Selector for listing-style services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<Predicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

impl Selector {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn predicates(mut self, predicates: Vec<Predicate>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn paging(mut self, start_index: u32, number_results: u32) -> Self {
        self.paging = Some(Paging {
            start_index,
            number_results,
        });
        self
    }
}

/// Inclusive report date range, both ends formatted `YYYYMMDD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDateRange {
    pub min: String,
    pub max: String,
}

/// Selector part of a report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSelector {
    pub fields: Vec<String>,
    pub date_range: ReportDateRange,
    #[serde(default)]
    pub predicates: Vec<Predicate>,
}

/// Ad hoc report definition sent to the report download endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub report_name: String,
    pub date_range_type: String,
    pub report_type: String,
    pub download_format: String,
    pub selector: ReportSelector,
}

/// Call-level flags for a report download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub skip_column_header: bool,
    pub skip_report_header: bool,
    pub skip_report_summary: bool,
    pub client_customer_id: String,
    pub include_zero_impressions: bool,
}

/// One entry of a report type's field catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFieldInfo {
    pub field_name: String,
    pub field_type: String,
    pub display_field_name: Option<String>,
    pub xml_attribute_name: Option<String>,
    pub field_behavior: Option<String>,
    #[serde(default)]
    pub enum_values: Vec<String>,
    pub can_select: Option<bool>,
    pub can_filter: Option<bool>,
    pub is_enum_type: Option<bool>,
    pub is_beta: Option<bool>,
    pub is_zero_row_compatible: Option<bool>,
    #[serde(default)]
    pub exclusive_fields: Vec<String>,
}

impl ReportFieldInfo {
    pub fn new(field_name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: field_type.into(),
            display_field_name: None,
            xml_attribute_name: None,
            field_behavior: None,
            enum_values: Vec::new(),
            can_select: None,
            can_filter: None,
            is_enum_type: None,
            is_beta: None,
            is_zero_row_compatible: None,
            exclusive_fields: Vec::new(),
        }
    }
}

/// Streams compressed report bodies.
pub trait ReportDownloader {
    /// Open the report body. The returned reader is closed when dropped.
    fn download_report_as_stream(
        &self,
        definition: &ReportDefinition,
        options: &DownloadOptions,
    ) -> Result<Box<dyn Read + '_>, ApiError>;
}

/// Describes the fields available in each report type.
pub trait ReportDefinitionService {
    fn get_report_fields(&self, report_type: &str) -> Result<Vec<ReportFieldInfo>, ApiError>;
}

/// A selector-driven listing service such as `ManagedCustomerService`.
///
/// Pages come back as JSON-shaped vendor objects, typically
/// `{"entries": [...], "totalNumEntries": n}`.
pub trait ListingService {
    fn get(&self, selector: &Selector) -> Result<Value, ApiError>;
}

/// Factory for the services of one API version.
pub trait AdwordsServices {
    fn report_downloader(&self, version: &str) -> Result<Box<dyn ReportDownloader + '_>, ApiError>;

    fn report_definition_service(
        &self,
        version: &str,
    ) -> Result<Box<dyn ReportDefinitionService + '_>, ApiError>;

    fn service(&self, name: &str, version: &str) -> Result<Box<dyn ListingService + '_>, ApiError>;
}
