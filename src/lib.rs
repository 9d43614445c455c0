//! AdWords Report Utilities
//!
//! Downloads AdWords reports as cleaned, typed rows and wraps the listing
//! services with pagination, retries and response normalization.

pub mod api;
pub mod auth;
pub mod config;
pub mod dates;
pub mod error;
pub mod normalize;
pub mod paging;
pub mod report;
pub mod retry;
pub mod rollup;
pub mod utility;

#[cfg(test)]
mod testing;

pub use api::{
    AdwordsServices, HttpReportDownloader, ListingService, Predicate, PredicateOperator,
    ReportDefinitionService, ReportDownloader, Selector,
};
pub use auth::OAuth2Client;
pub use config::Config;
pub use dates::{date_range, date_range_with_format, DateInput, DateRange};
pub use error::{ApiError, AuthError, ConfigError, ReportError};
pub use normalize::{normalize, normalize_value, Normalized, SoapObject, SoapValue};
pub use report::{AdditionalField, FieldSpec, FieldType, Report, ReportRequest};
pub use retry::RetryPolicy;
pub use rollup::AccountLookup;
pub use utility::{AdwordsUtility, ListAccountsOptions};
