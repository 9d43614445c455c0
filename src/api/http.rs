//! Report download over HTTP - the `reportdownload` endpoint.
//! The report definition travels as an `__rdxml` form field.

use std::io::{Read, Write};

use anyhow::Context;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;

use super::{DownloadOptions, ReportDefinition, ReportDownloader};
use crate::auth::OAuth2Client;
use crate::config::Config;
use crate::error::ApiError;

/// XML namespace of report definitions for an API version.
fn report_namespace(version: &str) -> String {
    format!("https://adwords.google.com/api/adwords/cm/{}", version)
}

/// Blocking client for the report download endpoint.
#[derive(Clone)]
pub struct HttpReportDownloader {
    url: String,
    version: String,
    http_client: Client,
    auth_client: OAuth2Client,
    developer_token: String,
    user_agent: String,
}

impl HttpReportDownloader {
    pub fn new(config: &Config, auth_client: OAuth2Client, version: &str) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::HttpClientInit(e.to_string()))?;

        Ok(Self {
            url: config.report_download_url(version),
            version: version.to_string(),
            http_client,
            auth_client,
            developer_token: config.developer_token.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    fn headers(&self, token: &str, options: &DownloadOptions) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Authorization", format!("Bearer {}", token)),
            ("developerToken", self.developer_token.clone()),
            ("userAgent", self.user_agent.clone()),
            ("Content-Type", "application/x-www-form-urlencoded".to_string()),
        ];
        headers.extend(download_flags(options));
        headers
    }
}

impl ReportDownloader for HttpReportDownloader {
    fn download_report_as_stream(
        &self,
        definition: &ReportDefinition,
        options: &DownloadOptions,
    ) -> Result<Box<dyn Read + '_>, ApiError> {
        let xml = report_definition_xml(definition, &self.version)
            .map_err(|e| ApiError::Encoding(format!("{:#}", e)))?;
        let body = format!("__rdxml={}", urlencoding::encode(&xml));

        debug!(url = %self.url, report = %definition.report_name, "Report download request");

        let token = self.auth_client.get_token()?;
        let mut request = self.http_client.post(&self.url);
        for (name, value) in self.headers(&token, options) {
            request = request.header(name, value);
        }
        let response = request.body(body).send()?;

        let status = response.status();
        if status.is_success() {
            Ok(Box::new(response))
        } else {
            let body = response.text().unwrap_or_default();
            debug!(%status, %body, "Report download error response");
            Err(download_error(status, &body))
        }
    }
}

/// Longest error body kept in a download error.
const ERROR_MESSAGE_LIMIT: usize = 200;

/// Error for a non-success download response.
pub(crate) fn download_error(status: StatusCode, body: &str) -> ApiError {
    ApiError::ReportDownload {
        status,
        message: body.trim().chars().take(ERROR_MESSAGE_LIMIT).collect(),
    }
}

impl std::fmt::Debug for HttpReportDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReportDownloader")
            .field("url", &self.url)
            .finish()
    }
}

/// Header flags controlling what the endpoint puts in the body.
pub fn download_flags(options: &DownloadOptions) -> Vec<(&'static str, String)> {
    vec![
        ("clientCustomerId", options.client_customer_id.clone()),
        ("skipReportHeader", options.skip_report_header.to_string()),
        ("skipColumnHeader", options.skip_column_header.to_string()),
        ("skipReportSummary", options.skip_report_summary.to_string()),
        (
            "includeZeroImpressions",
            options.include_zero_impressions.to_string(),
        ),
    ]
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render a report definition as the `__rdxml` document.
pub fn report_definition_xml(definition: &ReportDefinition, version: &str) -> anyhow::Result<String> {
    let mut writer = Writer::new(Vec::new());
    let namespace = report_namespace(version);

    let mut root = BytesStart::new("reportDefinition");
    root.push_attribute(("xmlns", namespace.as_str()));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("selector")))?;
    for field in &definition.selector.fields {
        write_text_element(&mut writer, "fields", field)?;
    }
    for predicate in &definition.selector.predicates {
        writer.write_event(Event::Start(BytesStart::new("predicates")))?;
        write_text_element(&mut writer, "field", &predicate.field)?;
        write_text_element(&mut writer, "operator", predicate.operator.as_str())?;
        for value in predicate.values.as_slice() {
            write_text_element(&mut writer, "values", value)?;
        }
        writer.write_event(Event::End(BytesEnd::new("predicates")))?;
    }
    writer.write_event(Event::Start(BytesStart::new("dateRange")))?;
    write_text_element(&mut writer, "min", &definition.selector.date_range.min)?;
    write_text_element(&mut writer, "max", &definition.selector.date_range.max)?;
    writer.write_event(Event::End(BytesEnd::new("dateRange")))?;
    writer.write_event(Event::End(BytesEnd::new("selector")))?;

    write_text_element(&mut writer, "reportName", &definition.report_name)?;
    write_text_element(&mut writer, "reportType", &definition.report_type)?;
    write_text_element(&mut writer, "dateRangeType", &definition.date_range_type)?;
    write_text_element(&mut writer, "downloadFormat", &definition.download_format)?;

    writer.write_event(Event::End(BytesEnd::new("reportDefinition")))?;

    String::from_utf8(writer.into_inner()).context("report definition is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Predicate, PredicateOperator, ReportDateRange, ReportSelector};

    fn definition() -> ReportDefinition {
        ReportDefinition {
            report_name: "CAMPAIGN_PERFORMANCE_REPORT 20230101-20230105".to_string(),
            date_range_type: "CUSTOM_DATE".to_string(),
            report_type: "CAMPAIGN_PERFORMANCE_REPORT".to_string(),
            download_format: "GZIPPED_CSV".to_string(),
            selector: ReportSelector {
                fields: vec!["CampaignName".to_string(), "Cost".to_string()],
                date_range: ReportDateRange {
                    min: "20230101".to_string(),
                    max: "20230105".to_string(),
                },
                predicates: vec![Predicate::new(
                    "CampaignName",
                    PredicateOperator::Contains,
                    "Brand & Co",
                )],
            },
        }
    }

    #[test]
    fn test_report_definition_xml_layout() {
        let xml = report_definition_xml(&definition(), "v201809").unwrap();

        assert!(xml.starts_with(
            r#"<reportDefinition xmlns="https://adwords.google.com/api/adwords/cm/v201809"><selector>"#
        ));
        assert!(xml.contains("<fields>CampaignName</fields><fields>Cost</fields>"));
        assert!(xml.contains(
            "<predicates><field>CampaignName</field><operator>CONTAINS</operator><values>Brand &amp; Co</values></predicates>"
        ));
        assert!(xml.contains("<dateRange><min>20230101</min><max>20230105</max></dateRange>"));
        assert!(xml.contains("<dateRangeType>CUSTOM_DATE</dateRangeType>"));
        assert!(xml.ends_with("<downloadFormat>GZIPPED_CSV</downloadFormat></reportDefinition>"));
    }

    #[test]
    fn test_server_error_body_is_truncated_and_transient() {
        let body = format!("  {}  ", "x".repeat(300));
        let error = download_error(StatusCode::INTERNAL_SERVER_ERROR, &body);

        match &error {
            ApiError::ReportDownload { status, message } => {
                assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message.chars().count(), 200);
                assert!(message.chars().all(|c| c == 'x'));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(error.is_transient());
    }

    #[test]
    fn test_client_error_keeps_short_body_and_is_not_retried() {
        let body = "<reportDownloadError><type>ReportDefinitionError.INVALID_FIELD_NAME_FOR_REPORT</type></reportDownloadError>";
        let error = download_error(StatusCode::BAD_REQUEST, body);

        assert!(matches!(
            &error,
            ApiError::ReportDownload { status, message }
                if *status == StatusCode::BAD_REQUEST && message == body
        ));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_download_flags() {
        let options = DownloadOptions {
            skip_column_header: true,
            skip_report_header: true,
            skip_report_summary: true,
            client_customer_id: "123-456-7890".to_string(),
            include_zero_impressions: false,
        };
        let flags = download_flags(&options);
        assert!(flags.contains(&("clientCustomerId", "123-456-7890".to_string())));
        assert!(flags.contains(&("skipColumnHeader", "true".to_string())));
        assert!(flags.contains(&("includeZeroImpressions", "false".to_string())));
    }
}
