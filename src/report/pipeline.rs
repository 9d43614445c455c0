//! Report requests and the lazy cleaned-row stream.

use std::io::{Cursor, ErrorKind, Read};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use flate2::read::GzDecoder;
use serde_json::Value;

use super::clean::default_clean;
use super::fields::{splice_additional, AdditionalField, Cleaner, FieldSpec, FieldType};
use crate::api::{DownloadOptions, Predicate, ReportDateRange, ReportDefinition, ReportSelector};
use crate::dates::{resolve_bounds, DateInput, DEFAULT_DATE_FORMAT};
use crate::error::{ApiError, ReportError};

/// Read size used while buffering the compressed report body.
pub const REPORT_CHUNK_SIZE: usize = 16 * 1024;

const DATE_RANGE_TYPE: &str = "CUSTOM_DATE";
const DOWNLOAD_FORMAT: &str = "GZIPPED_CSV";

/// Everything needed to download and clean one report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub report_type: String,
    pub start_date: DateInput,
    pub end_date: DateInput,
    pub fields: Vec<FieldSpec>,
    pub additional_fields: Vec<AdditionalField>,
    pub predicates: Vec<Predicate>,
    pub client_customer_id: Option<String>,
    pub include_zero_impressions: bool,
}

impl ReportRequest {
    pub fn new(
        report_type: impl Into<String>,
        start_date: impl Into<DateInput>,
        end_date: impl Into<DateInput>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        Self {
            report_type: report_type.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            fields,
            additional_fields: Vec::new(),
            predicates: Vec::new(),
            client_customer_id: None,
            include_zero_impressions: false,
        }
    }

    pub fn additional_fields(mut self, additional_fields: Vec<AdditionalField>) -> Self {
        self.additional_fields = additional_fields;
        self
    }

    pub fn predicates(mut self, predicates: Vec<Predicate>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn client_customer_id(mut self, client_customer_id: impl Into<String>) -> Self {
        self.client_customer_id = Some(client_customer_id.into());
        self
    }

    pub fn include_zero_impressions(mut self, include: bool) -> Self {
        self.include_zero_impressions = include;
        self
    }

    /// Check preconditions and build the remote request. Nothing here touches
    /// the network.
    pub fn prepare(
        &self,
        default_customer_id: Option<&str>,
    ) -> Result<(ReportDefinition, DownloadOptions), ReportError> {
        if self.fields.is_empty() {
            return Err(ReportError::NoFields);
        }

        let (start, end) = resolve_bounds(&self.start_date, &self.end_date, DEFAULT_DATE_FORMAT)?;

        if let Some(field) = self
            .additional_fields
            .iter()
            .find(|field| field.name.trim().is_empty())
        {
            return Err(ReportError::InvalidAdditionalField(format!(
                "missing name for value {}",
                field.value
            )));
        }

        let client_customer_id = self
            .client_customer_id
            .as_deref()
            .or(default_customer_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(ReportError::MissingClientCustomerId)?;

        let min = start.format("%Y%m%d").to_string();
        let max = end.format("%Y%m%d").to_string();

        let definition = ReportDefinition {
            report_name: format!("{} {}-{}", self.report_type, min, max),
            date_range_type: DATE_RANGE_TYPE.to_string(),
            report_type: self.report_type.clone(),
            download_format: DOWNLOAD_FORMAT.to_string(),
            selector: ReportSelector {
                fields: self.fields.iter().map(|field| field.name.clone()).collect(),
                date_range: ReportDateRange { min, max },
                predicates: self.predicates.clone(),
            },
        };

        let options = DownloadOptions {
            skip_column_header: true,
            skip_report_header: true,
            skip_report_summary: true,
            client_customer_id: client_customer_id.to_string(),
            include_zero_impressions: self.include_zero_impressions,
        };

        Ok((definition, options))
    }
}

/// Drain a report stream into memory in fixed-size chunks.
pub fn read_to_buffer(stream: &mut dyn Read) -> Result<Vec<u8>, ApiError> {
    let mut buffer = Vec::new();
    let mut chunk = vec![0u8; REPORT_CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => buffer.extend_from_slice(&chunk[..read]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ApiError::Io(e)),
        }
    }
    Ok(buffer)
}

/// Header of a report: aliases or names, then the additional fields.
pub fn build_header(fields: &[FieldSpec], additional: &[AdditionalField]) -> Vec<String> {
    let mut header: Vec<String> = fields.iter().map(|field| field.header().to_string()).collect();
    splice_additional(&mut header, additional, |field| field.name.clone());
    header
}

struct Column {
    name: String,
    field_type: FieldType,
    cleaning: Option<Cleaner>,
}

impl Column {
    fn clean(&self, raw: &str) -> Result<Value, ReportError> {
        let cleaned = match self.cleaning {
            Some(ref cleaner) => cleaner(raw),
            None => default_clean(raw, &self.field_type),
        };
        cleaned.map_err(|source| ReportError::Cleaning {
            field: self.name.clone(),
            source,
        })
    }
}

type RecordStream = StringRecordsIntoIter<GzDecoder<Cursor<Vec<u8>>>>;

/// A downloaded report.
///
/// Iterating yields the header first, then one cleaned row per record.
/// Decompression, parsing and cleaning happen one row at a time; the
/// compressed body is owned by the report and freed with it.
pub struct Report {
    header: Vec<String>,
    columns: Vec<Column>,
    additional: Vec<AdditionalField>,
    records: RecordStream,
    header_pending: bool,
}

impl Report {
    pub(crate) fn new(
        buffer: Vec<u8>,
        fields: &[FieldSpec],
        types: Vec<FieldType>,
        additional: Vec<AdditionalField>,
    ) -> Self {
        let header = build_header(fields, &additional);
        let columns = fields
            .iter()
            .zip(types)
            .map(|(field, field_type)| Column {
                name: field.name.clone(),
                field_type,
                cleaning: field.cleaning.clone(),
            })
            .collect();

        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(GzDecoder::new(Cursor::new(buffer)))
            .into_records();

        Self {
            header,
            columns,
            additional,
            records,
            header_pending: true,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn clean_record(&self, record: &StringRecord) -> Result<Vec<Value>, ReportError> {
        if record.len() < self.columns.len() {
            return Err(ReportError::ShortRow {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected: self.columns.len(),
                found: record.len(),
            });
        }

        let mut row = self
            .columns
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| column.clean(raw))
            .collect::<Result<Vec<_>, _>>()?;
        splice_additional(&mut row, &self.additional, |field| field.value.clone());
        Ok(row)
    }
}

impl Iterator for Report {
    type Item = Result<Vec<Value>, ReportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.header_pending {
            self.header_pending = false;
            return Some(Ok(self
                .header
                .iter()
                .map(|name| Value::String(name.clone()))
                .collect()));
        }

        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.clean_record(&record))
    }
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Report")
            .field("header", &self.header)
            .field("header_pending", &self.header_pending)
            .finish()
    }
}
