//! In-memory services shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::StatusCode;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::api::{
    AdwordsServices, DownloadOptions, ListingService, ReportDefinition, ReportDefinitionService,
    ReportDownloader, ReportFieldInfo, Selector,
};
use crate::error::ApiError;
use crate::retry::RetryPolicy;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Retries without sleeping.
pub(crate) fn instant_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::ZERO, 2)
}

/// Fake vendor client. Reports are served per client customer id, listing
/// pages per service name, and every call is recorded.
#[derive(Default)]
pub(crate) struct FakeServices {
    pub reports: HashMap<String, Vec<u8>>,
    pub catalog: Vec<ReportFieldInfo>,
    pub pages: HashMap<String, Value>,
    /// Number of downloads that fail before one succeeds.
    pub failing_downloads: Cell<u32>,
    pub failure_status: Option<StatusCode>,
    /// Number of streams that break with a connection reset partway through.
    pub broken_streams: Cell<u32>,
    /// Streams handed out and since dropped.
    pub closed_streams: Cell<u32>,
    pub downloads: RefCell<Vec<(ReportDefinition, DownloadOptions)>>,
    pub catalog_calls: Cell<u32>,
    pub listings: RefCell<Vec<(String, Selector)>>,
}

impl FakeServices {
    pub(crate) fn with_catalog(fields: &[(&str, &str)]) -> Self {
        Self {
            catalog: fields
                .iter()
                .map(|(name, field_type)| ReportFieldInfo::new(*name, *field_type))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn report(mut self, client_customer_id: &str, csv: &str) -> Self {
        self.reports.insert(client_customer_id.to_string(), gzip(csv));
        self
    }

    pub(crate) fn page(mut self, service: &str, page: Value) -> Self {
        self.pages.insert(service.to_string(), page);
        self
    }

    pub(crate) fn failing(self, count: u32, status: StatusCode) -> Self {
        self.failing_downloads.set(count);
        Self {
            failure_status: Some(status),
            ..self
        }
    }

    pub(crate) fn breaking(self, count: u32) -> Self {
        self.broken_streams.set(count);
        self
    }

    pub(crate) fn download_count(&self) -> usize {
        self.downloads.borrow().len()
    }
}

struct FakeDownloader<'a>(&'a FakeServices);

impl ReportDownloader for FakeDownloader<'_> {
    fn download_report_as_stream(
        &self,
        definition: &ReportDefinition,
        options: &DownloadOptions,
    ) -> Result<Box<dyn Read + '_>, ApiError> {
        let services = self.0;
        services
            .downloads
            .borrow_mut()
            .push((definition.clone(), options.clone()));

        let remaining = services.failing_downloads.get();
        if remaining > 0 {
            services.failing_downloads.set(remaining - 1);
            return Err(ApiError::ReportDownload {
                status: services
                    .failure_status
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: "ReportDownloadError.ERROR_GETTING_RESPONSE_FROM_BACKEND".into(),
            });
        }

        let body = services
            .reports
            .get(&options.client_customer_id)
            .cloned()
            .unwrap_or_else(|| gzip(""));
        let remaining = services.broken_streams.get();
        let break_at = if remaining > 0 {
            services.broken_streams.set(remaining - 1);
            Some(BREAK_AFTER_BYTES)
        } else {
            None
        };
        Ok(Box::new(FakeStream {
            body: Cursor::new(body),
            break_at,
            closed: &services.closed_streams,
        }))
    }
}

const BREAK_AFTER_BYTES: u64 = 8;

/// Report body that can fail mid-read and counts its own drop.
struct FakeStream<'a> {
    body: Cursor<Vec<u8>>,
    break_at: Option<u64>,
    closed: &'a Cell<u32>,
}

impl Read for FakeStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.break_at {
            Some(limit) if self.body.position() >= limit => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            Some(limit) => {
                let room = (limit - self.body.position()) as usize;
                let len = buf.len().min(room);
                self.body.read(&mut buf[..len])
            }
            None => self.body.read(buf),
        }
    }
}

impl Drop for FakeStream<'_> {
    fn drop(&mut self) {
        self.closed.set(self.closed.get() + 1);
    }
}

struct FakeDefinitions<'a>(&'a FakeServices);

impl ReportDefinitionService for FakeDefinitions<'_> {
    fn get_report_fields(&self, _report_type: &str) -> Result<Vec<ReportFieldInfo>, ApiError> {
        self.0.catalog_calls.set(self.0.catalog_calls.get() + 1);
        Ok(self.0.catalog.clone())
    }
}

struct FakeListing<'a> {
    services: &'a FakeServices,
    name: String,
}

impl ListingService for FakeListing<'_> {
    fn get(&self, selector: &Selector) -> Result<Value, ApiError> {
        self.services
            .listings
            .borrow_mut()
            .push((self.name.clone(), selector.clone()));
        self.services
            .pages
            .get(&self.name)
            .cloned()
            .ok_or_else(|| ApiError::Service {
                service: self.name.clone(),
                message: "unknown service".into(),
            })
    }
}

impl AdwordsServices for FakeServices {
    fn report_downloader(&self, _version: &str) -> Result<Box<dyn ReportDownloader + '_>, ApiError> {
        Ok(Box::new(FakeDownloader(self)))
    }

    fn report_definition_service(
        &self,
        _version: &str,
    ) -> Result<Box<dyn ReportDefinitionService + '_>, ApiError> {
        Ok(Box::new(FakeDefinitions(self)))
    }

    fn service(&self, name: &str, _version: &str) -> Result<Box<dyn ListingService + '_>, ApiError> {
        Ok(Box::new(FakeListing {
            services: self,
            name: name.to_string(),
        }))
    }
}
