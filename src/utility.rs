//! Session object tying the remote services to the report and listing
//! helpers.

use tracing::{debug, info};

use crate::api::{AdwordsServices, Predicate, ReportFieldInfo, Selector};
use crate::config::{latest_version, Config, SUPPORTED_VERSIONS};
use crate::error::{ApiError, ConfigError, ReportError};
use crate::normalize::{normalize_value, Normalized};
use crate::paging::{iterate_pages, PAGE_SIZE};
use crate::report::pipeline::read_to_buffer;
use crate::report::{Report, ReportFieldCatalog, ReportRequest};
use crate::retry::RetryPolicy;

const MANAGED_CUSTOMER_SERVICE: &str = "ManagedCustomerService";
const ACCOUNT_LABEL_SERVICE: &str = "AccountLabelService";
const ACCOUNT_LABEL_PAGE: u32 = 1000;

/// Options for [`AdwordsUtility::list_accounts`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListAccountsOptions {
    pub fields: Vec<String>,
    pub predicates: Vec<Predicate>,
    pub include_hidden: bool,
    pub include_mcc: bool,
}

impl Default for ListAccountsOptions {
    fn default() -> Self {
        Self {
            fields: vec!["Name".to_string(), "CustomerId".to_string()],
            predicates: Vec::new(),
            include_hidden: false,
            include_mcc: false,
        }
    }
}

impl ListAccountsOptions {
    fn selector(&self, page_size: u32) -> Selector {
        let mut predicates = self.predicates.clone();
        if !self.include_hidden {
            predicates.push(Predicate::equals("ExcludeHiddenAccounts", "TRUE"));
        }
        if !self.include_mcc {
            predicates.push(Predicate::equals("CanManageClients", "FALSE"));
        }
        Selector::new(self.fields.iter().cloned())
            .predicates(predicates)
            .paging(0, page_size)
    }
}

/// Long-lived handle on one AdWords account hierarchy.
///
/// Holds the default client customer id, the API version and the retry
/// policy. Every remote call goes through the [`AdwordsServices`] it wraps.
pub struct AdwordsUtility<S> {
    services: S,
    client_customer_id: Option<String>,
    service_version: String,
    retry: RetryPolicy,
    page_size: u32,
}

impl<S: AdwordsServices> AdwordsUtility<S> {
    /// Create a utility. Without `service_version` the newest supported
    /// version is used.
    pub fn new(
        services: S,
        client_customer_id: Option<String>,
        service_version: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let service_version = match service_version {
            Some(version) if SUPPORTED_VERSIONS.contains(&version) => version.to_string(),
            Some(version) => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid service_version '{}'. Supported versions: {:?}",
                    version, SUPPORTED_VERSIONS
                )))
            }
            None => latest_version().to_string(),
        };

        Ok(Self {
            services,
            client_customer_id,
            service_version,
            retry,
            page_size: PAGE_SIZE,
        })
    }

    /// Create a utility from loaded configuration.
    pub fn from_config(services: S, config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            services,
            config.client_customer_id.clone(),
            Some(config.service_version()),
            config.retry_policy(),
        )
    }

    pub fn client_customer_id(&self) -> Option<&str> {
        self.client_customer_id.as_deref()
    }

    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Replace the default client customer id used by later calls.
    pub fn change_client_customer_id(&mut self, client_customer_id: impl Into<String>) {
        let client_customer_id = client_customer_id.into();
        debug!(%client_customer_id, "Changing client customer id");
        self.client_customer_id = Some(client_customer_id);
    }

    /// Describe the fields a report type offers.
    pub fn get_report_fields(&self, report_type: &str) -> Result<Vec<ReportFieldInfo>, ApiError> {
        self.retry.run(|| {
            self.services
                .report_definition_service(&self.service_version)?
                .get_report_fields(report_type)
        })
    }

    pub fn report_field_catalog(&self, report_type: &str) -> Result<ReportFieldCatalog, ApiError> {
        let fields = self.get_report_fields(report_type)?;
        Ok(ReportFieldCatalog::new(report_type, &fields))
    }

    /// Every entry of a listing service, normalized.
    pub fn get_service(&self, name: &str, selector: &Selector) -> Result<Vec<Normalized>, ApiError> {
        self.paginate(name, selector, |entry| normalize_value(&entry))
    }

    /// Every entry of a listing service as the vendor returned it.
    pub fn get_service_raw(
        &self,
        name: &str,
        selector: &Selector,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        self.paginate(name, selector, |entry| entry)
    }

    /// One call to a listing service, the whole page normalized.
    pub fn get_service_page(&self, name: &str, selector: &Selector) -> Result<Normalized, ApiError> {
        self.retry.run(|| {
            let page = self.services.service(name, &self.service_version)?.get(selector)?;
            Ok(normalize_value(&page))
        })
    }

    fn paginate<T, F>(&self, name: &str, selector: &Selector, mut map: F) -> Result<Vec<T>, ApiError>
    where
        F: FnMut(serde_json::Value) -> T,
    {
        self.retry.run(|| {
            let service = self.services.service(name, &self.service_version)?;
            iterate_pages(service.as_ref(), selector, self.page_size, &mut map)
        })
    }

    /// Accounts under the current manager account.
    pub fn list_accounts(&self, options: &ListAccountsOptions) -> Result<Vec<Normalized>, ApiError> {
        self.get_service(MANAGED_CUSTOMER_SERVICE, &options.selector(self.page_size))
    }

    /// Account labels defined on the manager account.
    pub fn list_account_labels(&self) -> Result<Vec<Normalized>, ApiError> {
        let selector = Selector::new(["LabelName", "LabelId"]).paging(0, ACCOUNT_LABEL_PAGE);
        let page = self.get_service_page(ACCOUNT_LABEL_SERVICE, &selector)?;
        Ok(page
            .get("labels")
            .and_then(Normalized::as_list)
            .map(<[Normalized]>::to_vec)
            .unwrap_or_default())
    }

    /// Download a report and return its cleaned rows.
    ///
    /// Preconditions are checked before any remote call. The download runs
    /// under the retry policy and is fully buffered before the field catalog
    /// is consulted.
    pub fn get_report(&self, request: &ReportRequest) -> Result<Report, ReportError> {
        let (definition, options) = request.prepare(self.client_customer_id())?;
        info!(
            report = %definition.report_name,
            client_customer_id = %options.client_customer_id,
            "Requesting report"
        );

        let downloader = self.services.report_downloader(&self.service_version)?;
        let buffer = self.retry.run(|| {
            let mut stream = downloader.download_report_as_stream(&definition, &options)?;
            read_to_buffer(&mut stream)
        })?;
        debug!(report = %definition.report_name, bytes = buffer.len(), "Report downloaded");

        let catalog = self.report_field_catalog(&request.report_type)?;
        let types = catalog.resolve(&request.fields)?;

        Ok(Report::new(
            buffer,
            &request.fields,
            types,
            request.additional_fields.clone(),
        ))
    }
}

impl<S> std::fmt::Debug for AdwordsUtility<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdwordsUtility")
            .field("client_customer_id", &self.client_customer_id)
            .field("service_version", &self.service_version)
            .field("retry", &self.retry)
            .finish()
    }
}
