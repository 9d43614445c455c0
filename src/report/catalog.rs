//! Field name to declared type lookup for one report type.

use std::collections::HashMap;

use super::fields::{FieldSpec, FieldType};
use crate::api::ReportFieldInfo;
use crate::error::ReportError;

/// Declared types of every field a report type offers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFieldCatalog {
    report_type: String,
    types: HashMap<String, FieldType>,
}

impl ReportFieldCatalog {
    pub fn new(report_type: impl Into<String>, fields: &[ReportFieldInfo]) -> Self {
        Self {
            report_type: report_type.into(),
            types: fields
                .iter()
                .map(|info| (info.field_name.clone(), FieldType::parse(&info.field_type)))
                .collect(),
        }
    }

    pub fn report_type(&self) -> &str {
        &self.report_type
    }

    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Check every requested field exists and return each one's effective
    /// type: the declared override, else the catalog's.
    pub fn resolve(&self, fields: &[FieldSpec]) -> Result<Vec<FieldType>, ReportError> {
        let mut types = Vec::with_capacity(fields.len());
        let mut missing = Vec::new();
        for field in fields {
            match (&field.field_type, self.types.get(&field.name)) {
                (_, None) => missing.push(field.name.clone()),
                (Some(declared), Some(_)) => types.push(declared.clone()),
                (None, Some(catalog)) => types.push(catalog.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(ReportError::UnknownFields {
                report_type: self.report_type.clone(),
                fields: missing,
            });
        }
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ReportFieldCatalog {
        ReportFieldCatalog::new(
            "ACCOUNT_PERFORMANCE_REPORT",
            &[
                ReportFieldInfo::new("Date", "Date"),
                ReportFieldInfo::new("Cost", "Money"),
                ReportFieldInfo::new("Clicks", "Long"),
                ReportFieldInfo::new("Labels", "StringList"),
            ],
        )
    }

    #[test]
    fn test_resolve_fills_missing_types() {
        let fields = vec![
            FieldSpec::new("Cost"),
            FieldSpec::new("Clicks").field_type("Double"),
            FieldSpec::new("Labels"),
        ];
        let types = catalog().resolve(&fields).unwrap();
        assert_eq!(
            types,
            vec![
                FieldType::Money,
                FieldType::Double,
                FieldType::List("StringList".to_string())
            ]
        );
    }

    #[test]
    fn test_resolve_reports_every_unknown_field() {
        let fields = vec![
            FieldSpec::new("Cost"),
            FieldSpec::new("Bogus"),
            FieldSpec::new("Missing").field_type("Money"),
        ];
        match catalog().resolve(&fields) {
            Err(ReportError::UnknownFields { report_type, fields }) => {
                assert_eq!(report_type, "ACCOUNT_PERFORMANCE_REPORT");
                assert_eq!(fields, vec!["Bogus", "Missing"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert!(!catalog.is_empty());
        assert_eq!(catalog.field_type("Cost"), Some(&FieldType::Money));
        assert_eq!(catalog.field_type("Nope"), None);
    }
}
