use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StrataDataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub units: String,
    /// Whether the field is binned and displayed logarithmically by default
    pub take_log: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValues {
    pub values: Vec<f64>,
    pub units: String,
}

/// Access to the sample values of a spatial selection.
///
/// Implementations must return identical results for repeated calls with the
/// same field name.
pub trait FieldSource: Send + Sync {
    /// Name used as the default prefix for saved images
    fn name(&self) -> String;

    fn field_names(&self) -> BTreeSet<String>;

    fn field_info(&self, field: &str) -> Result<FieldInfo, StrataDataError>;

    fn values(&self, field: &str) -> Result<FieldValues, StrataDataError>;

    fn has_field(&self, field: &str) -> bool {
        self.field_names().contains(field)
    }
}

pub(crate) fn unknown_field(field: &str, names: BTreeSet<String>) -> StrataDataError {
    StrataDataError::UnknownField {
        field: field.to_string(),
        available: names.into_iter().collect(),
    }
}

/// Immutable snapshot of the fields needed by one profile build
#[derive(Debug, Clone)]
pub struct SampleSet {
    columns: IndexMap<String, FieldValues>,
    len: usize,
}

impl SampleSet {
    /// Pull every field in `fields` from `source`, validating names up front so a
    /// typo fails before any values are fetched.
    pub fn fetch<S: FieldSource + ?Sized>(
        source: &S,
        fields: &[&str],
    ) -> Result<Self, StrataDataError> {
        let names = source.field_names();
        if let Some(missing) = fields.iter().find(|f| !names.contains(**f)) {
            return Err(unknown_field(missing, names));
        }

        let mut columns = IndexMap::new();
        for field in fields {
            if columns.contains_key(*field) {
                continue;
            }
            columns.insert(field.to_string(), source.values(field)?);
        }
        Self::from_columns(columns)
    }

    pub fn from_columns(
        columns: impl IntoIterator<Item = (String, FieldValues)>,
    ) -> Result<Self, StrataDataError> {
        let columns: IndexMap<String, FieldValues> = columns.into_iter().collect();
        let len = columns.values().next().map(|c| c.values.len()).unwrap_or(0);
        for (field, column) in &columns {
            if column.values.len() != len {
                return Err(StrataDataError::LengthMismatch {
                    field: field.clone(),
                    expected: len,
                    actual: column.values.len(),
                });
            }
        }
        Ok(Self { columns, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, field: &str) -> Result<&FieldValues, StrataDataError> {
        self.columns.get(field).ok_or_else(|| {
            unknown_field(field, self.columns.keys().cloned().collect())
        })
    }

    pub fn values(&self, field: &str) -> Result<&[f64], StrataDataError> {
        Ok(&self.column(field)?.values)
    }

    pub fn units(&self, field: &str) -> Result<&str, StrataDataError> {
        Ok(&self.column(field)?.units)
    }

    /// Replace a column with converted values, keeping the sample count fixed
    pub fn with_converted(
        mut self,
        field: &str,
        values: Vec<f64>,
        units: &str,
    ) -> Result<Self, StrataDataError> {
        if values.len() != self.len {
            return Err(StrataDataError::LengthMismatch {
                field: field.to_string(),
                expected: self.len,
                actual: values.len(),
            });
        }
        let names: BTreeSet<String> = self.columns.keys().cloned().collect();
        let column = self
            .columns
            .get_mut(field)
            .ok_or_else(|| unknown_field(field, names))?;
        column.values = values;
        column.units = units.to_string();
        Ok(self)
    }
}

/// A field source over explicit columns, for point data and tests
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    name: String,
    fields: IndexMap<String, (FieldInfo, Vec<f64>)>,
}

impl SampleTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        units: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        let name = name.into();
        let info = FieldInfo {
            name: name.clone(),
            units: units.into(),
            take_log: false,
        };
        self.fields.insert(name, (info, values));
        self
    }

    /// Set the default log flag of an existing field
    pub fn with_take_log(mut self, name: &str, take_log: bool) -> Self {
        if let Some((info, _)) = self.fields.get_mut(name) {
            info.take_log = take_log;
        }
        self
    }
}

impl FieldSource for SampleTable {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn field_names(&self) -> BTreeSet<String> {
        self.fields.keys().cloned().collect()
    }

    fn field_info(&self, field: &str) -> Result<FieldInfo, StrataDataError> {
        self.fields
            .get(field)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| unknown_field(field, self.field_names()))
    }

    fn values(&self, field: &str) -> Result<FieldValues, StrataDataError> {
        self.fields
            .get(field)
            .map(|(info, values)| FieldValues {
                values: values.clone(),
                units: info.units.clone(),
            })
            .ok_or_else(|| unknown_field(field, self.field_names()))
    }
}
