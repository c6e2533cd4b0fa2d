//! Tabular bulk import.

use tracing::info;

use crate::error::{RecordResult, ValidationError};
use crate::record::{CustomFieldEntry, RecordFields};
use crate::service::{Actor, RecordService};

const CUSTOM_FIELD_PREFIX: &str = "customFieldsData.";

/// A header cell, resolved once for the whole import.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    PrimaryName,
    Code,
    Name,
    Email,
    Phone,
    Website,
    Industry,
    Plan,
    Description,
    OwnerId,
    TagIds,
    CustomField(String),
}

impl Column {
    fn parse(header: &str) -> Result<Self, ValidationError> {
        let header = header.trim();
        if let Some(field_id) = header.strip_prefix(CUSTOM_FIELD_PREFIX) {
            if !field_id.is_empty() {
                return Ok(Self::CustomField(field_id.to_string()));
            }
        }
        Ok(match header {
            "primaryName" => Self::PrimaryName,
            "code" => Self::Code,
            "name" => Self::Name,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "website" => Self::Website,
            "industry" => Self::Industry,
            "plan" => Self::Plan,
            "description" => Self::Description,
            "ownerId" => Self::OwnerId,
            "tagIds" => Self::TagIds,
            other => {
                return Err(ValidationError::UnknownField {
                    field: other.to_string(),
                })
            }
        })
    }

    fn apply(&self, fields: &mut RecordFields, value: &str) {
        let value = value.to_string();
        match self {
            Self::PrimaryName => fields.primary_name = Some(value),
            Self::Code => fields.code = Some(value),
            Self::Name => fields.name = Some(value),
            Self::Email => fields.email = Some(value),
            Self::Phone => fields.phone = Some(value),
            Self::Website => fields.website = Some(value),
            Self::Industry => fields.industry = Some(value),
            Self::Plan => fields.plan = Some(value),
            Self::Description => fields.description = Some(value),
            Self::OwnerId => fields.owner_id = Some(value),
            Self::TagIds => {
                fields.tag_ids = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(ToString::to_string)
                        .collect(),
                );
            }
            Self::CustomField(field_id) => fields
                .custom_fields_data
                .get_or_insert_with(Vec::new)
                .push(CustomFieldEntry::new(field_id.clone(), value)),
        }
    }
}

fn row_fields(columns: &[Column], row: &[String]) -> RecordFields {
    let mut fields = RecordFields::default();
    for (column, cell) in columns.iter().zip(row) {
        let cell = cell.trim();
        if !cell.is_empty() {
            column.apply(&mut fields, cell);
        }
    }
    fields
}

impl RecordService {
    /// Create one record per row of `rows`, reading columns by `field_names`.
    ///
    /// Recognized headers are `primaryName`, `code`, `name`, `email`, `phone`,
    /// `website`, `industry`, `plan`, `description`, `ownerId`, `tagIds`
    /// (comma separated) and `customFieldsData.<fieldId>`. Blank cells are
    /// skipped. A failing row does not stop the import; its error is returned
    /// as `"row N: <error>"` (rows counted from 1).
    ///
    /// # Errors
    /// - `UnknownField`: if a header is not recognized; nothing is imported
    pub fn bulk_insert(
        &self,
        field_names: &[String],
        rows: &[Vec<String>],
        actor: Option<&Actor>,
    ) -> RecordResult<Vec<String>> {
        let columns = field_names
            .iter()
            .map(|name| Column::parse(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut errors = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if let Err(err) = self.create(row_fields(&columns, row), actor) {
                errors.push(format!("row {}: {err}", index + 1));
            }
        }

        info!(
            content_type = %self.config.content_type,
            rows = rows.len(),
            failed = errors.len(),
            "bulk import finished"
        );
        Ok(errors)
    }
}
