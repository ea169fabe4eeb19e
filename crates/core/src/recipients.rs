//! Recipient aggregation for the audience step.
//!
//! Recipients arrive from three sources (a mapped CSV import, the manual
//! entry form, and previously stored recipients) and are collected into one
//! append-only, order-preserving [`RecipientList`]. Phone numbers are not
//! deduplicated across sources; the only identity check is that a stored
//! recipient is not selected twice.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::csv::CsvTable;
use crate::error::CoreError;
use crate::types::RecordId;

/// Prefix of ids assigned to recipients that have not been saved yet.
pub const TEMP_ID_PREFIX: &str = "temp-";

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Where a recipient entered the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientSource {
    Csv,
    Manual,
    Existing,
}

/// One campaign recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Temporary client id for new entries, the stored id for existing ones.
    pub id: String,
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub source: RecipientSource,
}

impl Recipient {
    /// A previously stored recipient, keeping its server id.
    pub fn existing(
        id: RecordId,
        phone: String,
        first_name: Option<String>,
        last_name: Option<String>,
        company: Option<String>,
    ) -> Self {
        Self {
            id,
            phone,
            first_name: non_blank(first_name),
            last_name: non_blank(last_name),
            company: non_blank(company),
            source: RecipientSource::Existing,
        }
    }

    /// `"first last"` with missing parts dropped; empty when neither is set.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }

    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

fn temp_id() -> String {
    format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Manual entry
// ---------------------------------------------------------------------------

/// Fields of the manual recipient form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ManualRecipientInput {
    #[validate(length(min = 1, message = "Please enter a phone number."))]
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

impl ManualRecipientInput {
    /// Form with only a phone number filled in.
    pub fn phone(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// CSV column mapping
// ---------------------------------------------------------------------------

/// Recipient fields a CSV column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientField {
    Phone,
    FirstName,
    LastName,
    Company,
}

impl RecipientField {
    /// Guess the field a header names, if any.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized: String = header
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "phone" | "phonenumber" | "mobile" | "mobilenumber" | "cell" | "number" => {
                Some(Self::Phone)
            }
            "firstname" | "first" | "givenname" => Some(Self::FirstName),
            "lastname" | "last" | "surname" | "familyname" => Some(Self::LastName),
            "company" | "companyname" | "organization" | "organisation" => Some(Self::Company),
            _ => None,
        }
    }
}

/// Which CSV column feeds which recipient field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: BTreeMap<usize, RecipientField>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `column` (zero-based) onto `field`, replacing any earlier mapping
    /// of that column.
    pub fn map(mut self, column: usize, field: RecipientField) -> Self {
        self.columns.insert(column, field);
        self
    }

    /// Mapping guessed from header names; unrecognised headers are ignored.
    pub fn from_headers(headers: &[String]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| RecipientField::from_header(h).map(|f| (i, f)))
            .collect();
        Self { columns }
    }

    pub fn is_mapped(&self, field: RecipientField) -> bool {
        self.columns.values().any(|f| *f == field)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Read one field from a row. When several columns map to the same
    /// field, the first non-empty value wins.
    fn value(&self, row: &[String], field: RecipientField) -> Option<String> {
        self.columns
            .iter()
            .filter(|(_, f)| **f == field)
            .filter_map(|(i, _)| row.get(*i))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Turn mapped CSV rows into recipients.
///
/// Lenient: a row without a phone number is kept as long as any mapped
/// field is non-empty. Only rows with nothing mapped are dropped.
pub fn recipients_from_rows(rows: &[Vec<String>], mapping: &ColumnMapping) -> Vec<Recipient> {
    rows.iter()
        .filter_map(|row| {
            let phone = mapping.value(row, RecipientField::Phone);
            let first_name = mapping.value(row, RecipientField::FirstName);
            let last_name = mapping.value(row, RecipientField::LastName);
            let company = mapping.value(row, RecipientField::Company);

            if phone.is_none() && first_name.is_none() && last_name.is_none() && company.is_none()
            {
                return None;
            }

            Some(Recipient {
                id: temp_id(),
                phone: phone.unwrap_or_default(),
                first_name,
                last_name,
                company,
                source: RecipientSource::Csv,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RecipientList
// ---------------------------------------------------------------------------

/// The pending recipients of one wizard session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientList {
    items: Vec<Recipient>,
    selected_existing: BTreeSet<RecordId>,
}

impl RecipientList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Recipient] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.items.iter()
    }

    /// Ids of stored recipients already pulled into the list.
    pub fn selected_existing(&self) -> &BTreeSet<RecordId> {
        &self.selected_existing
    }

    /// Append the mapped rows of a CSV import. Returns the appended slice.
    pub fn import_from_csv(&mut self, rows: &[Vec<String>], mapping: &ColumnMapping) -> &[Recipient] {
        let start = self.items.len();
        self.items.extend(recipients_from_rows(rows, mapping));
        &self.items[start..]
    }

    /// Append the data rows of a parsed CSV table.
    pub fn import_table(&mut self, table: &CsvTable, mapping: &ColumnMapping) -> &[Recipient] {
        self.import_from_csv(&table.rows, mapping)
    }

    /// Append one recipient from the manual form.
    pub fn add_manual(&mut self, input: ManualRecipientInput) -> Result<&Recipient, CoreError> {
        input
            .validate()
            .map_err(|_| CoreError::Validation("Please enter a phone number.".to_string()))?;

        self.items.push(Recipient {
            id: temp_id(),
            phone: input.phone,
            first_name: non_blank(input.first_name),
            last_name: non_blank(input.last_name),
            company: non_blank(input.company),
            source: RecipientSource::Manual,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// Pull stored recipients into the list, in the order of `ids`.
    ///
    /// Every id must be present in `known`; otherwise nothing is appended.
    /// Ids that were already selected are skipped. Returns how many
    /// recipients were appended.
    pub fn select_existing(
        &mut self,
        ids: &[RecordId],
        known: &[Recipient],
    ) -> Result<usize, CoreError> {
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            let recipient = known
                .iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    entity: "recipient",
                    id: id.clone(),
                })?;
            resolved.push(recipient);
        }

        let mut appended = 0;
        for recipient in resolved {
            if self.selected_existing.insert(recipient.id.clone()) {
                self.items.push(Recipient {
                    source: RecipientSource::Existing,
                    ..recipient.clone()
                });
                appended += 1;
            }
        }
        Ok(appended)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn known() -> Vec<Recipient> {
        vec![
            Recipient::existing("11".into(), "+15550003333".into(), Some("Cy".into()), None, None),
            Recipient::existing("12".into(), "+15550004444".into(), None, None, Some("Acme".into())),
        ]
    }

    #[test]
    fn manual_requires_phone() {
        let mut list = RecipientList::new();
        assert_matches!(
            list.add_manual(ManualRecipientInput::default()),
            Err(CoreError::Validation(_))
        );
        assert!(list.is_empty());
    }

    #[test]
    fn manual_gets_temporary_id() {
        let mut list = RecipientList::new();
        let r = list
            .add_manual(ManualRecipientInput {
                phone: "+15550001111".into(),
                first_name: Some("Ana".into()),
                last_name: Some("  ".into()),
                company: None,
            })
            .unwrap();
        assert!(r.is_temporary());
        assert_eq!(r.source, RecipientSource::Manual);
        assert_eq!(r.last_name, None);
        assert_eq!(r.display_name(), "Ana");
    }

    #[test]
    fn temporary_ids_are_unique() {
        let mut list = RecipientList::new();
        list.add_manual(ManualRecipientInput::phone("+1")).unwrap();
        list.add_manual(ManualRecipientInput::phone("+1")).unwrap();
        assert_ne!(list.as_slice()[0].id, list.as_slice()[1].id);
    }

    #[test]
    fn csv_rows_keep_order_and_skip_only_empty_rows() {
        let mapping = ColumnMapping::new()
            .map(0, RecipientField::Phone)
            .map(2, RecipientField::Company);
        let rows = vec![
            row(&["+1555", "ignored", "Acme"]),
            row(&["", "ignored", ""]),
            row(&["", "x", "NoPhone Inc"]),
            row(&["+1666"]),
        ];
        let mut list = RecipientList::new();
        let added = list.import_from_csv(&rows, &mapping);
        assert_eq!(added.len(), 3);
        assert_eq!(added[0].phone, "+1555");
        assert_eq!(added[1].phone, "");
        assert_eq!(added[1].company.as_deref(), Some("NoPhone Inc"));
        assert_eq!(added[2].company, None);
    }

    #[test]
    fn duplicate_phones_are_not_merged() {
        let mapping = ColumnMapping::new().map(0, RecipientField::Phone);
        let mut list = RecipientList::new();
        list.add_manual(ManualRecipientInput::phone("+1555")).unwrap();
        list.import_from_csv(&[row(&["+1555"]), row(&["+1555"])], &mapping);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn mapping_from_headers() {
        let headers = row(&["Phone Number", "First Name", "surname", "Org", "Company"]);
        let mapping = ColumnMapping::from_headers(&headers);
        assert!(mapping.is_mapped(RecipientField::Phone));
        assert!(mapping.is_mapped(RecipientField::FirstName));
        assert!(mapping.is_mapped(RecipientField::LastName));
        assert!(mapping.is_mapped(RecipientField::Company));
        assert!(ColumnMapping::from_headers(&row(&["zip"])).is_empty());
    }

    #[test]
    fn select_existing_appends_once() {
        let mut list = RecipientList::new();
        let known = known();
        assert_eq!(list.select_existing(&["12".into(), "11".into()], &known).unwrap(), 2);
        assert_eq!(list.select_existing(&["11".into()], &known).unwrap(), 0);
        let phones: Vec<_> = list.iter().map(|r| r.phone.as_str()).collect();
        assert_eq!(phones, ["+15550004444", "+15550003333"]);
        assert!(list.iter().all(|r| r.source == RecipientSource::Existing));
        assert_eq!(list.selected_existing().len(), 2);
    }

    #[test]
    fn select_unknown_existing_appends_nothing() {
        let mut list = RecipientList::new();
        let result = list.select_existing(&["11".into(), "99".into()], &known());
        assert_matches!(result, Err(CoreError::NotFound { entity: "recipient", .. }));
        assert!(list.is_empty());
    }
}
