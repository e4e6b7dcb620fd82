//! CSV row model, field normalization, and validation.

use serde::Deserialize;

/// One record from the import file.
///
/// Every column is optional at the parsing layer; validation decides which
/// must actually be present. Unknown columns are ignored and short records
/// read as absent fields.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ImportRow {
    pub alias: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub pin: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_relationship: Option<String>,
}

/// Trims a raw CSV field, treating blank or absent values as `None`.
pub fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Accepted user roles, stored lower-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Mentor,
    Coach,
}

impl Role {
    /// Parse a role value, trimmed and case-insensitive.
    pub fn parse(raw: &str) -> Result<Self, RowError> {
        match raw.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "coach" => Ok(Role::Coach),
            other => Err(RowError::InvalidRole {
                role: other.to_string(),
            }),
        }
    }

    /// Canonical stored form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Coach => "coach",
        }
    }
}

/// Error raised while validating or reconciling a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// A required column is absent or blank
    MissingField { field: &'static str },
    /// Role value outside the accepted set
    InvalidRole { role: String },
    /// New users cannot be created without a PIN
    MissingPin,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::MissingField { field } => {
                write!(f, "Missing required field: {}", field)
            }
            RowError::InvalidRole { role } => {
                write!(
                    f,
                    "Invalid role '{}'. Must be one of: coach, mentor, student",
                    role
                )
            }
            RowError::MissingPin => write!(f, "Pin is required for new users"),
        }
    }
}

impl std::error::Error for RowError {}

/// Trimmed view of a row that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedUser<'a> {
    pub alias: &'a str,
    pub first_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub last_name: &'a str,
    pub role: Role,
    /// Blank PINs normalize to `None`; only inserts require one
    pub pin: Option<&'a str>,
}

impl ImportRow {
    /// Validate the user fields of this row.
    ///
    /// Checks `alias`, `first_name`, `last_name`, and `role` for presence in
    /// that order, then the role value itself. A field that is absent, empty,
    /// or whitespace-only counts as missing. The PIN is enforced separately
    /// by the user reconciler, and only on the insert path.
    pub fn validate(&self) -> Result<ValidatedUser<'_>, RowError> {
        let alias = clean(&self.alias).ok_or(RowError::MissingField { field: "alias" })?;
        let first_name =
            clean(&self.first_name).ok_or(RowError::MissingField { field: "first_name" })?;
        let last_name =
            clean(&self.last_name).ok_or(RowError::MissingField { field: "last_name" })?;
        let role = clean(&self.role).ok_or(RowError::MissingField { field: "role" })?;
        let role = Role::parse(role)?;

        Ok(ValidatedUser {
            alias,
            first_name,
            middle_name: clean(&self.middle_name),
            last_name,
            role,
            pin: clean(&self.pin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row() -> ImportRow {
        ImportRow {
            alias: Some("jdoe".to_string()),
            first_name: Some("Jane".to_string()),
            middle_name: None,
            last_name: Some("Doe".to_string()),
            role: Some("student".to_string()),
            pin: Some("1234".to_string()),
            parent_name: None,
            parent_phone: None,
            parent_relationship: None,
        }
    }

    #[test]
    fn test_validate_accepts_full_row() {
        let row = full_row();
        let user = row.validate().unwrap();
        assert_eq!(user.alias, "jdoe");
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.pin, Some("1234"));
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut row = full_row();
        row.first_name = None;
        row.last_name = None;
        let err = row.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: first_name");
    }

    #[test]
    fn test_validate_blank_field_counts_as_missing() {
        let mut row = full_row();
        row.last_name = Some("   ".to_string());
        let err = row.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: last_name");
    }

    #[test]
    fn test_validate_allows_blank_pin() {
        let mut row = full_row();
        row.pin = Some("".to_string());
        let user = row.validate().unwrap();
        assert_eq!(user.pin, None);
    }

    #[test]
    fn test_validate_trims_fields() {
        let mut row = full_row();
        row.alias = Some("  jdoe  ".to_string());
        row.middle_name = Some("   ".to_string());
        let user = row.validate().unwrap();
        assert_eq!(user.alias, "jdoe");
        assert_eq!(user.middle_name, None);
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("Coach").unwrap(), Role::Coach);
        assert_eq!(Role::parse(" MENTOR ").unwrap(), Role::Mentor);
        assert_eq!(Role::Coach.as_str(), "coach");
    }

    #[test]
    fn test_role_parse_rejects_unknown_value() {
        let err = Role::parse("ninja").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid role 'ninja'. Must be one of: coach, mentor, student"
        );
    }

    #[test]
    fn test_missing_pin_message() {
        assert_eq!(RowError::MissingPin.to_string(), "Pin is required for new users");
    }

    #[test]
    fn test_clean_normalizes_blanks() {
        assert_eq!(clean(&Some(" x ".to_string())), Some("x"));
        assert_eq!(clean(&Some("   ".to_string())), None);
        assert_eq!(clean(&None), None);
    }

    #[test]
    fn test_rows_deserialize_with_unknown_and_missing_columns() {
        let data = "alias,first_name,last_name,role,pin,shirt_size\n\
                    ada,Ada,Lovelace,student,1234,M\n";
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        let rows: Vec<ImportRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].alias.as_deref(), Some("ada"));
        assert_eq!(rows[0].parent_name, None);
    }

    #[test]
    fn test_short_record_reads_as_absent_fields() {
        let data = "alias,first_name,last_name,role,pin\nada,Ada\n";
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        let rows: Vec<ImportRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        let err = rows[0].validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: last_name");
    }

    #[test]
    fn test_empty_csv_field_is_none() {
        let data = "alias,first_name,last_name,role,pin\nada,Ada,Lovelace,student,\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<ImportRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].pin, None);
    }

    #[test]
    fn test_undecodable_record_fails_without_stopping_the_reader() {
        let data = b"alias,first_name,last_name,role,pin\n\
                     ada,Ada,Lovelace,student,1234\n\
                     byte,B\xFFb,Noise,mentor,2345\n\
                     cal,Cal,Ripken,coach,3456\n";
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(&data[..]);
        let rows: Vec<Result<ImportRow, csv::Error>> = reader.deserialize().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
        assert_eq!(rows[2].as_ref().unwrap().alias.as_deref(), Some("cal"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let data = "alias,first_name,last_name,role,pin\n\
                    ada,Ada,Lovelace,student,1234\n\
                    \n\
                    eli,Eli,Whitney,coach,5678\n";
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        let rows: Vec<ImportRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].alias.as_deref(), Some("eli"));
    }
}
