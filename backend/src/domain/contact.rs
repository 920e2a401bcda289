//! Contact data model and field rules.
//!
//! A [`ContactDraft`] carries raw client input. [`ContactDetails::new`] checks
//! every field and either yields validated details or a
//! [`ContactValidationError`] listing every violated rule, grouped by field.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length of a contact name, in characters.
pub const NAME_MAX: usize = 200;
/// Maximum length of the free-text notes, in characters.
pub const NOTES_MAX: usize = 200;
/// Required number of digits in a phone number.
pub const PHONE_DIGITS: usize = 11;
/// Maximum length of an email address, in characters.
pub const EMAIL_MAX: usize = 200;

/// Store-assigned contact identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ContactId(i32);

impl ContactId {
    /// Wrap a raw identifier.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for ContactId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contact attributes subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactField {
    Name,
    BirthDate,
    Notes,
    Phone,
    Email,
}

impl ContactField {
    /// Name of the field in API payloads and validation reports.
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Name => "nome",
            Self::BirthDate => "dataNasc",
            Self::Notes => "obs",
            Self::Phone => "telefone",
            Self::Email => "email",
        }
    }
}

/// A single rule broken by a [`ContactDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactViolation {
    #[error("O nome é obrigatório")]
    NameRequired,
    #[error("O nome deve ter no máximo {max} caracteres")]
    NameTooLong { max: usize },
    #[error("A data de nascimento é obrigatória")]
    BirthDateRequired,
    #[error("Data de nascimento inválida")]
    BirthDateInvalid,
    #[error("As observações devem ter no máximo {max} caracteres")]
    NotesTooLong { max: usize },
    #[error("O telefone é obrigatório")]
    PhoneRequired,
    #[error("O telefone deve ter {expected} dígitos")]
    PhoneLength { expected: usize },
    #[error("Telefone inválido")]
    PhoneFormat,
    #[error("O email é obrigatório")]
    EmailRequired,
    #[error("O email deve ter no máximo {max} caracteres")]
    EmailTooLong { max: usize },
    #[error("Email inválido")]
    EmailFormat,
}

impl ContactViolation {
    /// Field the rule belongs to.
    pub fn field(&self) -> ContactField {
        match self {
            Self::NameRequired | Self::NameTooLong { .. } => ContactField::Name,
            Self::BirthDateRequired | Self::BirthDateInvalid => ContactField::BirthDate,
            Self::NotesTooLong { .. } => ContactField::Notes,
            Self::PhoneRequired | Self::PhoneLength { .. } | Self::PhoneFormat => {
                ContactField::Phone
            }
            Self::EmailRequired | Self::EmailTooLong { .. } | Self::EmailFormat => {
                ContactField::Email
            }
        }
    }
}

/// Every rule a draft violated.
///
/// ## Invariants
/// - `violations` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactValidationError {
    violations: Vec<ContactViolation>,
}

impl ContactValidationError {
    /// Violations in field order.
    pub fn violations(&self) -> &[ContactViolation] {
        &self.violations
    }

    /// Violation messages grouped by field, preserving field order.
    ///
    /// # Examples
    /// ```
    /// use contacts_backend::domain::{ContactDetails, ContactDraft, ContactField};
    ///
    /// let draft = ContactDraft {
    ///     name: String::new(),
    ///     birth_date: Some("1990-01-01".to_owned()),
    ///     notes: None,
    ///     phone: "11999990000".to_owned(),
    ///     email: "not-an-email".to_owned(),
    /// };
    /// let err = ContactDetails::new(draft).expect_err("two fields are invalid");
    /// let fields: Vec<ContactField> = err.by_field().into_iter().map(|(f, _)| f).collect();
    /// assert_eq!(fields, vec![ContactField::Name, ContactField::Email]);
    /// ```
    pub fn by_field(&self) -> Vec<(ContactField, Vec<String>)> {
        let mut grouped: Vec<(ContactField, Vec<String>)> = Vec::new();
        for violation in &self.violations {
            let field = violation.field();
            match grouped.iter_mut().find(|(existing, _)| *existing == field) {
                Some((_, messages)) => messages.push(violation.to_string()),
                None => grouped.push((field, vec![violation.to_string()])),
            }
        }
        grouped
    }

    /// Whether any violation concerns `field`.
    pub fn concerns(&self, field: ContactField) -> bool {
        self.violations.iter().any(|v| v.field() == field)
    }
}

impl fmt::Display for ContactValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ContactValidationError {}

/// Raw contact input as supplied by a client.
///
/// Missing text fields are represented as empty strings; the birth date is kept
/// as text so unparseable values are reported alongside other violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub birth_date: Option<String>,
    pub notes: Option<String>,
    pub phone: String,
    pub email: String,
}

/// Validated, mutable contact attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    name: String,
    birth_date: NaiveDate,
    notes: Option<String>,
    phone: String,
    email: String,
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // One `@` separating non-empty local and domain parts, no whitespace.
        Regex::new(r"^[^@\s]+@[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Parse a birth date given as `YYYY-MM-DD` or as an RFC 3339 / ISO datetime.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }
    chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|value| value.date())
}

fn check_name(name: &str, violations: &mut Vec<ContactViolation>) {
    if name.is_empty() {
        violations.push(ContactViolation::NameRequired);
    } else if name.chars().count() > NAME_MAX {
        violations.push(ContactViolation::NameTooLong { max: NAME_MAX });
    }
}

fn check_birth_date(
    raw: Option<&str>,
    violations: &mut Vec<ContactViolation>,
) -> Option<NaiveDate> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => {
            violations.push(ContactViolation::BirthDateRequired);
            None
        }
        Some(value) => {
            let parsed = parse_birth_date(value);
            if parsed.is_none() {
                violations.push(ContactViolation::BirthDateInvalid);
            }
            parsed
        }
    }
}

fn check_notes(notes: Option<&str>, violations: &mut Vec<ContactViolation>) {
    if notes.is_some_and(|value| value.chars().count() > NOTES_MAX) {
        violations.push(ContactViolation::NotesTooLong { max: NOTES_MAX });
    }
}

fn check_phone(phone: &str, violations: &mut Vec<ContactViolation>) {
    if phone.is_empty() {
        violations.push(ContactViolation::PhoneRequired);
        return;
    }
    if phone.chars().count() != PHONE_DIGITS {
        violations.push(ContactViolation::PhoneLength {
            expected: PHONE_DIGITS,
        });
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        violations.push(ContactViolation::PhoneFormat);
    }
}

fn check_email(email: &str, violations: &mut Vec<ContactViolation>) {
    if email.is_empty() {
        violations.push(ContactViolation::EmailRequired);
        return;
    }
    if email.chars().count() > EMAIL_MAX {
        violations.push(ContactViolation::EmailTooLong { max: EMAIL_MAX });
    }
    if !email_regex().is_match(email) {
        violations.push(ContactViolation::EmailFormat);
    }
}

impl ContactDetails {
    /// Validate a draft, reporting every violated rule at once.
    ///
    /// Text fields are trimmed; blank notes become `None`.
    ///
    /// # Examples
    /// ```
    /// use contacts_backend::domain::{ContactDetails, ContactDraft};
    ///
    /// let details = ContactDetails::new(ContactDraft {
    ///     name: "Ana".to_owned(),
    ///     birth_date: Some("1990-01-01".to_owned()),
    ///     notes: None,
    ///     phone: "11999990000".to_owned(),
    ///     email: "ana@x.com".to_owned(),
    /// })
    /// .expect("valid draft");
    /// assert_eq!(details.name(), "Ana");
    /// ```
    pub fn new(draft: ContactDraft) -> Result<Self, ContactValidationError> {
        let ContactDraft {
            name,
            birth_date,
            notes,
            phone,
            email,
        } = draft;

        let name = name.trim().to_owned();
        let notes = notes
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let phone = phone.trim().to_owned();
        let email = email.trim().to_owned();

        let mut violations = Vec::new();
        check_name(&name, &mut violations);
        let birth_date = check_birth_date(birth_date.as_deref(), &mut violations);
        check_notes(notes.as_deref(), &mut violations);
        check_phone(&phone, &mut violations);
        check_email(&email, &mut violations);

        match birth_date {
            Some(birth_date) if violations.is_empty() => Ok(Self {
                name,
                birth_date,
                notes,
                phone,
                email,
            }),
            _ => Err(ContactValidationError { violations }),
        }
    }

    /// Rebuild details from values already held by a store.
    ///
    /// Stored rows are trusted as-is: the store schema admits longer notes
    /// than new input may carry, and such rows must stay readable.
    pub fn from_stored(
        name: String,
        birth_date: NaiveDate,
        notes: Option<String>,
        phone: String,
        email: String,
    ) -> Self {
        Self {
            name,
            birth_date,
            notes,
            phone,
            email,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// A persisted contact.
///
/// ## Invariants
/// - `id` and `created_at` never change after insertion.
/// - `updated_at` is `None` until the first successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    id: ContactId,
    details: ContactDetails,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Assemble a contact from stored parts.
    pub fn new(
        id: ContactId,
        details: ContactDetails,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            details,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn details(&self) -> &ContactDetails {
        &self.details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Replace every mutable field and stamp the modification time.
    pub fn overwrite(&mut self, details: ContactDetails, updated_at: DateTime<Utc>) {
        self.details = details;
        self.updated_at = Some(updated_at);
    }
}
