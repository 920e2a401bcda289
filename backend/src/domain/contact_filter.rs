//! Local text filter used by list views.
//!
//! Browser clients filter the fetched contact list without calling the API.
//! The matching rule lives here so every client applies the same semantics.

use super::Contact;

/// Case-insensitive substring filter over name, phone and email.
///
/// # Examples
/// ```
/// use contacts_backend::domain::ContactFilter;
///
/// let filter = ContactFilter::new("ANA");
/// assert!(!filter.is_empty());
/// assert!(ContactFilter::new("   ").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFilter {
    needle: String,
}

impl ContactFilter {
    /// Build a filter from user-entered text. Surrounding whitespace is ignored.
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }

    /// Whether the filter accepts every contact.
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Whether `contact` matches the filter.
    pub fn matches(&self, contact: &Contact) -> bool {
        if self.is_empty() {
            return true;
        }
        let details = contact.details();
        [details.name(), details.phone(), details.email()]
            .iter()
            .any(|value| value.to_lowercase().contains(&self.needle))
    }

    /// Keep the matching contacts, preserving order.
    pub fn apply<'a>(&self, contacts: &'a [Contact]) -> Vec<&'a Contact> {
        contacts.iter().filter(|c| self.matches(c)).collect()
    }
}
