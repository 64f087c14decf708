use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutable columns of a customer record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl CustomerFields {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            notes: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A restaurant customer, either not yet written to storage or persisted
/// under a storage-assigned id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Customer {
    Unsaved(CustomerFields),
    Saved { id: CustomerId, fields: CustomerFields },
}

impl Customer {
    pub fn new(fields: CustomerFields) -> Self {
        Self::Unsaved(fields)
    }

    pub fn saved(id: CustomerId, fields: CustomerFields) -> Self {
        Self::Saved { id, fields }
    }

    pub fn id(&self) -> Option<CustomerId> {
        match self {
            Self::Unsaved(_) => None,
            Self::Saved { id, .. } => Some(*id),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn fields(&self) -> &CustomerFields {
        match self {
            Self::Unsaved(fields) | Self::Saved { fields, .. } => fields,
        }
    }

    pub fn fields_mut(&mut self) -> &mut CustomerFields {
        match self {
            Self::Unsaved(fields) | Self::Saved { fields, .. } => fields,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.fields().first_name
    }

    pub fn last_name(&self) -> &str {
        &self.fields().last_name
    }

    pub fn phone(&self) -> Option<&str> {
        self.fields().phone.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.fields().notes.as_deref()
    }

    pub fn full_name(&self) -> String {
        self.fields().full_name()
    }

    /// Records the id storage assigned on insert. Fields are kept as-is.
    pub fn assign_id(&mut self, id: CustomerId) {
        let fields = std::mem::take(self.fields_mut());
        *self = Self::Saved { id, fields };
    }
}

/// Upper-cases the first character and leaves the rest exactly as supplied.
///
/// Exact-name lookups normalize their inputs with this; `"cara"` becomes
/// `"Cara"` but `"mcDONALD"` stays `"McDONALD"`.
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize_first, Customer, CustomerFields, CustomerId};

    #[test]
    fn full_name_joins_first_and_last_with_single_space() {
        let customer = Customer::new(CustomerFields::new("Ann", "Lee"));
        assert_eq!(customer.full_name(), "Ann Lee");

        let spaced = Customer::new(CustomerFields::new(" Ann", "Lee "));
        assert_eq!(spaced.full_name(), " Ann Lee ");
    }

    #[test]
    fn new_customer_has_no_id_until_assigned() {
        let mut customer = Customer::new(
            CustomerFields::new("Bob", "Lee").with_phone("555-0100").with_notes("window seat"),
        );
        assert_eq!(customer.id(), None);
        assert!(!customer.is_saved());

        customer.assign_id(CustomerId(42));

        assert_eq!(customer.id(), Some(CustomerId(42)));
        assert!(customer.is_saved());
        assert_eq!(customer.first_name(), "Bob");
        assert_eq!(customer.phone(), Some("555-0100"));
        assert_eq!(customer.notes(), Some("window seat"));
    }

    #[test]
    fn fields_mut_edits_saved_customer_in_place() {
        let mut customer = Customer::saved(CustomerId(7), CustomerFields::new("Cara", "Ng"));
        customer.fields_mut().notes = Some("allergic to nuts".to_string());

        assert_eq!(customer.id(), Some(CustomerId(7)));
        assert_eq!(customer.notes(), Some("allergic to nuts"));
    }

    #[test]
    fn capitalize_first_only_touches_leading_character() {
        assert_eq!(capitalize_first("cara"), "Cara");
        assert_eq!(capitalize_first("ng"), "Ng");
        assert_eq!(capitalize_first("mcDONALD"), "McDONALD");
        assert_eq!(capitalize_first("lEE"), "LEE");
        assert_eq!(capitalize_first("Ann"), "Ann");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("élodie"), "Élodie");
    }

    #[test]
    fn customer_id_displays_as_bare_integer() {
        assert_eq!(CustomerId(15).to_string(), "15");
    }
}
