//! Student identifier types and enumeration
//!
//! An identifier is the concatenation of a two-digit year code, a two-digit
//! facility code, a two-digit department code and a zero-padded sequence
//! number, e.g. `220101001`.

mod generator;

pub use generator::{generate_identifiers, identifier_count};

use std::fmt;

/// Minimum width of the zero-padded sequence component
pub const SEQUENCE_WIDTH: usize = 3;

/// A synthetic key addressing one remote student record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    pub year: String,
    pub facility: String,
    pub department: String,
    pub sequence: u32,
}

impl Identifier {
    pub fn new(year: &str, facility: &str, department: &str, sequence: u32) -> Self {
        Self {
            year: year.to_string(),
            facility: facility.to_string(),
            department: department.to_string(),
            sequence,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{:0width$}",
            self.year,
            self.facility,
            self.department,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_sequence() {
        let id = Identifier::new("22", "01", "03", 7);
        assert_eq!(id.to_string(), "220103007");
    }

    #[test]
    fn test_display_wide_sequence() {
        let id = Identifier::new("22", "01", "03", 1234);
        assert_eq!(id.to_string(), "2201031234");
    }
}
