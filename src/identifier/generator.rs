//! Deterministic identifier enumeration

use crate::config::FacilityEntry;
use crate::identifier::Identifier;

/// Produces the full ordered identifier sequence
///
/// Iteration order is years (declaration order) × facilities (declaration
/// order) × departments (declaration order) × sequence ascending from 1. The
/// output is a pure function of the inputs, so a run can always be restarted
/// from the same plan.
///
/// # Arguments
///
/// * `years` - Year codes in enumeration order
/// * `max_sequence` - Highest sequence number per (year, facility, department)
/// * `facilities` - The category space
///
/// # Example
///
/// ```
/// use roster_harvest::config::Config;
/// use roster_harvest::identifier::generate_identifiers;
///
/// let config = Config::default();
/// let ids = generate_identifiers(&["22".to_string()], 2, &config.facilities);
/// assert_eq!(ids[0].to_string(), "220101001");
/// assert_eq!(ids[1].to_string(), "220101002");
/// ```
pub fn generate_identifiers(
    years: &[String],
    max_sequence: u32,
    facilities: &[FacilityEntry],
) -> Vec<Identifier> {
    let mut identifiers =
        Vec::with_capacity(identifier_count(years, max_sequence, facilities));

    for year in years {
        for facility in facilities {
            for department in &facility.departments {
                for sequence in 1..=max_sequence {
                    identifiers.push(Identifier::new(
                        year,
                        &facility.code,
                        &department.code,
                        sequence,
                    ));
                }
            }
        }
    }

    identifiers
}

/// Number of identifiers [`generate_identifiers`] will produce
pub fn identifier_count(years: &[String], max_sequence: u32, facilities: &[FacilityEntry]) -> usize {
    let departments: usize = facilities.iter().map(|f| f.departments.len()).sum();
    years.len() * departments * max_sequence as usize
}
