//! Bundled suites
//!
//! Demonstration suites the CLI can run, looked up by name.

pub mod calculator;
pub mod inventory;

pub use calculator::CalculatorSuite;
pub use inventory::InventorySuite;

use crate::executor::{suite, RunnableSuite};

/// Every bundled suite, in run order
pub fn all() -> Vec<Box<dyn RunnableSuite>> {
    vec![
        Box::new(suite::<CalculatorSuite>()),
        Box::new(suite::<InventorySuite>()),
    ]
}

/// Suite with the given name (case-insensitive)
pub fn find(name: &str) -> Option<Box<dyn RunnableSuite>> {
    all()
        .into_iter()
        .find(|s| s.name().eq_ignore_ascii_case(name))
}

pub fn names() -> Vec<String> {
    all().iter().map(|s| s.name().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(names(), ["CalculatorSuite", "InventorySuite"]);
        assert!(find("calculatorsuite").is_some());
        assert!(find("missing").is_none());
    }

    #[test]
    fn test_descriptors_listed_in_declaration_order() {
        let suite = find("InventorySuite").unwrap();
        let descriptors = suite.descriptors();
        assert_eq!(descriptors[0].name, "openStore");
        assert_eq!(descriptors.last().unwrap().name, "closeStore");
    }
}
