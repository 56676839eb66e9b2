//! Attribute Fixtures

use serde::Deserialize;

use crate::attributes::Attribute;

/// Wrapper for attributes in YAML
#[derive(Debug, Deserialize)]
pub struct AttributesFixture {
    /// Attributes in display order
    pub attributes: Vec<Attribute>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn attributes_fixture_parses_values_in_order() -> TestResult {
        let yaml = r"
attributes:
  - id: size
    name: Size
    values: [S, M, L]
";

        let fixture: AttributesFixture = serde_norway::from_str(yaml)?;
        let size = fixture.attributes.first().ok_or("missing attribute")?;

        assert_eq!(size.values(), ["S", "M", "L"]);

        Ok(())
    }

    #[test]
    fn duplicate_values_fail_to_parse() {
        let yaml = r"
attributes:
  - id: size
    name: Size
    values: [S, S]
";

        let result: Result<AttributesFixture, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }
}
