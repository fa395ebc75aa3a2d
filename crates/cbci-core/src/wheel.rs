//! Wheel filename parsing.

use derive_more::Display;

use crate::{Error, Result};

/// Minimum number of hyphen-separated tokens in a wheel filename:
/// distribution, version, python tag, abi tag, platform tag.
const MIN_WHEEL_TOKENS: usize = 5;

/// The `distribution-version` prefix of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{distribution}-{version}")]
pub struct WheelName {
    pub distribution: String,
    pub version: String,
}

impl WheelName {
    /// Parse a wheel filename, checking that it belongs to `project_name`.
    pub fn parse(filename: &str, project_name: &str) -> Result<Self> {
        let tokens: Vec<&str> = filename.split('-').collect();
        if tokens.len() < MIN_WHEEL_TOKENS {
            return Err(Error::WheelNameTooShort {
                expected: MIN_WHEEL_TOKENS,
                found: tokens.len(),
            });
        }
        if tokens[0] != project_name {
            return Err(Error::WheelProjectMismatch {
                expected: project_name.to_string(),
                found: tokens[0].to_string(),
            });
        }

        Ok(Self {
            distribution: tokens[0].to_string(),
            version: tokens[1].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wheel_name() {
        let wheel = WheelName::parse("pycbc-4.1.0-cp311-cp311-linux_x86_64", "pycbc").unwrap();
        assert_eq!(wheel.distribution, "pycbc");
        assert_eq!(wheel.version, "4.1.0");
        assert_eq!(wheel.to_string(), "pycbc-4.1.0");
    }

    #[test]
    fn test_parse_wheel_name_with_extension() {
        let wheel = WheelName::parse(
            "couchbase_columnar-1.0.0-cp312-cp312-manylinux_2_28_aarch64.whl",
            "couchbase_columnar",
        )
        .unwrap();
        assert_eq!(wheel.to_string(), "couchbase_columnar-1.0.0");
    }

    #[test]
    fn test_too_few_tokens() {
        let err = WheelName::parse("pycbc-4.1.0-cp311", "pycbc").unwrap_err();
        assert_eq!(
            err,
            Error::WheelNameTooShort {
                expected: 5,
                found: 3
            }
        );
        assert_eq!(err.to_string(), "Expected at least 5 tokens, found 3.");
    }

    #[test]
    fn test_project_mismatch() {
        let err = WheelName::parse("couchbase-4.1.0-cp311-cp311-linux_x86_64", "pycbc")
            .unwrap_err();
        assert!(matches!(err, Error::WheelProjectMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "Expected at project name to be pycbc, found couchbase."
        );
    }
}
