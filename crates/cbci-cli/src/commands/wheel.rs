//! Wheel filename command.

use anyhow::Result;
use cbci_core::WheelName;

pub fn parse_wheel_name(wheel_name: &str, project_name: &str) -> Result<String> {
    Ok(WheelName::parse(wheel_name, project_name)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wheel_name() {
        assert_eq!(
            parse_wheel_name("pycbc-4.1.0-cp311-cp311-linux_x86_64", "pycbc").unwrap(),
            "pycbc-4.1.0"
        );
    }

    #[test]
    fn test_parse_wheel_name_errors() {
        let err = parse_wheel_name("pycbc-4.1.0.tar.gz", "pycbc").unwrap_err();
        assert_eq!(err.to_string(), "Expected at least 5 tokens, found 2.");
    }
}
