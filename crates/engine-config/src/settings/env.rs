use crate::settings::error::SettingsError;
use std::{collections::HashMap, str::FromStr};

/// Typed lookups over a snapshot of environment variables.
///
/// Blank values are treated the same as unset ones.
pub struct EnvReader<'a> {
    vars: &'a HashMap<String, String>,
}

impl<'a> EnvReader<'a> {
    pub fn new(vars: &'a HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn get(&self, var: &str) -> Option<&'a str> {
        self.vars
            .get(var)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, var: &'static str) -> Result<String, SettingsError> {
        self.get(var)
            .map(str::to_string)
            .ok_or(SettingsError::Missing(var))
    }

    pub fn string_or(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or(default).to_string()
    }

    pub fn bool_or(&self, var: &'static str, default: bool) -> Result<bool, SettingsError> {
        match self.get(var) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(SettingsError::InvalidValue {
                    var,
                    value: raw.to_string(),
                    expected: "a boolean",
                }),
            },
        }
    }

    pub fn number_or<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, SettingsError> {
        match self.get(var) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|_| SettingsError::InvalidValue {
                var,
                value: raw.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let env = vars(&[("PORT_DB", "  "), ("DB_SSL", "")]);
        let reader = EnvReader::new(&env);
        assert_eq!(reader.number_or::<u16>("PORT_DB", 5432), Ok(5432));
        assert_eq!(reader.bool_or("DB_SSL", false), Ok(false));
        assert_eq!(reader.required("HOST_DB"), Err(SettingsError::Missing("HOST_DB")));
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let env = vars(&[("A", "TRUE"), ("B", "0"), ("C", "maybe")]);
        let reader = EnvReader::new(&env);
        assert_eq!(reader.bool_or("A", false), Ok(true));
        assert_eq!(reader.bool_or("B", true), Ok(false));
        assert!(matches!(
            reader.bool_or("C", true),
            Err(SettingsError::InvalidValue { var: "C", .. })
        ));
    }

    #[test]
    fn numbers_reject_garbage() {
        let env = vars(&[("MIGRATION_BATCH_SIZE", "five hundred")]);
        let reader = EnvReader::new(&env);
        assert!(reader.number_or::<usize>("MIGRATION_BATCH_SIZE", 500).is_err());
    }
}
