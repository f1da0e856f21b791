use std::fmt;
use std::str::FromStr;

/// Main configuration struct for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub username: String,
    /// Id of the selected visualizer theme.
    pub theme: String,
    pub high_fi: bool,
    pub normalization: bool,
    /// When off, the visualizer animation task is not started.
    pub ui_motion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: "Guest".to_string(),
            theme: "crimson".to_string(),
            high_fi: true,
            normalization: true,
            ui_motion: true,
        }
    }
}

impl Config {
    /// Serializes the configuration to a string
    pub fn to_string(&self) -> String {
        format!(
            "username={}\ntheme={}\nhigh_fi={}\nnormalization={}\nui_motion={}",
            self.username, self.theme, self.high_fi, self.normalization, self.ui_motion
        )
    }
}

// Custom error for configuration parsing
#[derive(Debug)]
pub struct ConfigParseError {
    message: String,
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigParseError {}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigParseError {
            message: format!("Invalid boolean for {}: {}", key, value),
        }),
    }
}

impl FromStr for Config {
    type Err = ConfigParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Config::default();

        for line in s.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(2, '=').collect();
            if parts.len() != 2 {
                return Err(ConfigParseError {
                    message: format!("Invalid line format: {}", line),
                });
            }

            let key = parts[0].trim();
            let value = parts[1].trim();

            match key {
                "username" => config.username = value.to_string(),
                "theme" => config.theme = value.to_string(),
                "high_fi" => config.high_fi = parse_bool(key, value)?,
                "normalization" => config.normalization = parse_bool(key, value)?,
                "ui_motion" => config.ui_motion = parse_bool(key, value)?,
                _ => {
                    return Err(ConfigParseError {
                        message: format!("Unknown configuration key: {}", key),
                    })
                }
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, "crimson");
        assert!(config.ui_motion);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let serialized = config.to_string();
        let deserialized = Config::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_custom_config() {
        let mut config = Config::default();
        config.username = "TestUser".to_string();
        config.theme = "violet".to_string();
        config.ui_motion = false;

        let serialized = config.to_string();
        let deserialized = Config::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_invalid_lines_are_rejected() {
        assert!(Config::from_str("not a key value line").is_err());
        assert!(Config::from_str("ui_motion=sideways").is_err());
        assert!(Config::from_str("mystery=true").is_err());
    }

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        let config = Config::from_str("# a comment\n\nusername=Echo\n").unwrap();
        assert_eq!(config.username, "Echo");
    }
}
