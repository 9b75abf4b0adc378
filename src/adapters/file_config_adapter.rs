//! INI file configuration adapter.

use crate::domain::error::MomentraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
    source: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MomentraderError> {
        let source = path.as_ref().display().to_string();
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| MomentraderError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { config, source })
    }

    pub fn from_string(content: &str) -> Result<Self, MomentraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| MomentraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self {
            config,
            source: "<string>".to_string(),
        })
    }

    /// Where the configuration was read from, for messages.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[backtest]
data_dir = data/stock_data
codes = SPY,XLK,XLF

[strategy]
momentum_window = 14
long_percentile = 0.38

[sweep]
percentile_steps = 16
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("backtest", "data_dir"),
            Some("data/stock_data".to_string())
        );
        assert_eq!(adapter.get_int("strategy", "momentum_window", 0), 14);
        assert_eq!(adapter.get_double("strategy", "long_percentile", 0.0), 0.38);
        assert_eq!(adapter.get_int("sweep", "percentile_steps", 0), 16);
    }

    #[test]
    fn get_string_returns_none_for_missing_or_blank_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nbenchmark =\ninitial_capital = 100\n")
                .unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("backtest", "benchmark"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_falls_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nnum_stocks = abc\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "num_stocks", 16), 16);
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
    }

    #[test]
    fn get_double_falls_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = lots\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "initial_capital", 99.9), 99.9);
        assert_eq!(adapter.get_double("backtest", "missing", 1.5), 1.5);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy]\na = true\nb = yes\nc = 1\nd = off\ne = No\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("strategy", "a", false));
        assert!(adapter.get_bool("strategy", "b", false));
        assert!(adapter.get_bool("strategy", "c", false));
        assert!(!adapter.get_bool("strategy", "d", true));
        assert!(!adapter.get_bool("strategy", "e", true));
        assert!(adapter.get_bool("strategy", "f", true));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[strategy]\nregime_code = SPY\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("strategy", "regime_code"),
            Some("SPY".to_string())
        );
        assert_eq!(adapter.source(), file.path().display().to_string());
    }

    #[test]
    fn from_file_missing_file_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(
            result,
            Err(MomentraderError::ConfigParse { file, .. }) if file.contains("config.ini")
        ));
    }
}
