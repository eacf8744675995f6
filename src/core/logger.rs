use flexi_logger::{
    filter::{self, LogLineFilter},
    Age, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};
use log::LevelFilter;

use super::configuration::Configuration;

const DEFAULT_RETENTION: usize = 31;

/// Drops the chatter of the HTTP stack and of the metrics endpoint.
pub struct IgnoreReqwest;

impl LogLineFilter for IgnoreReqwest {
    fn write(
        &self,
        now: &mut flexi_logger::DeferredNow,
        record: &log::Record,
        log_line_writer: &dyn filter::LogLineWriter,
    ) -> std::io::Result<()> {
        let path = record.module_path().unwrap_or_default();

        if is_ignored(path) {
            return Ok(());
        }

        log_line_writer.write(now, record)
    }
}

fn is_ignored(module_path: &str) -> bool {
    ["reqwest", "hyper", "prometheus_exporter", "tiny_http"]
        .iter()
        .any(|p| module_path.starts_with(p))
}

/// Level comes from the command line first, then from `log.level`.
pub fn log_level(conf: &Configuration, verbosity: Option<LevelFilter>) -> String {
    verbosity
        .map(|v| v.to_string())
        .or_else(|| conf.log.level.clone())
        .unwrap_or_else(|| "info".to_string())
        .to_lowercase()
}

pub fn init(
    conf: &Configuration,
    verbosity: Option<LevelFilter>,
) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(log_level(conf, verbosity))?
        .filter(Box::new(IgnoreReqwest))
        .log_to_file(
            FileSpec::default()
                .directory(conf.data_directory())
                .basename(env!("CARGO_PKG_NAME")),
        )
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(conf.log.retention.unwrap_or(DEFAULT_RETENTION)),
        )
        .duplicate_to_stdout(Duplicate::All)
        .write_mode(WriteMode::Async)
        .start()
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use crate::core::configuration::{Configuration, LogConfiguration};

    use super::{is_ignored, log_level};

    #[test]
    fn verbosity_overrides_configured_level() {
        let conf = Configuration {
            log: LogConfiguration {
                level: Some("Warn".to_string()),
                retention: None,
            },
            ..Default::default()
        };

        assert_eq!("warn", log_level(&conf, None));
        assert_eq!("debug", log_level(&conf, Some(LevelFilter::Debug)));
        assert_eq!("info", log_level(&Configuration::default(), None));
    }

    #[test]
    fn http_stack_is_ignored() {
        assert!(is_ignored("reqwest::connect"));
        assert!(is_ignored("hyper_util::client"));
        assert!(!is_ignored("peplink_wan_switch::switches::relay"));
    }
}
