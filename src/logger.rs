use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use thiserror::Error;

pub static LOG_PATTERN: &str = "[{d(%Y-%m-%d %H:%M:%S %Z)(utc)}] {m}{n}";

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid logger configuration: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),

    #[error("logger already initialized: {0}")]
    Init(#[from] log::SetLoggerError),
}

/// Stdout gets Info (Debug with `debug`); the log file, when given, gets
/// everything.
pub fn create_logger_config(log_path: Option<&str>, debug: bool) -> Result<Config, LoggerError> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .target(Target::Stdout)
        .build();

    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(level)))
            .build("stdout", Box::new(stdout)),
    );
    let mut root = Root::builder().appender("stdout");

    match log_path {
        Some(path) => {
            let logfile = FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                .build(path)
                .map_err(|source| LoggerError::LogFile {
                    path: path.to_string(),
                    source,
                })?;
            builder = builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
            root = root.appender("logfile");
            Ok(builder.build(root.build(LevelFilter::Trace))?)
        }
        None => Ok(builder.build(root.build(level))?),
    }
}

/// Console-only logger used until the config file has been read. The returned
/// handle swaps in the final configuration.
pub fn create_logger(debug: bool) -> Result<log4rs::Handle, LoggerError> {
    let config = create_logger_config(None, debug)?;
    Ok(log4rs::init_config(config)?)
}

#[test]
fn test_console_config_builds() {
    assert!(create_logger_config(None, true).is_ok());
}

#[test]
fn test_bad_log_path() {
    let err = create_logger_config(Some("/nonexistent-dir/\0/server.log"), false).unwrap_err();
    assert!(matches!(err, LoggerError::LogFile { .. }));
}
