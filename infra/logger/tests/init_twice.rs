use herald_logger::{LogSettings, Logger, LoggerError};

#[test]
fn init_twice_returns_subscriber_error() {
    let _logger = Logger::init("integration-init-twice", &LogSettings::default())
        .expect("first init should succeed");

    let err = Logger::init("integration-init-twice-second", &LogSettings::default())
        .expect_err("second init should fail");

    assert!(
        matches!(err, LoggerError::Subscriber { .. }),
        "expected subscriber error for second init"
    );
}
