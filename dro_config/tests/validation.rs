use dro_config::{CounterKind, load_toml};
use rstest::rstest;

const MINIMAL: &str = r#"
[store]
path = "dro_nvm.bin"
"#;

#[test]
fn minimal_config_uses_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("minimal config should pass");
    assert_eq!(cfg.device.name, "BlueDRO");
    assert_eq!(cfg.counter.kind, CounterKind::Simulated);
    assert_eq!(cfg.calibration.numerator, 1);
    assert_eq!(cfg.calibration.denominator, 1);
    assert!(cfg.calibration.load_from_store);
    assert_eq!(cfg.store.size, 256);
    assert_eq!(cfg.runner.sample_rate_hz, 200);
}

#[test]
fn full_config_parses() {
    let toml = r#"
[device]
name = "Lathe X"

[counter]
kind = "ls7366"
sim_step = -3
sim_start = 100

[calibration]
numerator = 5
denominator = 127
load_from_store = false

[store]
path = "/var/lib/dro/nvm.bin"
size = 64

[runner]
sample_rate_hz = 500
queue_capacity = 16

[logging]
file = "dro.log"
level = "debug"
rotation = "daily"

[hardware]
spi_bus = 1
slave_select = 2
spi_clock_hz = 500000
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.counter.kind, CounterKind::Ls7366);
    assert_eq!(cfg.counter.sim_step, -3);
    assert_eq!(cfg.calibration.denominator, 127);
    assert_eq!(cfg.hardware.slave_select, 2);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[test]
fn missing_store_section_fails_to_parse() {
    assert!(load_toml("[runner]\nsample_rate_hz = 10\n").is_err());
}

#[test]
fn negative_numerator_fails_to_parse() {
    let toml = format!("{MINIMAL}\n[calibration]\nnumerator = -1\n");
    assert!(load_toml(&toml).is_err());
}

#[rstest]
#[case("[calibration]\nnumerator = 0\n", "calibration.numerator must be > 0")]
#[case("[calibration]\ndenominator = 0\n", "calibration.denominator must be > 0")]
#[case("[runner]\nsample_rate_hz = 0\n", "runner.sample_rate_hz must be > 0")]
#[case("[runner]\nqueue_capacity = 0\n", "runner.queue_capacity must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
#[case("[hardware]\nspi_clock_hz = 0\n", "hardware.spi_clock_hz must be > 0")]
fn rejects_invalid_values(#[case] extra: &str, #[case] expected: &str) {
    let toml = format!("{MINIMAL}\n{extra}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(expected),
        "got '{err}', want '{expected}'"
    );
}

#[rstest]
#[case(4)]
#[case(100_000)]
fn rejects_store_size_out_of_range(#[case] size: usize) {
    let toml = format!("[store]\npath = \"nvm.bin\"\nsize = {size}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("size should be rejected");
    assert!(format!("{err}").contains("store.size"));
}

#[test]
fn rejects_blank_store_path() {
    let cfg = load_toml("[store]\npath = \"  \"\n").expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn shipped_sample_config_is_valid() {
    let cfg = load_toml(include_str!("../../etc/dro_config.toml")).expect("parse sample");
    cfg.validate().expect("sample config should validate");
    assert_eq!(cfg.store.path, "dro_nvm.bin");
}
