use nonoto_core::config::{AppConfig, EditorMode, CONFIG_FILE};
use nonoto_core::controls::{BpmControl, ControlError, GranularitySelect};
use nonoto_core::resources::ResourceLocation;
use nonoto_core::transport::Transport;

#[test]
fn bpm_is_folded_into_range_and_pushed_to_the_transport() {
    let mut transport = Transport::new(100.0);
    let mut bpm = BpmControl::new((60.0, 180.0), 100.0).unwrap();

    assert_eq!(bpm.set_value(500.0, &mut transport), Some(125.0));
    assert_eq!(transport.bpm(), 125.0);

    assert_eq!(bpm.set_value(35.0, &mut transport), Some(70.0));
    assert_eq!(transport.bpm(), 70.0);

    // same tempo again: no change to report
    assert_eq!(bpm.set_value(70.0, &mut transport), None);
    assert_eq!(bpm.set_value(f64::NAN, &mut transport), None);
    assert_eq!(transport.bpm(), 70.0);
}

#[test]
fn bpm_range_must_span_an_octave() {
    assert!(matches!(
        BpmControl::new((100.0, 150.0), 120.0),
        Err(ControlError::BpmRangeTooNarrow { .. })
    ));
}

#[test]
fn granularity_select_cycles_in_numeric_order() {
    let base = ResourceLocation::Path("/static/icons".into());
    let mut select = GranularitySelect::new(&[8, 1, 4, 2], base).unwrap();
    assert_eq!(select.value_quarters(), 1);
    assert_eq!(select.select_next(), 2);
    assert_eq!(select.step(true), 4);
    assert_eq!(select.step(true), 8);
    assert_eq!(select.step(true), 8);
    assert_eq!(select.select_next(), 1);
}

#[test]
fn config_round_trips_through_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join(CONFIG_FILE);

    let mut config = AppConfig::default();
    config.mode = EditorMode::Spectrogram;
    config.server_url = "http://gpu-box:8080".to_string();
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path);
    assert_eq!(loaded, config);
}

#[test]
fn config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let missing = AppConfig::load(&dir.path().join("missing.yaml"));
    assert_eq!(missing, AppConfig::default());

    let invalid = dir.path().join("invalid.yaml");
    std::fs::write(&invalid, "bpm: [not, a, mapping").unwrap();
    let loaded = AppConfig::load(&invalid);
    assert_eq!(loaded, AppConfig::default());
}
