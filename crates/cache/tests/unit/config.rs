//! # Configuration Tests
//!
//! Defaults, builders, JSON deserialization, validation, and the rule that
//! the budget cannot change while caches are registered.

use std::io::Write;

use pretty_assertions::assert_eq;
use rowswap_core::{CacheConfig, CacheError, Director};
use rstest::rstest;

use crate::common::harness::director;

// ══════════════════════════════════════════════════════════
// 1. Defaults and builders
// ══════════════════════════════════════════════════════════

#[test]
fn defaults_are_two_mib_blocks_and_one_gib_budget() {
    let config = CacheConfig::default();
    assert_eq!(config.block_size_bytes, 2 * 1024 * 1024);
    assert_eq!(config.managed_bytes, 1024 * 1024 * 1024);
    assert_eq!(config.temp_dir, None);
    assert_eq!(config.managed_blocks(), 512);
}

#[test]
fn builders_scale_flag_units() {
    let config = CacheConfig::default()
        .with_block_size_kb(64)
        .with_managed_mb(3)
        .with_temp_dir("/var/tmp");
    assert_eq!(config.block_size_bytes, 64 * 1024);
    assert_eq!(config.managed_bytes, 3 * 1024 * 1024);
    assert_eq!(config.temp_dir.as_deref(), Some(std::path::Path::new("/var/tmp")));
    assert_eq!(config.managed_blocks(), 48);
}

#[rstest]
#[case(1000, 100, 10)]
#[case(1001, 100, 11)]
#[case(1, 4096, 1)]
#[case(4096, 4096, 1)]
fn managed_blocks_rounds_up(#[case] managed: usize, #[case] block: usize, #[case] blocks: usize) {
    let config = CacheConfig {
        block_size_bytes: block,
        managed_bytes: managed,
        temp_dir: None,
    };
    assert_eq!(config.managed_blocks(), blocks);
}

// ══════════════════════════════════════════════════════════
// 2. JSON loading and validation
// ══════════════════════════════════════════════════════════

#[test]
fn json_fills_missing_fields_with_defaults() {
    let config = CacheConfig::from_json(r#"{ "block_size_bytes": 8192 }"#).unwrap();
    assert_eq!(config.block_size_bytes, 8192);
    assert_eq!(config.managed_bytes, CacheConfig::default().managed_bytes);
}

#[test]
fn json_rejects_unknown_fields() {
    let err = CacheConfig::from_json(r#"{ "block_kb": 8 }"#).unwrap_err();
    assert!(matches!(err, CacheError::ConfigParse(_)));
}

#[rstest]
#[case(r#"{ "block_size_bytes": 0 }"#)]
#[case(r#"{ "managed_bytes": 0 }"#)]
fn json_rejects_zero_sizes(#[case] json: &str) {
    let err = CacheConfig::from_json(json).unwrap_err();
    assert!(matches!(err, CacheError::InvalidConfig(_)), "{err}");
    assert!(!err.is_fatal());
}

#[test]
fn config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "block_size_bytes": 4096, "managed_bytes": 65536, "temp_dir": "/tmp" }}"#
    )
    .unwrap();
    let config = CacheConfig::from_file(file.path()).unwrap();
    assert_eq!(config.managed_blocks(), 16);
    assert_eq!(config.temp_dir.as_deref(), Some(std::path::Path::new("/tmp")));
}

#[test]
fn missing_config_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CacheConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CacheError::ConfigRead(_)));
}

#[test]
fn director_rejects_invalid_config() {
    let config = CacheConfig {
        block_size_bytes: 0,
        ..CacheConfig::default()
    };
    assert!(matches!(
        Director::new(config),
        Err(CacheError::InvalidConfig(_))
    ));
}

// ══════════════════════════════════════════════════════════
// 3. Reconfiguration
// ══════════════════════════════════════════════════════════

#[test]
fn reconfiguring_is_locked_while_caches_are_registered() {
    let mut d = director(256, 4);
    let id = d.create_cache(16, 16, &[0]).unwrap();

    let err = d.set_block_size(512).unwrap_err();
    assert!(matches!(err, CacheError::ConfigLocked { registered: 1 }));
    assert!(matches!(
        d.set_allocation(4096),
        Err(CacheError::ConfigLocked { .. })
    ));
    assert_eq!(d.block_size(), 256);

    d.destroy_cache(id).unwrap();
    d.set_block_size(512).unwrap();
    d.set_allocation(4096).unwrap();
    assert_eq!(d.config().block_size_bytes, 512);
    assert_eq!(d.config().managed_bytes, 4096);
    assert_eq!(d.managed_blocks(), 8);
    assert_eq!(d.blocks_available(), 8);
}

#[test]
fn empty_caches_do_not_lock_configuration() {
    let mut d = director(256, 4);
    let empty = d.create_cache(0, 100, &[0]).unwrap();
    assert_eq!(d.registered_caches(), 0);
    d.set_block_size(1024).unwrap();

    // The empty cache picks up the new block size once it is given a real size.
    d.resize(empty, 100, 100, &[0]).unwrap();
    assert_eq!(d.geometry(empty).unwrap().lines_per_block(), 8);
}

#[test]
fn zero_reconfiguration_is_rejected() {
    let mut d = director(256, 4);
    assert!(matches!(
        d.set_allocation(0),
        Err(CacheError::InvalidConfig(_))
    ));
    assert_eq!(d.managed_blocks(), 4);
}
