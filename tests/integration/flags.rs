// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Flag registry: config files and hot reload.

use super::common::wait_until;
use anyhow::Result;
use ccbase::define_flag;
use ccbase::flags::{FlagError, FlagRegistry, CONFIG};
use std::fs::{self, File};
use std::time::{Duration, SystemTime};

define_flag!(IT_STATIC: i32 = 0, "it_static", "set once from config");
define_flag!(IT_HOT: u64 = 0, "it_hot", "reloadable from config");
define_flag!(IT_NAME: String = String::new(), "it_name", "a string");
define_flag!(IT_RATIO: f64 = 0.0, "it_ratio", "a double");

define_flag!(INIT_PORT: u32 = 0, "init_port", "port");

fn registry() -> Result<FlagRegistry> {
    let registry = FlagRegistry::new()?;
    registry.register(&*IT_STATIC)?;
    registry.register(&*IT_HOT)?;
    registry.register(&*IT_NAME)?;
    registry.register(&*IT_RATIO)?;
    Ok(registry)
}

fn touch(path: &std::path::Path, when: SystemTime) -> Result<()> {
    File::options().write(true).open(path)?.set_modified(when)?;
    Ok(())
}

#[test]
fn test_config_file_values() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("app.conf");
    fs::write(
        &path,
        "# service config\n\
         it_static = 10k      # ten kibi\n\
         it_name = \"/var/\\\n   log\"\n\
         // ratio below\n\
         \tit_ratio\t= 0.25\n",
    )?;

    let registry = registry()?;
    registry.parse_config(&path)?;
    assert_eq!(IT_STATIC.get(), 10240);
    assert_eq!(IT_NAME.get(), "/var/log");
    assert_eq!(IT_RATIO.get(), 0.25);
    Ok(())
}

#[test]
fn test_config_errors_carry_location() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.conf");
    let registry = registry()?;

    fs::write(&path, "it_name = ok\nmissing_equals\n")?;
    let err = registry.parse_config(&path).unwrap_err();
    assert!(matches!(err, FlagError::InvalidConfig { line: 2, .. }));

    fs::write(&path, "\n\nnot_a_flag = 1\n")?;
    let err = registry.parse_config(&path).unwrap_err();
    assert!(matches!(err, FlagError::Config { line: 3, .. }));
    assert!(err.to_string().starts_with("flag not defined: not_a_flag, at "));

    assert!(matches!(
        registry.parse_config(dir.path().join("absent.conf")),
        Err(FlagError::Io { .. })
    ));
    Ok(())
}

#[test]
fn test_hot_reload_applies_only_bang_lines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("hot.conf");
    fs::write(&path, "it_static = 1\n!it_hot = 2\n")?;

    let mut registry = registry()?;
    registry.parse_config(&path)?;
    assert_eq!((IT_STATIC.get(), IT_HOT.get()), (1, 2));

    registry.watch_config(&path, Duration::from_millis(20))?;
    fs::write(&path, "it_static = 100\n!it_hot = 200\n!bogus = 1\n")?;
    touch(&path, SystemTime::now() + Duration::from_secs(5))?;

    assert!(wait_until(|| IT_HOT.get() == 200));
    assert_eq!(IT_STATIC.get(), 1);
    registry.stop_watching();
    assert!(!registry.is_watching());
    Ok(())
}

#[test]
fn test_init_reads_config_flag() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("init.conf");
    fs::write(&path, "init_port = 0x1f90\n")?;

    let mut registry = FlagRegistry::new()?;
    registry.register(&*INIT_PORT)?;
    let config_arg = format!("--config={}", path.display());
    let positional = registry.init(["run", config_arg.as_str()])?;
    CONFIG.reset();

    assert_eq!(positional, ["run"]);
    assert_eq!(INIT_PORT.get(), 8080);
    assert!(registry.is_watching());
    Ok(())
}
