// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Pre-build code for the osal crate.

// This makes the values from a Kconfig style configuration available as conditional compilation
// and as constants.  The crate being built provides a `defconfig` with every known setting, and
// the `DOTCONFIG` environment variable may name a second file whose entries override those
// defaults.  Note that the cfg flags only apply to the crate whose build script calls
// `export_bool_kconfig`; applications wanting the same flags need to call it from their own
// build.rs.

use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

/// The value of a single configuration entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// `CONFIG_FOO=y`.
    Bool(bool),
    /// A hex value, assumed unsigned.
    Hex(String),
    /// A decimal value, assumed signed.
    Int(String),
    /// A quoted string, quotes included.
    Str(String),
}

/// A merged configuration, keyed by the full `CONFIG_` name.
#[derive(Debug, Default)]
pub struct Config {
    entries: BTreeMap<String, Value>,
}

impl Config {
    /// Parse configuration lines, overriding any entry already present.
    pub fn merge<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let config_y = Regex::new(r"^(CONFIG_[A-Za-z0-9_]+)=y$")?;
        let config_n = Regex::new(r"^# (CONFIG_[A-Za-z0-9_]+) is not set$")?;
        // The assumption is that hex values are unsigned, and decimal are signed.
        let config_hex = Regex::new(r"^(CONFIG_[A-Za-z0-9_]+)=(0x[0-9a-fA-F]+)$")?;
        let config_int = Regex::new(r"^(CONFIG_[A-Za-z0-9_]+)=(-?[0-9]+)$")?;
        let config_str = Regex::new(r#"^(CONFIG_[A-Za-z0-9_]+)=(".*")$"#)?;

        for line in reader.lines() {
            let line = line.context("reading line from config")?;
            let line = line.trim();
            if let Some(caps) = config_y.captures(line) {
                self.entries.insert(caps[1].to_string(), Value::Bool(true));
            } else if let Some(caps) = config_n.captures(line) {
                self.entries.insert(caps[1].to_string(), Value::Bool(false));
            } else if let Some(caps) = config_hex.captures(line) {
                self.entries.insert(caps[1].to_string(), Value::Hex(caps[2].to_string()));
            } else if let Some(caps) = config_int.captures(line) {
                self.entries.insert(caps[1].to_string(), Value::Int(caps[2].to_string()));
            } else if let Some(caps) = config_str.captures(line) {
                self.entries.insert(caps[1].to_string(), Value::Str(caps[2].to_string()));
            }
        }
        Ok(())
    }

    /// Look up a single entry.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Names of all boolean entries that are enabled.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(name, value)| match value {
            Value::Bool(true) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Write the `kconfig` module source for all of the non-boolean entries.
    pub fn write_mod<W: Write>(&self, out: &mut W) -> Result<()> {
        for (name, value) in &self.entries {
            match value {
                Value::Bool(_) => continue,
                Value::Hex(v) => {
                    writeln!(out, "#[allow(dead_code)]")?;
                    writeln!(out, "pub const {}: usize = {};", name, v)?;
                }
                Value::Int(v) => {
                    writeln!(out, "#[allow(dead_code)]")?;
                    writeln!(out, "pub const {}: isize = {};", name, v)?;
                }
                Value::Str(v) => {
                    writeln!(out, "#[allow(dead_code)]")?;
                    writeln!(out, "pub const {}: &'static str = {};", name, v)?;
                }
            }
        }
        Ok(())
    }
}

/// The files making up the configuration, in the order they are applied.
fn config_files() -> Result<Vec<PathBuf>> {
    let manifest = env::var("CARGO_MANIFEST_DIR").context("CARGO_MANIFEST_DIR must be set")?;
    let mut files = vec![Path::new(&manifest).join("defconfig")];

    println!("cargo:rerun-if-env-changed=DOTCONFIG");
    if let Ok(dotconfig) = env::var("DOTCONFIG") {
        files.push(PathBuf::from(dotconfig));
    }
    Ok(files)
}

/// Load the defconfig of the crate being built, overlaid with `DOTCONFIG` if that is set.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();
    for path in config_files()? {
        // Ensure the build script is rerun when any of the configs change.
        println!("cargo:rerun-if-changed={}", path.display());
        let file = File::open(&path)
            .with_context(|| format!("Unable to open config {}", path.display()))?;
        config.merge(BufReader::new(file))?;
    }
    Ok(config)
}

/// Export boolean Kconfig entries.  This must happen in any crate that wishes to access the
/// configuration settings.
pub fn export_bool_kconfig() -> Result<()> {
    let config = load_config()?;
    for name in config.enabled() {
        println!("cargo:rustc-cfg={}", name);
    }
    Ok(())
}

/// Capture numeric and string kconfig values in a 'kconfig' module, written to
/// `$OUT_DIR/kconfig.rs`.
pub fn build_kconfig_mod() -> Result<()> {
    let config = load_config()?;
    let outdir = env::var("OUT_DIR").context("OUT_DIR must be set")?;
    let gen_path = Path::new(&outdir).join("kconfig.rs");

    let mut f = File::create(&gen_path)
        .with_context(|| format!("Unable to create {}", gen_path.display()))?;
    config.write_mod(&mut f)
}
