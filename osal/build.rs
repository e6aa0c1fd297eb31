// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

// Pre-build code for the osal crate.

// This builds a program that is run on the compilation host before the code is compiled.  It
// outputs the configuration settings that affect the compilation, and generates the `kconfig`
// module.

fn main() -> anyhow::Result<()> {
    osal_build::export_bool_kconfig()?;
    osal_build::build_kconfig_mod()?;
    Ok(())
}
