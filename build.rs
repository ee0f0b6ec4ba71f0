// SPDX-License-Identifier: Apache-2.0 OR MIT
fn main() {
    // The process tests (spawning ccdemo and checking how it dies) are
    // compiled out under `cargo tarpaulin`, which sets `--cfg tarpaulin`.
    // Declare the cfg so regular builds do not warn about it.
    println!("cargo:rustc-check-cfg=cfg(tarpaulin)");
}
