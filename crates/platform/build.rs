//! Turns the `K60_CPU_REV` build input into the `k60_cpu_rev` cfg.
//!
//! The reference-clock register layout is chosen here, at build time. An
//! unknown revision stops the build instead of producing firmware that writes
//! the wrong register.

use std::env;

const DEFAULT_CPU_REV: &str = "2";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=K60_CPU_REV");
    println!("cargo:rustc-check-cfg=cfg(k60_cpu_rev, values(\"1\", \"2\"))");

    let rev = env::var("K60_CPU_REV").unwrap_or_else(|_| DEFAULT_CPU_REV.to_owned());
    match rev.trim() {
        "1" | "2" => println!("cargo:rustc-cfg=k60_cpu_rev=\"{}\"", rev.trim()),
        other => {
            eprintln!("error: unknown K60 CPU revision `{other}` (expected 1 or 2)");
            std::process::exit(1);
        }
    }
}
