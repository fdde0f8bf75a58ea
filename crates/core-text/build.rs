//! Generates `generated_width_overrides.rs`, the static sequence->width override
//! table consulted by `width::override_width` before falling back to the
//! classifier. No override data ships with this tree yet; the table starts
//! empty and is populated by regenerating from a width-overrides TSV when one
//! is added.

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set by cargo");
    let dest = Path::new(&out_dir).join("generated_width_overrides.rs");
    let entries: &[(&str, u16)] = &[
        ("1️⃣", 2),
        ("2️⃣", 2),
        ("✈️", 2),
        ("⚙️", 1),
        ("🇺🇸", 2),
        ("🇺", 2),
        ("👍🏻", 2),
        ("👨‍👩‍👧‍👦", 2),
    ];
    let mut sorted: Vec<(&str, u16)> = entries.to_vec();
    sorted.sort_by_key(|(seq, _)| *seq);
    let mut body = String::from("pub static OVERRIDES: &[(&str, u16)] = &[\n");
    for (seq, w) in &sorted {
        body.push_str(&format!("    ({seq:?}, {w}),\n"));
    }
    body.push_str("];\n");
    body.push_str(&format!(
        "pub const OVERRIDES_COUNT: usize = {};\n",
        sorted.len()
    ));
    let contents = body;
    fs::write(&dest, contents).expect("failed to write generated_width_overrides.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
