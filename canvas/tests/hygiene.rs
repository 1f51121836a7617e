//! Hygiene: source-tree checks for the canvas crate.
//!
//! Scans production sources under `canvas/src/` for patterns the crate does
//! not allow. Every budget is zero; fix the offender instead of raising one.
//! Test files (`*_test.rs`) are exempt.

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

struct Budget {
    pattern: &'static str,
    max: usize,
    hint: &'static str,
}

const BUDGETS: &[Budget] = &[
    // Panics crash the wasm instance and take the whiteboard with it.
    Budget { pattern: ".unwrap()", max: 0, hint: "propagate or match instead" },
    Budget { pattern: ".expect(", max: 0, hint: "propagate or match instead" },
    Budget { pattern: "panic!(", max: 0, hint: "return an error or an empty action list" },
    Budget { pattern: "unreachable!(", max: 0, hint: "make the match exhaustive" },
    Budget { pattern: "todo!(", max: 0, hint: "finish the stub" },
    Budget { pattern: "unimplemented!(", max: 0, hint: "finish the stub" },
    // Silent loss.
    Budget { pattern: "let _ =", max: 0, hint: "inspect the result or log it" },
    Budget { pattern: ".ok()", max: 0, hint: "inspect the error" },
    // Output goes through `log`, which the host routes to the console.
    Budget { pattern: "println!(", max: 0, hint: "use log::debug!" },
    Budget { pattern: "eprintln!(", max: 0, hint: "use log::warn!" },
    Budget { pattern: "dbg!(", max: 0, hint: "remove debugging output" },
    Budget { pattern: "#[allow(dead_code)]", max: 0, hint: "delete the dead code" },
];

/// Modules allowed to name browser types. Everything else must stay testable
/// natively.
const BROWSER_MODULES: &[&str] = &["bindings.rs", "engine.rs", "render.rs", "lib.rs"];

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn report(found: &[(String, usize)]) -> String {
    found
        .iter()
        .map(|(path, count)| format!("  {path}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn sources_are_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("engine.rs")), "run from the canvas crate root");
}

#[test]
fn pattern_budgets() {
    let files = source_files();
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let found = hits(&files, budget.pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > budget.max {
            failures.push(format!(
                "`{}` found {count} times (max {}; {}):\n{}",
                budget.pattern,
                budget.max,
                budget.hint,
                report(&found)
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn browser_types_stay_at_the_edge() {
    let files = source_files();
    let offenders: Vec<(String, usize)> = hits(&files, "web_sys")
        .into_iter()
        .filter(|(path, _)| !BROWSER_MODULES.iter().any(|m| path.ends_with(m)))
        .collect();
    assert!(offenders.is_empty(), "web_sys used outside the browser edge:\n{}", report(&offenders));
}

#[test]
fn dev_only_crates_stay_out_of_sources() {
    let files = source_files();
    let found = hits(&files, "serde_json");
    assert!(found.is_empty(), "serde_json is a dev-dependency:\n{}", report(&found));
}

#[test]
fn cdylib_exports_a_class() {
    let files = source_files();
    let exported = hits(&files, "#[wasm_bindgen(constructor)]");
    assert!(
        exported.iter().any(|(path, _)| path.ends_with("bindings.rs")),
        "the wasm build must export a constructible class"
    );
}
