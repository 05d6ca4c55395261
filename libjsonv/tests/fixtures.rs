//! Test harness for the JSONV parser against fixture files.
//!
//! Every `test/valid/*.jsonv` must parse; when a sibling `.json` file exists
//! it is parsed in strict JSON mode and the two values must match.
//! Every `test/invalid/*.jsonv` must fail; when a sibling `.error` file
//! exists the first error must render exactly as its contents.

use std::fs;
use std::path::{Path, PathBuf};

use libjsonv::{encode, parse, parse_with_options, Format, Mode, ParseOptions, Value};

/// Compare two Values, treating NaN as equal to NaN
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && values_equal(va, vb))
        }
        _ => a == b,
    }
}

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

fn fixtures(subdir: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join("*.jsonv");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Run a single valid fixture.
fn run_valid(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", name, e))?;

    let value = parse(&content).map_err(|e| format!("{}: Unexpected parse error: {}", name, e))?;

    let expected_path = path.with_extension("json");
    let Ok(expected_text) = fs::read_to_string(&expected_path) else {
        println!("  {} => {:?} (no expected output)", name, value);
        return Ok(());
    };
    let expected = parse_with_options(&expected_text, &ParseOptions::with_mode(Mode::StrictJson))
        .map_err(|e| format!("{}: Expected output is not strict JSON: {}", name, e))?
        .value;

    if !values_equal(&value, &expected) {
        return Err(format!(
            "{}: Output mismatch\n    expected: {}\n    actual:   {}",
            name,
            encode(&expected, Format::Json),
            encode(&value, Format::Json)
        ));
    }

    // The JSONV rendering must read back as the same value.
    let rendered = encode(&value, Format::Jsonv);
    let reparsed =
        parse(&rendered).map_err(|e| format!("{}: Rendering does not reparse: {}", name, e))?;
    if !values_equal(&value, &reparsed) {
        return Err(format!("{}: Rendering changed the value:\n{}", name, rendered));
    }

    println!("  {} => ok", name);
    Ok(())
}

/// Run a single invalid fixture.
fn run_invalid(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", name, e))?;

    let error = match parse(&content) {
        Ok(value) => {
            return Err(format!(
                "{}: Expected parse error, but got success: {:?}",
                name, value
            ))
        }
        Err(error) => error.to_string(),
    };

    match fs::read_to_string(path.with_extension("error")) {
        Ok(expected) if expected.trim() == error => {
            println!("  {} => error (as expected)", name);
            Ok(())
        }
        Ok(expected) => Err(format!(
            "{}: Error mismatch\n    expected: {}\n    actual:   {}",
            name,
            expected.trim(),
            error
        )),
        Err(_) => {
            println!("  {} => error: {} (no .error file to compare)", name, error);
            Ok(())
        }
    }
}

fn run_all(subdir: &str, run: fn(&Path) -> Result<(), String>) {
    let files = fixtures(subdir);
    assert!(!files.is_empty(), "no fixtures found in test/{}", subdir);

    println!("\nRunning {} {} fixtures:", files.len(), subdir);
    let errors: Vec<String> = files.iter().filter_map(|file| run(file).err()).collect();
    println!(
        "\nResults: {} passed, {} failed",
        files.len() - errors.len(),
        errors.len()
    );

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }
    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), subdir);
}

#[test]
fn test_all_valid_fixtures() {
    run_all("valid", run_valid);
}

#[test]
fn test_all_invalid_fixtures() {
    run_all("invalid", run_invalid);
}
