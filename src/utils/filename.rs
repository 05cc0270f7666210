//! Safe filename generation utilities

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn invalid_chars() -> &'static Regex {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    INVALID.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid filename regex"))
}

/// Convert an identifier to a safe filename stem by replacing invalid characters
pub fn to_safe_stem(name: &str) -> String {
    let mut safe = invalid_chars().replace_all(name, "_").to_string();

    // Remove leading/trailing dots and spaces
    safe = safe
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    // Limit length (Windows has 255 char limit, be conservative)
    if safe.len() > 200 {
        let mut cut = 200;
        while !safe.is_char_boundary(cut) {
            cut -= 1;
        }
        safe.truncate(cut);
        safe = safe.trim_end().to_string();
    }

    if safe.is_empty() {
        safe = "video".to_string();
    }
    safe
}

/// Output file name: `<video id>_<unix timestamp>.<ext>`
pub fn output_file_name(video_id: &str, timestamp: i64, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        to_safe_stem(video_id),
        timestamp,
        extension.trim_start_matches('.')
    )
}

/// Generate a unique filename by appending a number if the file already exists
pub async fn generate_unique_filename(base_path: &Path, filename: &str) -> std::io::Result<String> {
    let mut counter = 1;
    let mut final_filename = filename.to_string();

    while tokio::fs::try_exists(base_path.join(&final_filename)).await? {
        let path = Path::new(filename);
        let stem = path.file_stem().unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        final_filename = format!("{} ({}){}", stem.to_string_lossy(), counter, extension);
        counter += 1;

        // Prevent infinite loop
        if counter > 10000 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "Too many files with similar names",
            ));
        }
    }

    Ok(final_filename)
}
