use std::path::Path;
use uuid::Uuid;

use crate::models::uploads::RepositoryUploadMetadata;

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // "." and ".." would walk the path
    if sanitized.chars().all(|c| c == '.') {
        return sanitized.replace('.', "_");
    }
    sanitized
}

/// A repository path segment taken from user input. Slashes would add
/// directories and dot-only segments would be dropped from the request URL,
/// so both are replaced; everything else is kept as typed.
fn path_segment(value: &str) -> String {
    let segment = value.trim().replace(['/', '\\'], "-");
    if !segment.is_empty() && segment.chars().all(|c| c == '.') {
        return segment.replace('.', "_");
    }
    segment
}

/// `papers/grade-{grade}/{subject}/{year}/{examType}/{fileName}`
pub fn repository_path(metadata: &RepositoryUploadMetadata, file_name: &str) -> String {
    format!(
        "papers/grade-{}/{}/{}/{}/{}",
        path_segment(&metadata.grade),
        path_segment(&metadata.subject),
        path_segment(&metadata.year),
        path_segment(&metadata.exam_type),
        sanitize_file_name(file_name)
    )
}

/// Unique object name for a stored upload, keeping the original extension.
pub fn object_name(prefix: &str, original_file_name: &str) -> String {
    let extension = Path::new(original_file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(sanitize_file_name)
        .filter(|ext| !ext.is_empty());

    let stem = format!("{}_{}", Uuid::new_v4(), chrono::Utc::now().timestamp());
    match extension {
        Some(ext) => format!("{}/{}.{}", prefix, stem, ext.to_lowercase()),
        None => format!("{}/{}", prefix, stem),
    }
}
