use std::path::Path;
use thiserror::Error;

/// Invoice files: scanned images or PDFs
pub const INVOICE_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "application/pdf"];

/// Producer logos: raster or vector images, never documents
pub const LOGO_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/svg+xml",
];

#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Acceptance rules applied to a single uploaded file
#[derive(Debug, Clone)]
pub struct FileRules {
    pub max_size: usize,
    pub allowed_mime_types: &'static [&'static str],
}

impl FileRules {
    pub fn invoice(max_size: usize) -> Self {
        Self {
            max_size,
            allowed_mime_types: INVOICE_MIME_TYPES,
        }
    }

    pub fn logo(max_size: usize) -> Self {
        Self {
            max_size,
            allowed_mime_types: LOGO_MIME_TYPES,
        }
    }
}

/// Strips parameters (`; charset=...`) and lowercases a MIME type
pub fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Human-readable size limit: whole megabytes when exact, else the largest
/// unit that keeps the value non-zero
pub fn format_size_limit(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else if bytes >= KIB {
        format!("{:.1}KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Rejection for a file over `max_size`, also used when the body limit
/// cuts the upload off before the file is fully read
pub fn file_too_large(max_size: usize) -> ValidationError {
    ValidationError::new(
        "FILE_TOO_LARGE",
        format!(
            "File too large. Maximum size is {}",
            format_size_limit(max_size)
        ),
    )
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(file_too_large(max_size));
    }
    Ok(())
}

/// Validates MIME type against an allowlist
pub fn validate_mime_type(content_type: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    let normalized = normalize_mime(content_type);

    if allowed.iter().any(|&candidate| candidate == normalized) {
        return Ok(());
    }

    let listed = allowed
        .iter()
        .map(|m| m.rsplit('/').next().unwrap_or(m).to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    Err(ValidationError::new(
        "INVALID_MIME_TYPE",
        format!(
            "Invalid file type '{}'. Allowed types: {}",
            content_type, listed
        ),
    ))
}

/// Rejects empty names and anything that could escape the storage prefix
pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::new(
            "INVALID_FILENAME",
            "Filename cannot be empty",
        ));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
        return Err(ValidationError::new("INVALID_FILENAME", "Invalid filename"));
    }

    Ok(())
}

/// Full validation pipeline for an uploaded file. Size is checked first so
/// oversized files are rejected whatever their declared type.
pub fn validate_upload(
    filename: &str,
    content_type: &str,
    size: usize,
    rules: &FileRules,
) -> Result<(), ValidationError> {
    validate_file_size(size, rules.max_size)?;
    validate_mime_type(content_type, rules.allowed_mime_types)?;
    validate_filename(filename)?;
    Ok(())
}

/// Lowercase extension taken from the filename, falling back to the MIME type
pub fn file_extension(filename: &str, content_type: &str) -> String {
    if let Some(ext) = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
    {
        return ext.to_lowercase();
    }

    match normalize_mime(content_type).as_str() {
        "application/pdf" => "pdf",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
    .to_string()
}
