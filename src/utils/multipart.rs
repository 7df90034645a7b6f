use crate::constants::limits::MAX_UPLOAD_FILE_BYTES;
use crate::constants::uploads::ALLOWED_FILE_TYPES;
use crate::errors::GatewayError;
use bytes::Bytes;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MultipartSummary {
    pub files: usize,
    pub fields: usize,
    pub file_bytes: usize,
}

pub fn is_multipart(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn malformed(err: multer::Error) -> GatewayError {
    GatewayError::invalid_params(format!("Malformed multipart body: {}", err))
}

/// Walks every part of a buffered multipart body; file parts must have an allowed
/// type and stay under the per-file size limit. Text fields are not inspected.
pub async fn validate_multipart(
    content_type: &str,
    body: Bytes,
) -> Result<MultipartSummary, GatewayError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| GatewayError::invalid_params("Multipart content type is missing a boundary"))?;
    let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut summary = MultipartSummary::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            summary.fields += 1;
            continue;
        };
        let file_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_ascii_lowercase())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !ALLOWED_FILE_TYPES.contains(&file_type.as_str()) {
            return Err(GatewayError::invalid_params("Invalid file type")
                .with_hint(format!(
                    "Allowed file types: {}",
                    ALLOWED_FILE_TYPES.join(", ")
                ))
                .with_details(serde_json::json!({
                    "fileName": file_name,
                    "contentType": file_type,
                })));
        }
        let data = field.bytes().await.map_err(malformed)?;
        if data.len() > MAX_UPLOAD_FILE_BYTES {
            return Err(GatewayError::invalid_params("File too large")
                .with_hint(format!(
                    "Files must not exceed {} bytes",
                    MAX_UPLOAD_FILE_BYTES
                ))
                .with_details(serde_json::json!({
                    "fileName": file_name,
                    "size": data.len(),
                })));
        }
        summary.files += 1;
        summary.file_bytes += data.len();
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "X-BOUNDARY";

    fn body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Bytes {
        let mut out = Vec::new();
        for (name, file, data) in parts {
            out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file {
                Some((file_name, ct)) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            name, file_name, ct
                        )
                        .as_bytes(),
                    );
                }
                None => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                }
            }
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Bytes::from(out)
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    #[tokio::test]
    async fn accepts_images_and_text_fields() {
        let payload = body(&[
            ("file", Some(("test.png", "image/png")), b"mock image content"),
            ("prompt", None, b"Test prompt"),
        ]);
        let summary = validate_multipart(&content_type(), payload).await.unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.fields, 1);
    }

    #[tokio::test]
    async fn rejects_disallowed_type() {
        let payload = body(&[("file", Some(("test.txt", "text/plain")), b"mock content")]);
        let err = validate_multipart(&content_type(), payload).await.unwrap_err();
        assert_eq!(err.message, "Invalid file type");
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let big = vec![b'a'; MAX_UPLOAD_FILE_BYTES + 1];
        let payload = body(&[("file", Some(("large.pdf", "application/pdf")), &big)]);
        let err = validate_multipart(&content_type(), payload).await.unwrap_err();
        assert_eq!(err.message, "File too large");
    }

    #[test]
    fn detects_multipart_content_type() {
        assert!(is_multipart(Some("Multipart/Form-Data; boundary=abc")));
        assert!(!is_multipart(Some("application/json")));
        assert!(!is_multipart(None));
    }
}
