//! `multipart/form-data` encoding of a [`GenerationRequest`].
//!
//! The body is assembled by hand so the part order is fixed and the bytes are
//! reproducible apart from the boundary token.

use crate::generation::request::GenerationRequest;
use uuid::Uuid;

const IMAGE_FIELD: &str = "image";
const IMAGE_FILENAME: &str = "image.jpg";
const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
const CRLF: &[u8] = b"\r\n";

/// An encoded request body with its framing metadata.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Token separating the parts.
    pub boundary: String,
    /// Complete request body.
    pub body: Vec<u8>,
    /// Value for the `Content-Type` header, embedding `boundary`.
    pub content_type: String,
}

impl EncodedPayload {
    /// Size of the body in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Serializes generation requests into multipart bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartEncoder;

impl MultipartEncoder {
    /// Creates an encoder.
    pub fn new() -> Self {
        Self
    }

    /// Encodes `request` with a fresh boundary token.
    pub fn encode(&self, request: &GenerationRequest) -> EncodedPayload {
        let fields = scalar_fields(request);
        let boundary = fresh_boundary(request.image.jpeg_bytes(), &fields);
        encode_with_boundary(request.image.jpeg_bytes(), &fields, boundary)
    }
}

/// Scalar form fields, in wire order.
fn scalar_fields(request: &GenerationRequest) -> [(&'static str, String); 5] {
    [
        ("prompt", request.prompt.clone()),
        ("negative_prompt", request.negative_prompt.clone()),
        ("control_strength", request.control_strength().to_string()),
        ("seed", request.seed.to_string()),
        ("output_format", request.output_format.api_name().to_string()),
    ]
}

/// Draws boundary tokens until one does not occur in any part content.
fn fresh_boundary(image: &[u8], fields: &[(&'static str, String)]) -> String {
    loop {
        let boundary = format!("Boundary-{}", Uuid::new_v4());
        let collides = contains(image, boundary.as_bytes())
            || fields
                .iter()
                .any(|(_, value)| contains(value.as_bytes(), boundary.as_bytes()));
        if !collides {
            return boundary;
        }
        tracing::debug!(%boundary, "boundary token collided with payload, redrawing");
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn encode_with_boundary(
    image: &[u8],
    fields: &[(&'static str, String)],
    boundary: String,
) -> EncodedPayload {
    let mut body = Vec::with_capacity(image.len() + 1024);

    push_part_header(
        &mut body,
        &boundary,
        IMAGE_FIELD,
        Some((IMAGE_FILENAME, IMAGE_CONTENT_TYPE)),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(CRLF);

    for (name, value) in fields {
        push_part_header(&mut body, &boundary, name, None);
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(CRLF);
    }

    body.extend_from_slice(format!("--{boundary}--").as_bytes());
    body.extend_from_slice(CRLF);

    tracing::debug!(%boundary, bytes = body.len(), "encoded multipart payload");

    EncodedPayload {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        boundary,
        body,
    }
}

fn push_part_header(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    file: Option<(&str, &str)>,
) {
    body.extend_from_slice(format!("--{boundary}").as_bytes());
    body.extend_from_slice(CRLF);
    match file {
        Some((filename, content_type)) => {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"")
                    .as_bytes(),
            );
            body.extend_from_slice(CRLF);
            body.extend_from_slice(format!("Content-Type: {content_type}").as_bytes());
            body.extend_from_slice(CRLF);
        }
        None => {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"").as_bytes(),
            );
            body.extend_from_slice(CRLF);
        }
    }
    body.extend_from_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::fit::{ConstraintFitter, FittedImage};
    use crate::image::types::{ImageFormat, RawImage};
    use image::DynamicImage;

    fn fitted() -> FittedImage {
        ConstraintFitter::default()
            .fit(&RawImage::from(DynamicImage::new_rgb8(16, 12)))
            .unwrap()
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_boundary_lines() {
        let request = GenerationRequest::new(fitted(), "watercolor please");
        let payload = MultipartEncoder::new().encode(&request);

        let opening = format!("--{}\r\n", payload.boundary);
        let closing = format!("--{}--\r\n", payload.boundary);
        assert_eq!(count(&payload.body, opening.as_bytes()), 6);
        assert_eq!(count(&payload.body, closing.as_bytes()), 1);
        assert!(payload.body.starts_with(opening.as_bytes()));
        assert!(payload.body.ends_with(closing.as_bytes()));
    }

    #[test]
    fn test_content_type_matches_body_boundary() {
        let request = GenerationRequest::new(fitted(), "p");
        let payload = MultipartEncoder::new().encode(&request);

        let token = payload
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        assert_eq!(token, payload.boundary);
        assert!(payload.boundary.starts_with("Boundary-"));
    }

    #[test]
    fn test_fresh_boundary_per_call() {
        let request = GenerationRequest::new(fitted(), "p");
        let encoder = MultipartEncoder::new();
        let a = encoder.encode(&request);
        let b = encoder.encode(&request);
        assert_ne!(a.boundary, b.boundary);
    }

    #[test]
    fn test_reproducible_for_fixed_boundary() {
        let request = GenerationRequest::new(fitted(), "p").with_seed(42);
        let fields = scalar_fields(&request);
        let a = encode_with_boundary(request.image.jpeg_bytes(), &fields, "fixed".into());
        let b = encode_with_boundary(request.image.jpeg_bytes(), &fields, "fixed".into());
        assert_eq!(a.body, b.body);
    }

    #[test]
    fn test_exact_layout() {
        let request = GenerationRequest::new(fitted(), "a cat")
            .with_negative_prompt("blurry")
            .with_control_strength(0.7)
            .with_seed(7)
            .with_output_format(ImageFormat::Png);
        let image = b"JPEGDATA";
        let payload = encode_with_boundary(image, &scalar_fields(&request), "XYZ".into());

        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"image\"; filename=\"image.jpg\"\r\n\
            Content-Type: image/jpeg\r\n\r\n\
            JPEGDATA\r\n\
            --XYZ\r\nContent-Disposition: form-data; name=\"prompt\"\r\n\r\na cat\r\n\
            --XYZ\r\nContent-Disposition: form-data; name=\"negative_prompt\"\r\n\r\nblurry\r\n\
            --XYZ\r\nContent-Disposition: form-data; name=\"control_strength\"\r\n\r\n0.7\r\n\
            --XYZ\r\nContent-Disposition: form-data; name=\"seed\"\r\n\r\n7\r\n\
            --XYZ\r\nContent-Disposition: form-data; name=\"output_format\"\r\n\r\npng\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(payload.body).unwrap(), expected);
        assert_eq!(payload.content_type, "multipart/form-data; boundary=XYZ");
    }

    #[test]
    fn test_image_bytes_embedded_verbatim() {
        let request = GenerationRequest::new(fitted(), "p");
        let payload = MultipartEncoder::new().encode(&request);
        assert_eq!(count(&payload.body, request.image.jpeg_bytes()), 1);
    }

    #[test]
    fn test_clamped_strength_is_encoded() {
        let request = GenerationRequest::new(fitted(), "p").with_control_strength(1.5);
        let fields = scalar_fields(&request);
        assert_eq!(fields[2], ("control_strength", "1".to_string()));
    }
}
