//! End-to-end pipeline tests against a local mock of the structure endpoint.

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use image::imageops::FilterType;
use image::DynamicImage;
use snapart::{
    ArtPipeline, ArtStyle, Config, ConstraintProfile, GenerationOutcome, RawImage, StyleCatalog,
    StyleOptions,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const PATH: &str = "/v2beta/stable-image/control/structure";

type Captured = Arc<Mutex<Option<(HeaderMap, Bytes)>>>;

fn png_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(16, 12)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Starts a server that records the request and answers with `status` and `body`.
async fn mock_endpoint(status: StatusCode, body: Vec<u8>) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route(
            PATH,
            post({
                let captured = captured.clone();
                move |headers: HeaderMap, request: Bytes| {
                    let captured = captured.clone();
                    let body = body.clone();
                    async move {
                        *captured.lock().unwrap() = Some((headers, request));
                        (status, [(header::CONTENT_TYPE, "image/png")], body)
                    }
                }
            }),
        )
        .layer(DefaultBodyLimit::disable());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}{PATH}"), captured)
}

fn pipeline(endpoint: String, profile: ConstraintProfile) -> ArtPipeline {
    let config = Config {
        api_key: Some("sk-test".into()),
        endpoint,
        profile,
        ..Config::default()
    };
    ArtPipeline::from_config(&config).unwrap()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Returns the raw value of the part named `name`.
fn part<'a>(body: &'a [u8], boundary: &str, name: &str) -> &'a [u8] {
    let disposition = format!("name=\"{name}\"");
    let start = find(body, disposition.as_bytes()).expect("part present");
    let value_start = start + find(&body[start..], b"\r\n\r\n").unwrap() + 4;
    let delimiter = format!("\r\n--{boundary}");
    let value_len = find(&body[value_start..], delimiter.as_bytes()).unwrap();
    &body[value_start..value_start + value_len]
}

fn boundary(headers: &HeaderMap) -> String {
    headers["content-type"]
        .to_str()
        .unwrap()
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_large_photo_is_fitted_and_uploaded() {
    let (endpoint, captured) = mock_endpoint(StatusCode::OK, png_bytes()).await;
    let profile = ConstraintProfile {
        max_byte_size: 64 * 1024 * 1024,
        ..ConstraintProfile::default()
    }
    .with_resize_filter(FilterType::Nearest);
    let pipeline = pipeline(endpoint, profile);

    let photo = RawImage::from(DynamicImage::new_rgb8(4000, 3000));
    let art = pipeline
        .stylize(
            photo,
            ArtStyle::WhimsicalWatercolor,
            &StyleOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!((art.width, art.height), (16, 12));

    let (headers, body) = captured.lock().unwrap().take().unwrap();
    let boundary = boundary(&headers);
    assert!(boundary.starts_with("Boundary-"));
    assert_eq!(headers["authorization"], "Bearer sk-test");

    assert_eq!(
        part(&body, &boundary, "prompt"),
        StyleCatalog::prompt_for(ArtStyle::WhimsicalWatercolor).as_bytes()
    );
    assert_eq!(part(&body, &boundary, "negative_prompt"), b"");
    assert_eq!(part(&body, &boundary, "control_strength"), b"0.7");
    assert_eq!(part(&body, &boundary, "seed"), b"0");
    assert_eq!(part(&body, &boundary, "output_format"), b"webp");

    let uploaded = image::load_from_memory(part(&body, &boundary, "image")).unwrap();
    let pixels = u64::from(uploaded.width()) * u64::from(uploaded.height());
    assert!(pixels <= 9_000_000);
    let aspect = f64::from(uploaded.width()) / f64::from(uploaded.height());
    assert!((aspect - 4.0 / 3.0).abs() / (4.0 / 3.0) < 0.001);
    assert!(body.ends_with(format!("\r\n--{boundary}--\r\n").as_bytes()));
}

#[tokio::test]
async fn test_out_of_range_strength_is_clamped_on_the_wire() {
    let (endpoint, captured) = mock_endpoint(StatusCode::OK, png_bytes()).await;
    let pipeline = pipeline(endpoint, ConstraintProfile::default());
    let options = StyleOptions {
        control_strength: 1.5,
        seed: 42,
        ..StyleOptions::default()
    };

    let _ = pipeline
        .stylize(
            RawImage::from(DynamicImage::new_rgb8(64, 48)),
            ArtStyle::CyberpunkNeon,
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let (headers, body) = captured.lock().unwrap().take().unwrap();
    let boundary = boundary(&headers);
    assert_eq!(part(&body, &boundary, "control_strength"), b"1");
    assert_eq!(part(&body, &boundary, "seed"), b"42");
}

#[tokio::test]
async fn test_rejection_surfaces_service_message() {
    let (endpoint, _) = mock_endpoint(
        StatusCode::BAD_REQUEST,
        br#"{"errors":["prompt: cannot be empty"]}"#.to_vec(),
    )
    .await;
    let pipeline = pipeline(endpoint, ConstraintProfile::default());

    let outcome = pipeline
        .stylize_outcome(
            RawImage::from(DynamicImage::new_rgb8(64, 48)),
            ArtStyle::MinimalistFlat,
            &StyleOptions::default(),
            &CancellationToken::new(),
        )
        .await;

    match outcome {
        GenerationOutcome::ApiError { message, status } => {
            assert_eq!(status, 400);
            assert_eq!(message, "prompt: cannot be empty");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let pipeline = pipeline(format!("http://{addr}{PATH}"), ConstraintProfile::default());

    let outcome = pipeline
        .stylize_outcome(
            RawImage::from(DynamicImage::new_rgb8(64, 48)),
            ArtStyle::BaroquePainting,
            &StyleOptions::default(),
            &CancellationToken::new(),
        )
        .await;

    match &outcome {
        GenerationOutcome::TransportError(cause) => assert!(!cause.is_empty()),
        other => panic!("expected TransportError, got {other:?}"),
    }
    assert!(outcome
        .user_message()
        .is_some_and(|m| m.starts_with("network error:")));
}
