//! Integration tests for multipart body parsing.
//!
//! Covers realistic response bodies and the structural properties of the
//! parser: part count, round-trip through serialization and idempotence.

#![allow(clippy::unwrap_used, clippy::needless_collect)]

use mimesplit::{
    Error, Headers, MultipartMessage, ParseMode, ParseOptions, Parser, Part, TransferEncoding,
    parse,
};
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

const BOUNDARY: &str = "=_mimesplit_7f3a";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn count_delimiters(input: &[u8], boundary: &str) -> usize {
    let delimiter = format!("--{boundary}");
    input
        .windows(delimiter.len())
        .filter(|w| *w == delimiter.as_bytes())
        .count()
}

#[test]
fn test_response_with_attachment() {
    init_tracing();
    let body = concat!(
        "--frontier\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p>Caf=C3=A9</p>\r\n",
        "--frontier\r\n",
        "Content-Type: application/octet-stream; name=\"data.bin\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "Content-Disposition: attachment;\r\n",
        "\tfilename=\"data.bin\"\r\n",
        "\r\n",
        "AAECAw==\r\n",
        "--frontier--\r\n"
    );

    let message = MultipartMessage::from_response(
        "multipart/mixed; boundary=\"frontier\"",
        body.as_bytes(),
        ParseOptions::strict(),
    )
    .unwrap();

    assert_eq!(message.boundary(), "frontier");
    assert_eq!(message.len(), 2);

    let html = &message.parts()[0];
    assert_eq!(html.content_type().unwrap().essence(), "text/html");
    assert_eq!(html.transfer_encoding(), TransferEncoding::QuotedPrintable);
    assert_eq!(html.body_text().unwrap(), "<p>Café</p>");

    let attachment = &message.parts()[1];
    assert!(attachment.is_attachment());
    assert_eq!(attachment.filename().as_deref(), Some("data.bin"));
    assert_eq!(attachment.decode_body().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_from_response_rejects_non_multipart() {
    assert!(matches!(
        MultipartMessage::from_response("application/json", b"{}", ParseOptions::default()),
        Err(Error::NotMultipart(_))
    ));
    assert!(matches!(
        MultipartMessage::from_response("multipart/mixed", b"", ParseOptions::default()),
        Err(Error::MissingBoundaryParameter)
    ));
}

#[test]
fn test_canonical_body_round_trips_exactly() {
    let input = b"--B\r\nContent-Type: text/plain\r\n\r\nhello\r\n--B\r\nX-A: 1\r\nX-B: 2\r\n\r\nworld\r\n--B--";
    let message = parse(input, "B").unwrap();
    assert_eq!(message.to_bytes(), input.to_vec());
}

#[test]
fn test_nested_multipart_is_opaque_body() {
    let input = concat!(
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "plain\r\n",
        "--inner--\r\n",
        "--outer--"
    );
    let outer = parse(input.as_bytes(), "outer").unwrap();
    assert_eq!(outer.len(), 1);

    let nested = &outer.parts()[0];
    let boundary = nested.content_type().unwrap().boundary().unwrap().to_string();
    let inner = Parser::new(boundary).unwrap().parse_bytes(nested.body.clone()).unwrap();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner.parts()[0].body, "plain");
}

#[test]
fn test_lenient_and_strict_disagree_on_malformed() {
    let input = b"--B\r\nContent-Type: text/plain\r\n\r\ntruncated";

    let lenient = Parser::with_options("B", ParseOptions::default()).unwrap();
    let message = lenient.parse(input).unwrap();
    assert_eq!(message.len(), 1);
    assert_eq!(message.parts()[0].body, "truncated");

    let strict = Parser::with_options(
        "B",
        ParseOptions::builder().mode(ParseMode::Strict).build(),
    )
    .unwrap();
    assert!(matches!(strict.parse(input), Err(Error::MissingTerminator)));
}

fn header_strategy() -> impl Strategy<Value = (String, String)> {
    ("[A-Z][a-zA-Z0-9-]{0,12}", "[a-zA-Z0-9/;=._-]{1,24}")
}

fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    "[a-zA-Z0-9 .,]{0,40}(\r\n[a-zA-Z0-9 .,]{0,40}){0,3}".prop_map(String::into_bytes)
}

fn part_strategy() -> impl Strategy<Value = Part> {
    (prop::collection::vec(header_strategy(), 0..4), body_strategy()).prop_map(
        |(headers, body)| Part::new(headers.into_iter().collect::<Headers>(), body),
    )
}

proptest! {
    #[test]
    fn prop_part_count_is_delimiters_minus_one(
        parts in prop::collection::vec(part_strategy(), 0..8)
    ) {
        let input = MultipartMessage::new(BOUNDARY, parts.clone()).to_bytes();
        let message = parse(&input, BOUNDARY).unwrap();

        prop_assert_eq!(message.len(), count_delimiters(&input, BOUNDARY) - 1);
        prop_assert_eq!(message.len(), parts.len());
    }

    #[test]
    fn prop_round_trip(parts in prop::collection::vec(part_strategy(), 0..8)) {
        let input = MultipartMessage::new(BOUNDARY, parts.clone()).to_bytes();
        let strict = Parser::with_options(BOUNDARY, ParseOptions::strict()).unwrap();
        let message = strict.parse(&input).unwrap();

        prop_assert_eq!(message.parts(), &parts[..]);
        prop_assert_eq!(message.to_bytes(), input);
    }

    #[test]
    fn prop_parse_is_idempotent(input in prop::collection::vec(any::<u8>(), 0..256)) {
        let first = parse(&input, "b");
        let second = parse(&input, "b");
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "parse results differ"),
        }
    }

    #[test]
    fn prop_lenient_never_fails_on_noise(
        chunks in prop::collection::vec(
            prop_oneof![
                Just(b"--b\r\n".to_vec()),
                Just(b"\r\n".to_vec()),
                Just(b"--b--".to_vec()),
                Just(b"X: y\r\n".to_vec()),
                prop::collection::vec(any::<u8>(), 0..16),
            ],
            0..24,
        )
    ) {
        let input: Vec<u8> = chunks.concat();
        prop_assert!(parse(&input, "b").is_ok());
    }
}
