//! End-to-end tests: ambient snapshot → handler → emitted bytes.

use std::fmt;

use cgi_bridge::ambient::{FileDescriptor, FileValue};
use cgi_bridge::capture;
use cgi_bridge::emitter::Emitted;
use cgi_bridge::http::{MemoryStream, Stream, UploadError};
use cgi_bridge::{
    echo, AmbientEnvironment, BoxError, BridgeError, CgiChannel, Container, ErrorKind,
    RecordingChannel, Request, Response, Service,
};

mod common;

#[derive(Debug)]
struct HandlerFailure(&'static str);

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler failure: {}", self.0)
    }
}

impl std::error::Error for HandlerFailure {}

#[test]
fn test_emission_order_in_cgi_output() {
    let bridge = common::bridge();
    let env = AmbientEnvironment::builder().method("POST").build();
    let mut channel = CgiChannel::new(Vec::new());

    bridge
        .run(&env, &mut channel, |_, _| {
            Ok::<_, BridgeError>(Response::new(201)?.with_header("X", "1").with_text("hi"))
        })
        .unwrap();

    let out = String::from_utf8(channel.into_inner()).unwrap();
    assert_eq!(out, "Status: 201 Created\r\nX: 1\r\n\r\nhi");
}

#[test]
fn test_no_implicit_output_means_no_body_write() {
    let bridge = common::bridge();
    let (body, writes) = common::CountingStream::new();
    let mut channel = RecordingChannel::new();

    bridge
        .run(&AmbientEnvironment::default(), &mut channel, move |_, _| {
            Ok::<_, BoxError>(Response::ok().with_body(Box::new(body)))
        })
        .unwrap();

    assert!(writes.borrow().is_empty());
    assert!(channel.body().is_empty());
}

#[test]
fn test_implicit_output_is_one_body_write() {
    let bridge = common::bridge();
    let (body, writes) = common::CountingStream::new();
    let mut channel = RecordingChannel::new();

    bridge
        .run(&AmbientEnvironment::default(), &mut channel, move |_, _| {
            echo!("a");
            echo!("bc");
            Ok::<_, BoxError>(Response::ok().with_body(Box::new(body)))
        })
        .unwrap();

    assert_eq!(*writes.borrow(), vec![b"abc".to_vec()]);
    assert_eq!(channel.body(), b"abc");
}

#[test]
fn test_implicit_output_follows_rewound_body() {
    let bridge = common::bridge();
    let mut channel = RecordingChannel::new();

    bridge
        .run(&AmbientEnvironment::default(), &mut channel, |_, _| {
            echo!("abc");
            let mut response = Response::ok().with_body(Box::new(MemoryStream::from_bytes("hello")));
            response.body_mut().rewind()?;
            Ok::<_, BoxError>(response)
        })
        .unwrap();

    assert_eq!(channel.body(), b"helloabc");
}

#[test]
fn test_json_request_scenario() {
    let bridge = common::bridge();
    let env = AmbientEnvironment::builder()
        .method("POST")
        .request_uri("/submit")
        .server("CONTENT_TYPE", "application/json")
        .raw_input(r#"{"a":1}"#)
        .build();
    let mut channel = RecordingChannel::new();

    bridge
        .run(&env, &mut channel, |request: Request, _: &Container| {
            assert_eq!(request.method().as_str(), "POST");
            assert_eq!(request.uri().as_str(), "http://localhost/submit");
            assert_eq!(request.parsed_body(), Some(&serde_json::json!({"a": 1})));
            Ok::<_, BoxError>(Response::ok())
        })
        .unwrap();

    assert_eq!(channel.events()[0], Emitted::Status(200, "OK".into()));
}

#[test]
fn test_multi_file_upload_scenario() {
    let first = common::tmp_upload(b"first file");
    let second = common::tmp_upload(b"second");
    let descriptor = FileDescriptor {
        name: FileValue::list(["a.txt", "b.png"]),
        media_type: FileValue::list(["text/plain", "image/png"]),
        tmp_name: FileValue::list([
            first.path().to_str().unwrap(),
            second.path().to_str().unwrap(),
        ]),
        error: FileValue::list(["0", "0"]),
        size: FileValue::list(["10", "6"]),
    };
    let env = AmbientEnvironment::builder()
        .method("POST")
        .file("attachments", descriptor)
        .build();

    let bridge = common::bridge();
    let mut channel = RecordingChannel::new();
    bridge
        .run(&env, &mut channel, |mut request: Request, _: &Container| {
            let branch = request.uploaded_files_mut().get_mut("attachments").unwrap();
            assert_eq!(branch.len(), 2);

            let expected = [
                ("0", "a.txt", "text/plain", 10, &b"first file"[..]),
                ("1", "b.png", "image/png", 6, &b"second"[..]),
            ];
            for (key, name, media_type, size, content) in expected {
                let file = branch.get_mut(key).and_then(|n| n.as_file_mut()).unwrap();
                assert_eq!(file.client_filename(), Some(name));
                assert_eq!(file.client_media_type(), Some(media_type));
                assert_eq!(file.size(), size);
                assert_eq!(file.error(), UploadError::Ok);
                assert_eq!(file.stream_mut().unwrap().contents().unwrap(), content);
            }
            Ok::<_, BoxError>(Response::ok())
        })
        .unwrap();
}

#[test]
fn test_nested_upload_fields() {
    let avatar = common::tmp_upload(b"png");
    let descriptor = FileDescriptor {
        name: FileValue::Nested(vec![
            ("avatar".into(), "me.png".into()),
            ("docs".into(), FileValue::list(["cv.pdf"])),
        ]),
        media_type: FileValue::Nested(vec![
            ("avatar".into(), "image/png".into()),
            ("docs".into(), FileValue::list(["application/pdf"])),
        ]),
        tmp_name: FileValue::Nested(vec![
            ("avatar".into(), avatar.path().to_str().unwrap().into()),
            ("docs".into(), FileValue::list([""])),
        ]),
        error: FileValue::Nested(vec![
            ("avatar".into(), "0".into()),
            ("docs".into(), FileValue::list(["1"])),
        ]),
        size: FileValue::Nested(vec![
            ("avatar".into(), "3".into()),
            ("docs".into(), FileValue::list(["0"])),
        ]),
    };
    let env = AmbientEnvironment::builder().file("profile", descriptor).build();

    let bridge = common::bridge();
    bridge
        .run(&env, &mut RecordingChannel::new(), |request: Request, _: &Container| {
            let profile = request.uploaded_files().get("profile").unwrap();
            let avatar = profile.get("avatar").and_then(|n| n.as_file()).unwrap();
            assert_eq!(avatar.client_filename(), Some("me.png"));

            let cv = profile
                .get("docs")
                .and_then(|n| n.get("0"))
                .and_then(|n| n.as_file())
                .unwrap();
            assert_eq!(cv.error(), UploadError::IniSize);
            assert_eq!(cv.client_media_type(), Some("application/pdf"));
            Ok::<_, BoxError>(Response::ok())
        })
        .unwrap();
}

#[test]
fn test_handler_error_discards_capture_and_propagates() {
    let bridge = common::bridge();
    let mut channel = RecordingChannel::new();

    // An enclosing capture level, as a test harness might hold.
    capture::buffer::push_level();
    let outer_depth = capture::depth();

    let err = bridge
        .run(&AmbientEnvironment::default(), &mut channel, |_, _| {
            echo!("partial");
            Err::<Response, _>(HandlerFailure("mid-execution"))
        })
        .unwrap_err();

    assert_eq!(capture::depth(), outer_depth);
    assert_eq!(capture::buffer::pop_level().as_deref(), Some(""));
    assert!(channel.events().is_empty());

    assert_eq!(err.kind(), ErrorKind::Handler);
    match err {
        BridgeError::Handler(source) => {
            let original = source.downcast_ref::<HandlerFailure>().unwrap();
            assert_eq!(original.0, "mid-execution");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_handler_returning_wrong_type() {
    let bridge = common::bridge();
    let mut channel = RecordingChannel::new();

    let err = bridge
        .run(&AmbientEnvironment::default(), &mut channel, |_, _| {
            echo!("ignored");
            Ok::<_, BoxError>(42u32)
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert!(err.to_string().contains("u32"));
    assert!(channel.events().is_empty());
}

#[test]
fn test_invalid_method_never_reaches_handler() {
    let bridge = common::bridge();
    let env = AmbientEnvironment::builder().method("PROPFIND").build();
    let mut called = false;

    let err = bridge
        .run(&env, &mut RecordingChannel::new(), |_, _| {
            called = true;
            Ok::<_, BoxError>(Response::ok())
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(!called);
}

#[test]
fn test_output_already_started() {
    let bridge = common::bridge();
    let mut channel = CgiChannel::already_started(Vec::new(), "bootstrap.rs:7");

    let err = bridge
        .run(&AmbientEnvironment::default(), &mut channel, |_, _| {
            Ok::<_, BoxError>(Response::ok())
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Emission);
    assert!(channel.into_inner().is_empty());
}

#[test]
fn test_handler_uses_container_services() {
    let mut bridge = common::bridge();
    bridge
        .container_mut()
        .set("greeting", |_| Ok(std::sync::Arc::new("hello".to_string()) as Service));
    let mut channel = RecordingChannel::new();

    bridge
        .run(&AmbientEnvironment::default(), &mut channel, |_, container: &Container| {
            let greeting = container.get("greeting")?;
            let greeting = greeting.downcast_ref::<String>().ok_or("greeting is not a string")?;
            echo!("{greeting}");
            Ok::<_, BoxError>(Response::ok().with_header("Content-Type", "text/plain"))
        })
        .unwrap();

    assert_eq!(channel.body(), b"hello");
}

#[test]
fn test_container_error_propagates_unmodified() {
    let mut bridge = common::bridge();
    bridge
        .container_mut()
        .set("db", |_| Err("connection refused".into()));

    let err = bridge
        .run(&AmbientEnvironment::default(), &mut RecordingChannel::new(), |_, container: &Container| {
            container.get("db")?;
            Ok::<_, BridgeError>(Response::ok())
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Container);
}

#[test]
fn test_cgi_process_snapshot() {
    let vars = vec![
        ("REQUEST_METHOD".to_string(), "post".to_string()),
        ("HTTPS".to_string(), "on".to_string()),
        ("HTTP_HOST".to_string(), "example.com".to_string()),
        ("SERVER_PORT".to_string(), "443".to_string()),
        ("REQUEST_URI".to_string(), "/form".to_string()),
        ("QUERY_STRING".to_string(), "step=2".to_string()),
        ("CONTENT_TYPE".to_string(), "application/x-www-form-urlencoded".to_string()),
        ("HTTP_COOKIE".to_string(), "sid=xyz".to_string()),
    ];
    let env = AmbientEnvironment::from_cgi(vars, &b"name=Ada"[..]).unwrap();

    let bridge = common::bridge();
    bridge
        .run(&env, &mut RecordingChannel::new(), |request: Request, _: &Container| {
            assert_eq!(request.uri().as_str(), "https://example.com/form?step=2");
            assert_eq!(request.parsed_body(), Some(&serde_json::json!({"name": "Ada"})));
            assert_eq!(request.cookie_params().get("sid").map(String::as_str), Some("xyz"));
            assert_eq!(request.query_params().get("step").map(String::as_str), Some("2"));
            assert_eq!(request.header("Cookie"), ["sid=xyz"]);
            Ok::<_, BoxError>(Response::ok())
        })
        .unwrap();
}
