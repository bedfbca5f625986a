use fetchline::http::parser::parse_status_line;
use fetchline::http::response::{Response, StatusCode, TEXT_PLAIN};
use fetchline::http::writer::{ResponseWriter, serialize_response};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::ServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(StatusCode::ServerError.reason_phrase(), "Server Error");
}

#[test]
fn test_ok_response_is_plain_text() {
    let response = Response::ok("hi");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type.as_deref(), Some(TEXT_PLAIN));
    assert_eq!(response.body.as_deref(), Some("hi"));
}

#[test]
fn test_error_responses_have_no_body() {
    for response in [Response::not_found(), Response::server_error()] {
        assert!(response.body.is_none());
        assert!(response.content_type.is_none());
    }
}

#[test]
fn test_serialize_success() {
    let bytes = serialize_response(&Response::ok("hi"));
    assert_eq!(bytes, b"HTTP/1.1 200 OK\nContent-Type: text/plain\n\nhi\n".to_vec());
}

#[test]
fn test_serialize_custom_content_type() {
    let bytes = serialize_response(&Response::ok("<p>x</p>").with_content_type("text/html"));
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("Content-Type: text/html\n"));
}

#[test]
fn test_serialize_not_found() {
    let bytes = serialize_response(&Response::not_found());
    assert_eq!(bytes, b"HTTP/1.1 404 Not Found\n".to_vec());
}

#[test]
fn test_serialize_server_error() {
    let bytes = serialize_response(&Response::server_error());
    assert_eq!(bytes, b"HTTP/1.1 500 Server Error\n".to_vec());
}

#[test]
fn test_status_line_round_trip() {
    for response in [Response::ok("body"), Response::not_found(), Response::server_error()] {
        let bytes = serialize_response(&response);
        let text = String::from_utf8(bytes).unwrap();
        let status_line = text.lines().next().unwrap();

        let (code, reason) = parse_status_line(status_line).unwrap();
        assert_eq!(code, response.code());
        assert_eq!(reason, response.reason());
    }
}

#[tokio::test]
async fn test_writer_writes_whole_response_once() {
    let mut out: Vec<u8> = Vec::new();
    let mut writer = ResponseWriter::new(&Response::ok("hello"));

    writer.write_to_stream(&mut out).await.unwrap();
    assert!(writer.is_done());

    // nothing left to write on a second call
    writer.write_to_stream(&mut out).await.unwrap();
    assert_eq!(out, b"HTTP/1.1 200 OK\nContent-Type: text/plain\n\nhello\n".to_vec());
}
