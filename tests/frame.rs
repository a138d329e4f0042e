use ltnm_client_sdk::frame::{
    FrameError, ParseError, StompCommand, StompFrame, StompHeader, ValidationError,
};

fn parse_err(input: &str) -> FrameError {
    StompFrame::parse(input).expect_err("frame parsed unexpectedly")
}

#[test]
fn parse_well_formed() {
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         \n\
         Frame body\0",
    )
    .unwrap();
    assert_eq!(frame.command(), StompCommand::Stomp);
    assert_eq!(frame.header(StompHeader::AcceptVersion), Some("42"));
    assert_eq!(frame.header(StompHeader::Host), Some("host.com"));
    assert_eq!(frame.body(), "Frame body");
}

#[test]
fn parse_well_formed_content_length() {
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         content-length:10\n\
         \n\
         Frame body\0",
    )
    .unwrap();
    assert_eq!(frame.command(), StompCommand::Stomp);
    assert_eq!(frame.body(), "Frame body");
}

#[test]
fn parse_empty_body() {
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         \n\
         \0",
    )
    .unwrap();
    assert_eq!(frame.command(), StompCommand::Stomp);
    assert!(frame.body().is_empty());
}

#[test]
fn parse_empty_body_content_length() {
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         content-length:0\n\
         \n\
         \0",
    )
    .unwrap();
    assert!(frame.body().is_empty());
}

#[test]
fn parse_empty_headers() {
    let frame = StompFrame::parse("DISCONNECT\n\nFrame body\0").unwrap();
    assert_eq!(frame.command(), StompCommand::Disconnect);
    assert_eq!(frame.body(), "Frame body");
}

#[test]
fn parse_only_command() {
    let frame = StompFrame::parse("DISCONNECT\n\n\0").unwrap();
    assert_eq!(frame.command(), StompCommand::Disconnect);
    assert!(frame.body().is_empty());
}

#[test]
fn parse_bad_command() {
    assert_eq!(
        parse_err(
            "CONNECTX\n\
             accept-version:42\n\
             host:host.com\n\
             \n\
             Frame body\0"
        ),
        ParseError::UnknownCommand("CONNECTX".to_owned()).into()
    );
}

#[test]
fn parse_header_without_colon() {
    assert_eq!(
        parse_err(
            "CONNECT\n\
             accept-version:42\n\
             login\n\
             \n\
             Frame body\0"
        ),
        ParseError::MalformedHeaderLine("login".to_owned()).into()
    );
}

#[test]
fn parse_missing_body_newline() {
    let error = parse_err(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n",
    );
    assert!(error.is_parse());
}

#[test]
fn parse_missing_last_header_newline() {
    let error = parse_err(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com",
    );
    assert!(error.is_parse());
}

#[test]
fn parse_unrecognized_header() {
    assert_eq!(
        parse_err(
            "CONNECT\n\
             bad_header:42\n\
             host:host.com\n\
             \n\
             \0"
        ),
        ParseError::UnknownHeader("bad_header".to_owned()).into()
    );
}

#[test]
fn parse_stray_carriage_return_in_header() {
    // A lone \r inside a header line is not a line terminator and may not
    // appear in a name or value.
    let error = parse_err("CONNECT\naccept-version:4\r2\nhost:host.com\n\n\0");
    assert!(error.is_parse());
}

#[test]
fn parse_empty_header_value() {
    // STOMP 1.2 allows empty header values.
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:\n\
         host:host.com\n\
         \n\
         \0",
    )
    .unwrap();
    assert_eq!(frame.header(StompHeader::AcceptVersion), Some(""));
}

#[test]
fn parse_just_command() {
    assert!(parse_err("CONNECT").is_parse());
}

#[test]
fn parse_newline_after_command() {
    // The blank line right after the command ends the header section, so
    // everything up to the NUL is body.
    let frame = StompFrame::parse(
        "DISCONNECT\n\
         \n\
         version:42\n\
         host:host.com\n\
         \n\
         Frame body\0",
    )
    .unwrap();
    assert_eq!(frame.command(), StompCommand::Disconnect);
    assert!(frame.body().starts_with("version:42"));
}

#[test]
fn parse_double_colon_in_header_line() {
    // STOMP 1.2 disallows raw colons in header values.
    assert_eq!(
        parse_err(
            "CONNECT\n\
             accept-version:42:43\n\
             host:host.com\n\
             \n\
             Frame body\0"
        ),
        ParseError::ColonInHeaderValue("accept-version:42:43".to_owned()).into()
    );
}

#[test]
fn parse_repeated_headers_keep_the_first() {
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:42\n\
         accept-version:43\n\
         host:host.com\n\
         \n\
         Frame body\0",
    )
    .unwrap();
    assert_eq!(frame.header(StompHeader::AcceptVersion), Some("42"));
}

#[test]
fn parse_missing_required_header() {
    let error = parse_err(
        "CONNECT\n\
         accept-version:42\n\
         accept-version:43\n\
         \n\
         Frame body\0",
    );
    assert_eq!(
        error,
        ValidationError::MissingRequiredHeader {
            command: StompCommand::Stomp,
            header: StompHeader::Host,
        }
        .into()
    );
}

#[test]
fn parse_unterminated_body() {
    assert_eq!(
        parse_err(
            "CONNECT\n\
             accept-version:42\n\
             host:host.com\n\
             \n\
             Frame body"
        ),
        ParseError::MissingNullTerminator.into()
    );
}

#[test]
fn parse_unterminated_body_content_length() {
    assert_eq!(
        parse_err(
            "CONNECT\n\
             accept-version:42\n\
             host:host.com\n\
             content-length:10\n\
             \n\
             Frame body"
        ),
        ParseError::MissingNullTerminator.into()
    );
}

#[test]
fn parse_junk_after_body() {
    assert_eq!(
        parse_err(
            "CONNECT\n\
             accept-version:42\n\
             host:host.com\n\
             \n\
             Frame body\0\n\njunk\n"
        ),
        ParseError::TrailingBytesAfterBody.into()
    );
}

#[test]
fn parse_newlines_after_body() {
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         \n\
         Frame body\0\n\n\n",
    )
    .unwrap();
    assert_eq!(frame.body(), "Frame body");
}

#[test]
fn parse_content_length_wrong_number() {
    // One byte short of the actual body.
    assert_eq!(
        parse_err(
            "CONNECT\n\
             accept-version:42\n\
             host:host.com\n\
             content-length:9\n\
             \n\
             Frame body\0"
        ),
        ValidationError::ContentLengthMismatch {
            declared: 9,
            actual: 10,
        }
        .into()
    );
}

#[test]
fn parse_content_length_exceeding() {
    let error = parse_err(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         content-length:15\n\
         \n\
         Frame body\0",
    );
    assert!(error.is_validation());
}

#[test]
fn parse_content_length_not_a_number() {
    let error = parse_err(
        "CONNECT\n\
         accept-version:42\n\
         host:host.com\n\
         content-length:ten\n\
         \n\
         Frame body\0",
    );
    assert_eq!(
        error,
        ValidationError::InvalidContentLength("ten".to_owned()).into()
    );
}

#[test]
fn parse_required_headers_one_by_one() {
    assert!(parse_err("CONNECT\n\n\0").is_validation());
    assert!(parse_err("CONNECT\naccept-version:42\n\n\0").is_validation());
    assert!(StompFrame::parse("CONNECT\naccept-version:42\nhost:host.com\n\n\0").is_ok());
}

#[test]
fn parse_required_headers_of_server_frames() {
    assert!(parse_err("CONNECTED\n\n\0").is_validation());
    assert!(StompFrame::parse("CONNECTED\nversion:1.2\n\n\0").is_ok());

    assert!(parse_err("RECEIPT\n\n\0").is_validation());
    assert!(StompFrame::parse("RECEIPT\nreceipt-id:7\n\n\0").is_ok());

    assert!(parse_err("MESSAGE\nsubscription:1\nmessage-id:m1\n\nx\0").is_validation());
    assert!(
        StompFrame::parse("MESSAGE\nsubscription:1\nmessage-id:m1\ndestination:/d\n\nx\0").is_ok()
    );
}

#[test]
fn parse_accepts_unused_protocol_commands() {
    for input in [
        "SEND\ndestination:/d\n\nhello\0",
        "UNSUBSCRIBE\nid:5\n\n\0",
        "ACK\nid:5\n\n\0",
        "NACK\nid:5\n\n\0",
        "BEGIN\n\n\0",
        "COMMIT\n\n\0",
        "ABORT\n\n\0",
    ] {
        assert!(StompFrame::parse(input).is_ok(), "rejected: {input:?}");
    }
}

#[test]
fn parse_decodes_header_escapes() {
    let frame = StompFrame::parse(
        "MESSAGE\n\
         subscription:s1\n\
         message-id:m1\n\
         destination:/pa\\cth\n\
         \n\
         x\0",
    )
    .unwrap();
    assert_eq!(frame.header(StompHeader::Destination), Some("/pa:th"));
}

#[test]
fn parse_rejects_unknown_escapes() {
    assert_eq!(
        parse_err(
            "MESSAGE\n\
             subscription:s1\n\
             message-id:m1\n\
             destination:/pa\\tth\n\
             \n\
             x\0"
        ),
        ParseError::BadEscapeSequence("\\t".to_owned()).into()
    );
}

#[test]
fn connect_frames_do_not_decode_escapes() {
    // Connect-family commands exchange raw header values.
    let frame = StompFrame::parse(
        "CONNECT\n\
         accept-version:1.2\n\
         host:a\\cb\n\
         \n\
         \0",
    )
    .unwrap();
    assert_eq!(frame.header(StompHeader::Host), Some("a\\cb"));
}

#[test]
fn message_round_trip_with_escapes() {
    let frame = StompFrame::new(
        StompCommand::Message,
        [
            (StompHeader::Subscription, "s1"),
            (StompHeader::MessageId, "m1"),
            (StompHeader::Destination, "/pa:th"),
        ],
        "Frame body",
    )
    .unwrap();

    let wire = frame.to_wire().unwrap();
    assert!(wire.contains("destination:/pa\\cth\n"), "wire: {wire:?}");

    let reparsed = StompFrame::parse(&wire).unwrap();
    assert_eq!(reparsed, frame);
}

#[test]
fn round_trip_emitted_frames() {
    let frames = [
        StompFrame::connect("host.com", "user", "secret").unwrap(),
        StompFrame::subscribe("/passengers", "3").unwrap(),
        StompFrame::disconnect().unwrap(),
    ];
    for frame in frames {
        let reparsed = StompFrame::parse(&frame.to_wire().unwrap()).unwrap();
        assert_eq!(reparsed, frame);
    }
}

#[test]
fn round_trip_with_content_length() {
    let frame = StompFrame::new(
        StompCommand::Error,
        [
            (StompHeader::ContentLength, "7".to_owned()),
            (StompHeader::ContentType, "text/plain".to_owned()),
        ],
        "Connect",
    )
    .unwrap();
    let reparsed = StompFrame::parse(&frame.to_wire().unwrap()).unwrap();
    assert_eq!(reparsed, frame);
}
