//! STOMP 1.2 frame codec.
//!
//! A [`StompFrame`] is an immutable command/headers/body value. Frames are
//! built either by [`StompFrame::parse`] from wire text or through the typed
//! constructors for the frames this client emits. Malformed wire input is
//! reported as [`ParseError`]; well-formed but semantically invalid frames
//! are reported as [`ValidationError`]. Both fold into [`FrameError`].

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use crate::error::{Error, Kind};

/// STOMP protocol version spoken by this crate.
pub const STOMP_VERSION: &str = "1.2";

/// STOMP 1.2 commands.
///
/// `CONNECT` and `STOMP` are synonyms on the wire; both parse to
/// [`StompCommand::Stomp`] and the client connect frame serializes as
/// `STOMP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StompCommand {
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl StompCommand {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "STOMP" | "CONNECT" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "ACK" => Self::Ack,
            "NACK" => Self::Nack,
            "BEGIN" => Self::Begin,
            "COMMIT" => Self::Commit,
            "ABORT" => Self::Abort,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            _ => return None,
        })
    }

    /// Whether a frame with this command may carry a non-empty body.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        matches!(self, Self::Send | Self::Message | Self::Error)
    }

    /// The connect-family commands exchange raw header values; every other
    /// command escape-encodes them (STOMP 1.2 §2.4).
    const fn raw_header_values(self) -> bool {
        matches!(self, Self::Stomp | Self::Connected)
    }

    const fn required_headers(self) -> &'static [StompHeader] {
        match self {
            Self::Stomp => &[StompHeader::AcceptVersion, StompHeader::Host],
            Self::Connected => &[StompHeader::Version],
            Self::Send => &[StompHeader::Destination],
            Self::Subscribe => &[StompHeader::Destination, StompHeader::Id],
            Self::Message => &[
                StompHeader::Destination,
                StompHeader::MessageId,
                StompHeader::Subscription,
            ],
            Self::Receipt => &[StompHeader::ReceiptId],
            _ => &[],
        }
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of STOMP 1.2 headers understood by this client.
///
/// Header names outside this set fail to parse; the broker side of the
/// protocol never sends others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StompHeader {
    AcceptVersion,
    Ack,
    ContentLength,
    ContentType,
    Destination,
    Host,
    Id,
    Login,
    MessageId,
    Passcode,
    Receipt,
    ReceiptId,
    Session,
    Subscription,
    Version,
}

impl StompHeader {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AcceptVersion => "accept-version",
            Self::Ack => "ack",
            Self::ContentLength => "content-length",
            Self::ContentType => "content-type",
            Self::Destination => "destination",
            Self::Host => "host",
            Self::Id => "id",
            Self::Login => "login",
            Self::MessageId => "message-id",
            Self::Passcode => "passcode",
            Self::Receipt => "receipt",
            Self::ReceiptId => "receipt-id",
            Self::Session => "session",
            Self::Subscription => "subscription",
            Self::Version => "version",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "accept-version" => Self::AcceptVersion,
            "ack" => Self::Ack,
            "content-length" => Self::ContentLength,
            "content-type" => Self::ContentType,
            "destination" => Self::Destination,
            "host" => Self::Host,
            "id" => Self::Id,
            "login" => Self::Login,
            "message-id" => Self::MessageId,
            "passcode" => Self::Passcode,
            "receipt" => Self::Receipt,
            "receipt-id" => Self::ReceiptId,
            "session" => Self::Session,
            "subscription" => Self::Subscription,
            "version" => Self::Version,
            _ => return None,
        })
    }
}

impl fmt::Display for StompHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed wire input.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input ended before the line terminator of the current section
    MissingLineTerminator,
    /// The command token is not a STOMP 1.2 command
    UnknownCommand(String),
    /// The header name is outside the closed header set
    UnknownHeader(String),
    /// A header line has no colon or an empty name
    MalformedHeaderLine(String),
    /// A header value contains a raw colon
    ColonInHeaderValue(String),
    /// A backslash sequence other than `\n`, `\r`, `\c`, `\\`
    BadEscapeSequence(String),
    /// The body is not terminated by a NUL byte
    MissingNullTerminator,
    /// Non-newline bytes follow the NUL terminator
    TrailingBytesAfterBody,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLineTerminator => write!(f, "input ended before a line terminator"),
            Self::UnknownCommand(token) => write!(f, "unknown STOMP command: {token:?}"),
            Self::UnknownHeader(name) => write!(f, "unknown STOMP header: {name:?}"),
            Self::MalformedHeaderLine(line) => write!(f, "malformed header line: {line:?}"),
            Self::ColonInHeaderValue(line) => {
                write!(f, "raw colon in header value: {line:?}")
            }
            Self::BadEscapeSequence(seq) => write!(f, "bad escape sequence: {seq:?}"),
            Self::MissingNullTerminator => write!(f, "frame body is not NUL-terminated"),
            Self::TrailingBytesAfterBody => {
                write!(f, "unexpected bytes after the NUL terminator")
            }
        }
    }
}

impl StdError for ParseError {}

/// Well-formed but semantically invalid frame.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A header required by the command is absent
    MissingRequiredHeader {
        command: StompCommand,
        header: StompHeader,
    },
    /// `content-length` is not a decimal integer
    InvalidContentLength(String),
    /// `content-length` disagrees with the actual body length
    ContentLengthMismatch { declared: usize, actual: usize },
    /// A non-empty body on a command that must not carry one
    BodyNotAllowed(StompCommand),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredHeader { command, header } => {
                write!(f, "{command} frame is missing the {header} header")
            }
            Self::InvalidContentLength(value) => {
                write!(f, "content-length is not a decimal integer: {value:?}")
            }
            Self::ContentLengthMismatch { declared, actual } => write!(
                f,
                "content-length {declared} does not match body length {actual}"
            ),
            Self::BodyNotAllowed(command) => {
                write!(f, "{command} frame must not carry a body")
            }
        }
    }
}

impl StdError for ValidationError {}

/// Either side of the codec error split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    Parse(ParseError),
    Validation(ValidationError),
}

impl FrameError {
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Validation(e) => write!(f, "validation error: {e}"),
        }
    }
}

impl StdError for FrameError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Validation(e) => Some(e),
        }
    }
}

impl From<ParseError> for FrameError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<ValidationError> for FrameError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::with_source(Kind::Frame, e)
    }
}

/// An immutable STOMP 1.2 frame.
///
/// Duplicate header names keep the first occurrence only, per STOMP 1.2.
/// Headers are stored ordered by name so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    command: StompCommand,
    headers: BTreeMap<StompHeader, String>,
    body: String,
}

impl StompFrame {
    /// Build a frame from parts, enforcing the rules of the emit path: the
    /// command's required headers, `content-length` agreement, and the
    /// body-carrying rule.
    pub fn new<I, V>(command: StompCommand, headers: I, body: impl Into<String>) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = (StompHeader, V)>,
        V: Into<String>,
    {
        let body = body.into();
        if !body.is_empty() && !command.allows_body() {
            return Err(ValidationError::BodyNotAllowed(command).into());
        }
        let mut map = BTreeMap::new();
        for (header, value) in headers {
            map.entry(header).or_insert_with(|| value.into());
        }
        let frame = Self {
            command,
            headers: map,
            body,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// The client connect frame, serialized with the `STOMP` command token.
    pub fn connect(host: &str, login: &str, passcode: &str) -> Result<Self, FrameError> {
        Self::new(
            StompCommand::Stomp,
            [
                (StompHeader::AcceptVersion, STOMP_VERSION),
                (StompHeader::Host, host),
                (StompHeader::Login, login),
                (StompHeader::Passcode, passcode),
            ],
            "",
        )
    }

    /// A subscribe frame asking for auto acknowledgement and a receipt
    /// correlated to the subscription id.
    pub fn subscribe(destination: &str, id: &str) -> Result<Self, FrameError> {
        Self::new(
            StompCommand::Subscribe,
            [
                (StompHeader::Ack, "auto"),
                (StompHeader::Destination, destination),
                (StompHeader::Id, id),
                (StompHeader::Receipt, id),
            ],
            "",
        )
    }

    pub fn disconnect() -> Result<Self, FrameError> {
        Self::new(StompCommand::Disconnect, std::iter::empty::<(StompHeader, String)>(), "")
    }

    /// Parse a whole frame from wire text.
    ///
    /// Trailing `\r?\n` sequences after the NUL terminator are ignored;
    /// anything else after it is an error. Validation runs on the parsed
    /// frame before it is returned, except for the body-carrying rule,
    /// which applies only to frames this client builds itself.
    pub fn parse(input: &str) -> Result<Self, FrameError> {
        let (command_line, mut rest) = read_line(input).ok_or(ParseError::MissingLineTerminator)?;
        let command = StompCommand::from_token(command_line)
            .ok_or_else(|| ParseError::UnknownCommand(command_line.to_owned()))?;

        let mut headers = BTreeMap::new();
        loop {
            let (line, tail) = read_line(rest).ok_or(ParseError::MissingLineTerminator)?;
            rest = tail;
            if line.is_empty() {
                break;
            }
            let (header, value) = parse_header_line(command, line)?;
            headers.entry(header).or_insert(value);
        }

        let Some(nul) = rest.find('\0') else {
            return Err(ParseError::MissingNullTerminator.into());
        };
        let body = &rest[..nul];
        let trailer = &rest[nul + 1..];
        if !trailer.chars().all(|c| c == '\r' || c == '\n') {
            return Err(ParseError::TrailingBytesAfterBody.into());
        }

        let frame = Self {
            command,
            headers,
            body: body.to_owned(),
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Check the command's required headers and `content-length` agreement.
    ///
    /// Deterministic and side-effect free; parsing already performs it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for header in self.command.required_headers() {
            if !self.headers.contains_key(header) {
                return Err(ValidationError::MissingRequiredHeader {
                    command: self.command,
                    header: *header,
                });
            }
        }
        if let Some(value) = self.headers.get(&StompHeader::ContentLength) {
            let declared: usize = value
                .parse()
                .map_err(|_| ValidationError::InvalidContentLength(value.clone()))?;
            if declared != self.body.len() {
                return Err(ValidationError::ContentLengthMismatch {
                    declared,
                    actual: self.body.len(),
                });
            }
        }
        Ok(())
    }

    /// Serialize to wire text: `COMMAND\n`, `name:value\n` per header, a
    /// blank line, the body and the NUL terminator. Header values are
    /// escape-encoded unless the command is connect-family.
    pub fn to_wire(&self) -> Result<String, FrameError> {
        self.validate()?;
        let mut out = String::with_capacity(self.wire_len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (header, value) in &self.headers {
            out.push_str(header.as_str());
            out.push(':');
            if self.command.raw_header_values() {
                out.push_str(value);
            } else {
                escape_into(value, &mut out);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        Ok(out)
    }

    fn wire_len(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(h, v)| h.as_str().len() + v.len() + 2)
            .sum();
        self.command.as_str().len() + 1 + headers + 1 + self.body.len() + 1
    }

    #[must_use]
    pub const fn command(&self) -> StompCommand {
        self.command
    }

    #[must_use]
    pub fn has_header(&self, header: StompHeader) -> bool {
        self.headers.contains_key(&header)
    }

    #[must_use]
    pub fn header(&self, header: StompHeader) -> Option<&str> {
        self.headers.get(&header).map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (StompHeader, &str)> {
        self.headers.iter().map(|(h, v)| (*h, v.as_str()))
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }
}

impl fmt::Display for StompFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.command)?;
        for (header, value) in &self.headers {
            writeln!(f, "{header}:{value}")?;
        }
        writeln!(f)?;
        f.write_str(&self.body)
    }
}

/// Split off one line, treating `\n` and `\r\n` as terminators.
fn read_line(input: &str) -> Option<(&str, &str)> {
    let end = input.find('\n')?;
    let line = input[..end].strip_suffix('\r').unwrap_or(&input[..end]);
    Some((line, &input[end + 1..]))
}

fn parse_header_line(
    command: StompCommand,
    line: &str,
) -> Result<(StompHeader, String), ParseError> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(ParseError::MalformedHeaderLine(line.to_owned()));
    };
    if name.is_empty() || line.contains('\r') {
        return Err(ParseError::MalformedHeaderLine(line.to_owned()));
    }
    if value.contains(':') {
        return Err(ParseError::ColonInHeaderValue(line.to_owned()));
    }
    let (name, value) = if command.raw_header_values() {
        (name.to_owned(), value.to_owned())
    } else {
        (unescape(name)?, unescape(value)?)
    };
    let header =
        StompHeader::from_name(&name).ok_or_else(|| ParseError::UnknownHeader(name.clone()))?;
    Ok((header, value))
}

/// Escape-encode a header value: `\\`, `\n`, `\r`, `\c`.
fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
}

/// Decode the escape sequences of a header name or value.
fn unescape(raw: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                return Err(ParseError::BadEscapeSequence(format!("\\{other}")));
            }
            None => return Err(ParseError::BadEscapeSequence("\\".to_owned())),
        }
    }
    Ok(out)
}
