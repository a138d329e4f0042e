use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Error from the STOMP frame codec, either parsing or validation
    Frame,
    /// Error related to the WebSocket transport
    WebSocket,
    /// Error reported by the STOMP session layer
    Session,
    /// Error related to a non-successful HTTP call
    Status,
    /// Error related to process configuration
    Config,
    /// Internal error from dependencies
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Config {
            reason: message.into(),
        }
        .into()
    }

    #[cfg(feature = "download")]
    pub fn status<S: Into<String>>(status_code: u16, url: S) -> Self {
        Status {
            status_code,
            url: url.into(),
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct Config {
    pub reason: String,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.reason)
    }
}

impl StdError for Config {}

impl From<Config> for Error {
    fn from(err: Config) -> Self {
        Error::with_source(Kind::Config, err)
    }
}

#[cfg(feature = "download")]
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: u16,
    pub url: String,
}

#[cfg(feature = "download")]
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error({}) fetching {}", self.status_code, self.url)
    }
}

#[cfg(feature = "download")]
impl StdError for Status {}

#[cfg(feature = "download")]
impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Status, err)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

#[cfg(feature = "download")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

#[cfg(feature = "download")]
impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_should_succeed() {
        let error = Error::config("missing LTNM_USERNAME");
        assert_eq!(error.kind(), Kind::Config);
        assert!(error.to_string().contains("missing LTNM_USERNAME"));
    }

    #[test]
    fn downcast_recovers_source() {
        let error = Error::config("bad port");
        let config = error.downcast_ref::<Config>().expect("missing source");
        assert_eq!(config.reason, "bad port");
    }
}
