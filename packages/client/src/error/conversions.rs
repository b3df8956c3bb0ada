use http::header::{InvalidHeaderName, InvalidHeaderValue};

use crate::config::ConfigurationError;

use super::types::{Error, Kind};

impl From<InvalidHeaderName> for Error {
    fn from(error: InvalidHeaderName) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(error: InvalidHeaderValue) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<ConfigurationError> for Error {
    fn from(error: ConfigurationError) -> Self {
        Error::new(Kind::Config).with(error)
    }
}
