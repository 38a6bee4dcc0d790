use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the remote directory service.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
  /// Connect or read timeout elapsed
  #[error("Timed out waiting for the directory service")]
  Timeout,

  /// Connection refused, reset, DNS failure or other transport-level I/O error
  #[error("Directory service unreachable: {0}")]
  Unreachable(String),

  /// The request could not be built (bad URL, unserializable body)
  #[error("Invalid request to directory service: {0}")]
  InvalidRequest(String),

  /// Non-success HTTP status
  #[error("Directory service returned {status}: {body}")]
  Status { status: StatusCode, body: String },

  /// Body could not be decoded into the expected envelope
  #[error("Malformed response from directory service: {0}")]
  Decode(String),

  /// Envelope decoded but carried no `data`
  #[error("Directory service returned no data: {0}")]
  EmptyResponse(String),
}

impl RemoteError {
  /// Network-class failures worth retrying.
  ///
  /// Only timeouts and transport errors qualify; HTTP status errors and
  /// malformed bodies will not get better by asking again.
  pub fn is_transient(&self) -> bool {
    matches!(self, RemoteError::Timeout | RemoteError::Unreachable(_))
  }

  /// True when the remote answered 404.
  pub fn is_not_found(&self) -> bool {
    matches!(self, RemoteError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
  }

  pub fn from_status(status: StatusCode, body: String) -> Self {
    RemoteError::Status { status, body }
  }
}

impl From<reqwest::Error> for RemoteError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      RemoteError::Timeout
    } else if err.is_builder() {
      RemoteError::InvalidRequest(err.to_string())
    } else if err.is_decode() {
      RemoteError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
      RemoteError::Status {
        status,
        body: String::new(),
      }
    } else {
      RemoteError::Unreachable(err.to_string())
    }
  }
}

impl From<serde_json::Error> for RemoteError {
  fn from(err: serde_json::Error) -> Self {
    RemoteError::Decode(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transient_classification() {
    assert!(RemoteError::Timeout.is_transient());
    assert!(RemoteError::Unreachable("connection refused".to_string()).is_transient());

    assert!(!RemoteError::Decode("eof".to_string()).is_transient());
    assert!(!RemoteError::EmptyResponse("no data".to_string()).is_transient());
    assert!(!RemoteError::InvalidRequest("bad url".to_string()).is_transient());
    assert!(
      !RemoteError::from_status(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_transient()
    );
    assert!(
      !RemoteError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient()
    );
  }

  #[test]
  fn test_not_found_detection() {
    assert!(RemoteError::from_status(StatusCode::NOT_FOUND, String::new()).is_not_found());
    assert!(!RemoteError::from_status(StatusCode::BAD_REQUEST, String::new()).is_not_found());
    assert!(!RemoteError::Timeout.is_not_found());
  }

  #[test]
  fn test_from_serde_error() {
    let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
    assert!(matches!(RemoteError::from(err), RemoteError::Decode(_)));
  }

  #[test]
  fn test_display() {
    let err = RemoteError::from_status(StatusCode::BAD_GATEWAY, "upstream".to_string());
    assert_eq!(
      err.to_string(),
      "Directory service returned 502 Bad Gateway: upstream"
    );
  }
}
