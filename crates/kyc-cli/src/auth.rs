//! Bearer-token sources for the CLI.

use std::path::PathBuf;

use kyc_core::{AuthProvider, StaticToken};

/// A token kept in a file, re-read on every request so a token rotated by
/// another process is picked up without restarting.
#[derive(Debug, Clone)]
pub struct TokenFile {
  path: PathBuf,
}

impl TokenFile {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl AuthProvider for TokenFile {
  fn bearer_token(&self) -> Option<String> {
    match std::fs::read_to_string(&self.path) {
      Ok(raw) => {
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_owned())
      }
      Err(e) => {
        tracing::debug!(path = %self.path.display(), error = %e, "token file unreadable");
        None
      }
    }
  }
}

/// Whichever token source the command line and config file selected.
#[derive(Debug, Clone)]
pub enum Credentials {
  Static(StaticToken),
  File(TokenFile),
}

impl AuthProvider for Credentials {
  fn bearer_token(&self) -> Option<String> {
    match self {
      Self::Static(token) => token.bearer_token(),
      Self::File(file) => file.bearer_token(),
    }
  }
}
