use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
  /// The status or admin endpoint could not be reached or returned garbage.
  #[error("network failure: {0}")]
  Network(#[from] reqwest::Error),

  /// Non-2xx answer from an admin endpoint. Displays the server message,
  /// or the status code when the server did not give one.
  #[error("{}", admin_message(.status, .message))]
  AdminRejected { status : u16, message : Option<String> },

  #[error("cache write failed: {0}")]
  Cache(String),
}

fn admin_message(status : &u16, message : &Option<String>) -> String {
  match message {
    Some( m ) => m.clone(),
    None => status.to_string(),
  }
}
