use reqwest;
use reqwest::{Response, StatusCode};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Deserialize;
use std::time::Duration;

use crate::error::DashboardError;
use crate::interface::{NewHome, Snapshot};

const ADMIN_KEY_HEADER : &str = "x-admin-key";

#[derive(Deserialize, Default)]
struct ErrorBody {
  #[serde(default)]
  error : Option<String>,
}

#[derive(Deserialize)]
struct AddHomeReply {
  home_id : String,
}

/// Thin client of the dashboard service.
#[derive(Clone)]
pub struct ApiClient {
  client : reqwest::Client,
  base_url : String,
  timeout : Duration,
}

impl ApiClient {
  pub fn new(base_url : &str, timeout : Duration) -> Result<Self, DashboardError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok( ApiClient::with_client(client, base_url, timeout) )
  }

  pub fn with_client(client : reqwest::Client, base_url : &str, timeout : Duration) -> Self {
    ApiClient {
      client,
      base_url : base_url.trim_end_matches('/').to_string(),
      timeout,
    }
  }

  pub fn status_url(&self) -> String {
    format!("{}/api/status", self.base_url)
  }

  pub fn homes_url(&self) -> String {
    format!("{}/api/admin/homes", self.base_url)
  }

  pub fn home_url(&self, home_id : &str) -> String {
    format!("{}/api/admin/homes/{}", self.base_url, home_id)
  }

  /// `GET /api/status`, always bypassing intermediate caches.
  pub async fn fetch_status(&self) -> Result<Snapshot, DashboardError> {
    let snapshot = self.client.get(self.status_url())
      .header(CACHE_CONTROL, "no-store")
      .header(PRAGMA, "no-cache")
      .timeout(self.timeout)
      .send().await?
      .error_for_status()?
      .json::<Snapshot>().await?;
    Ok(snapshot)
  }

  /// Returns the id the service assigned to the new home.
  pub async fn add_home(&self, home : &NewHome, admin_key : &str) -> Result<String, DashboardError> {
    let mut req = self.client.post(self.homes_url())
      .json(home)
      .timeout(self.timeout);
    if !admin_key.is_empty() {
      req = req.header(ADMIN_KEY_HEADER, admin_key);
    }

    let res = admin_result(req.send().await?).await?;
    let reply = res.json::<AddHomeReply>().await?;
    Ok(reply.home_id)
  }

  pub async fn delete_home(&self, home_id : &str, admin_key : &str) -> Result<(), DashboardError> {
    let mut req = self.client.delete(self.home_url(home_id))
      .timeout(self.timeout);
    if !admin_key.is_empty() {
      req = req.header(ADMIN_KEY_HEADER, admin_key);
    }
    admin_result(req.send().await?).await?;
    Ok(())
  }
}

async fn admin_result(res : Response) -> Result<Response, DashboardError> {
  let status = res.status();
  if status.is_success() {
    return Ok(res);
  }
  let body = res.json::<ErrorBody>().await.unwrap_or_default();
  Err( rejection(status, body) )
}

fn rejection(status : StatusCode, body : ErrorBody) -> DashboardError {
  DashboardError::AdminRejected {
    status : status.as_u16(),
    message : body.error.filter(|m| !m.is_empty()),
  }
}
