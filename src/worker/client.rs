use crate::egui::Context; // b/c of re-export
use log;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;

use crate::interface::*;
use super::api::ApiClient;
use super::cache::CacheStore;

pub type SharedCache = Arc<Mutex<Box<dyn CacheStore + Send>>>;

/// Single entry point for every retrieval, whatever triggered it.
/// Cloning is cheap; clones share the cache and the GUI channel.
#[derive(Clone)]
pub struct StatusClient {
  api : ApiClient,
  cache : SharedCache,
  sender : Sender<DashboardEvent>,
  ctx : Context,
}

impl StatusClient {
  pub fn new(api : ApiClient, cache : Box<dyn CacheStore + Send>, sender : Sender<DashboardEvent>, ctx : Context) -> Self {
    StatusClient { api, cache : Arc::new(Mutex::new(cache)), sender, ctx }
  }

  /// Shows the cached snapshot right away; without one, fetches immediately
  /// instead of waiting for the first aligned tick.
  pub async fn start(&self) {
    let cached = self.lock_cache().load();
    match cached {
      Some( snapshot ) => {
        log::info!("Rendering cached status with {} homes", snapshot.homes.len());
        self.publish(DashboardEvent::Snapshot(snapshot));
      },
      None => self.load(LoadReason::FirstNoCache).await,
    }
  }

  /// One retrieval cycle. Failures leave both the view and the cache as they are.
  pub async fn load(&self, reason : LoadReason) {
    log::debug!("load: {}", reason);
    match self.api.fetch_status().await {
      Ok( snapshot ) => self.accept(snapshot),
      Err( e ) => log::warn!("load ({}) failed : {}", reason, e),
    }
  }

  /// Cache write and hand-over to the GUI happen under the same lock.
  pub fn accept(&self, snapshot : Snapshot) {
    let mut cache = self.lock_cache();
    if let Err( e ) = cache.save(&snapshot) {
      log::warn!("Failed to cache status : {}", e);
    }
    self.publish(DashboardEvent::Snapshot(snapshot));
  }

  pub async fn add_home(&self, home : NewHome, admin_key : &str) {
    match self.api.add_home(&home, admin_key).await {
      Err( e ) => {
        log::warn!("Adding home {:?} failed : {}", home.home_name, e);
        self.deliver(DashboardEvent::AdminFailed { message : format!("Failed: {}", e) }).await;
      },
      Ok( home_id ) => {
        log::info!("Added home {:?} as {}", home.home_name, home_id);
        self.deliver(DashboardEvent::HomeAdded { home_id }).await;
        self.load(LoadReason::AddHome).await;
      },
    }
  }

  pub async fn delete_home(&self, home_id : &str, admin_key : &str) {
    match self.api.delete_home(home_id, admin_key).await {
      Err( e ) => {
        log::warn!("Deleting home {} failed : {}", home_id, e);
        self.deliver(DashboardEvent::AdminFailed { message : format!("Delete failed: {}", e) }).await;
      },
      Ok(()) => {
        self.forget_home(home_id).await;
        self.load(LoadReason::Delete).await;
      },
    }
  }

  /// Drops a deleted home from cache and view without waiting for a resync.
  pub async fn forget_home(&self, home_id : &str) {
    let pruned = self.lock_cache().prune(home_id);
    if let Err( e ) = pruned {
      log::warn!("Failed to prune {} from cached status : {}", home_id, e);
    }
    self.deliver(DashboardEvent::HomeDeleted { home_id : home_id.to_string() }).await;
  }

  fn lock_cache(&self) -> MutexGuard<'_, Box<dyn CacheStore + Send>> {
    match self.cache.lock() {
      Ok( guard ) => guard,
      Err( poisoned ) => {
        log::error!("Cache lock is poisoned, using it anyway");
        poisoned.into_inner()
      },
    }
  }

  /// Snapshots may be dropped when the GUI lags; the next one supersedes them.
  fn publish(&self, event : DashboardEvent) {
    match self.sender.try_send(event) {
      Ok(()) => self.ctx.request_repaint(),
      Err( TrySendError::Full( _ ) ) => {
        log::warn!("Failed to send event, GUI is not consuming it!");
      },
      Err( TrySendError::Closed( _ ) ) => {
        log::warn!("Failed to send event - channel is closed. Probably GUI is dead.");
      },
    }
  }

  /// Admin outcomes happen once, so they wait for room in the channel.
  async fn deliver(&self, event : DashboardEvent) {
    match self.sender.send(event).await {
      Ok(()) => self.ctx.request_repaint(),
      Err( _ ) => log::warn!("Failed to send event - channel is closed. Probably GUI is dead."),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::worker::cache::MemoryCacheStore;
  use serde_json::json;
  use std::time::Duration;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use tokio::sync::mpsc::{channel, Receiver};

  /// (method, path, status, body)
  type Route = (&'static str, &'static str, u16, String);

  /// Minimal HTTP/1.1 responder, one request per connection.
  async fn fake_service(routes : Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      loop {
        let (mut sock, _) = match listener.accept().await {
          Ok( s ) => s,
          Err( _ ) => break,
        };
        let request = read_request(&mut sock).await;
        let first_line = request.lines().next().unwrap_or_default().to_string();
        let (status, body) = routes.iter()
          .find(|(method, path, _, _)| first_line.starts_with(&format!("{} {} ", method, path)))
          .map(|(_, _, status, body)| (*status, body.clone()))
          .unwrap_or((404, String::from("{}")));
        let response = format!(
          "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
          status, body.len(), body);
        let _ = sock.write_all(response.as_bytes()).await;
        let _ = sock.shutdown().await;
      }
    });
    format!("http://{}", addr)
  }

  async fn read_request(sock : &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
      let n = sock.read(&mut chunk).await.unwrap_or(0);
      if n == 0 {
        break;
      }
      buf.extend_from_slice(&chunk[..n]);
      let text = String::from_utf8_lossy(&buf).to_string();
      if let Some( end ) = text.find("\r\n\r\n") {
        let content_length = text[..end].lines()
          .filter_map(|l| l.split_once(':'))
          .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
          .and_then(|(_, v)| v.trim().parse::<usize>().ok())
          .unwrap_or(0);
        if buf.len() >= end + 4 + content_length {
          break;
        }
      }
    }
    String::from_utf8_lossy(&buf).to_string()
  }

  fn status_body(ids : &[&str]) -> String {
    let homes : Vec<serde_json::Value> = ids.iter()
      .map(|id| json!({ "home_id": id, "home_name": id, "home_status": "ONLINE" }))
      .collect();
    json!({ "last_refresh": "2024-05-01T12:00:00+00:00", "homes": homes }).to_string()
  }

  fn cached(ids : &[&str]) -> MemoryCacheStore {
    MemoryCacheStore::with_raw(status_body(ids).as_bytes())
  }

  fn make_client(base_url : &str, cache : MemoryCacheStore) -> (StatusClient, Receiver<DashboardEvent>) {
    let (tx, rx) = channel(10);
    // local fake service: keep proxies from the environment out of the way
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let api = ApiClient::with_client(http, base_url, Duration::from_secs(2));
    (StatusClient::new(api, Box::new(cache), tx, Context::default()), rx)
  }

  fn cached_ids(client : &StatusClient) -> Option<Vec<String>> {
    client.lock_cache().load().map(|s| s.homes.into_iter().map(|h| h.home_id).collect())
  }

  fn snapshot_ids(event : DashboardEvent) -> Vec<String> {
    match event {
      DashboardEvent::Snapshot( s ) => s.homes.into_iter().map(|h| h.home_id).collect(),
      other => panic!("expected snapshot, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn start_renders_cache_without_network() {
    // nothing listens here; a network call would not produce an event
    let (client, mut rx) = make_client("http://127.0.0.1:1", cached(&["a", "b"]));
    client.start().await;
    assert_eq!(snapshot_ids(rx.try_recv().unwrap()), vec!["a", "b"]);
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn start_without_cache_fetches_and_caches() {
    let base = fake_service(vec![("GET", "/api/status", 200, status_body(&["x"]))]).await;
    let (client, mut rx) = make_client(&base, MemoryCacheStore::default());
    client.start().await;
    assert_eq!(snapshot_ids(rx.try_recv().unwrap()), vec!["x"]);
    assert_eq!(cached_ids(&client), Some(vec!["x".to_string()]));
  }

  #[tokio::test]
  async fn failed_load_keeps_cache_and_view() {
    let base = fake_service(vec![("GET", "/api/status", 500, String::from("{}"))]).await;
    let (client, mut rx) = make_client(&base, cached(&["a"]));
    client.load(LoadReason::Manual).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(cached_ids(&client), Some(vec!["a".to_string()]));

    let (client, mut rx) = make_client("http://127.0.0.1:1", cached(&["a"]));
    client.load(LoadReason::Interval).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(cached_ids(&client), Some(vec!["a".to_string()]));
  }

  #[tokio::test]
  async fn delete_prunes_before_resync() {
    // status keeps failing, so only the prune can have removed the home
    let base = fake_service(vec![
      ("DELETE", "/api/admin/homes/b", 200, json!({ "ok": true, "deleted": "b" }).to_string()),
      ("GET", "/api/status", 503, String::from("{}")),
    ]).await;
    let (client, mut rx) = make_client(&base, cached(&["a", "b", "c"]));

    client.delete_home("b", "secret").await;

    match rx.try_recv().unwrap() {
      DashboardEvent::HomeDeleted { home_id } => assert_eq!(home_id, "b"),
      other => panic!("unexpected {:?}", other),
    }
    assert!(rx.try_recv().is_err());
    assert_eq!(cached_ids(&client), Some(vec!["a".to_string(), "c".to_string()]));
  }

  #[tokio::test]
  async fn deleted_home_waits_for_a_busy_gui() {
    let (client, mut rx) = make_client("http://127.0.0.1:1", cached(&["a", "b"]));
    for _ in 0..10 {
      client.publish(DashboardEvent::Snapshot(Snapshot::default()));
    }

    let forget = {
      let client = client.clone();
      tokio::spawn(async move { client.forget_home("b").await })
    };

    let mut events = Vec::new();
    while events.len() < 11 {
      events.push(rx.recv().await.unwrap());
    }
    forget.await.unwrap();

    match events.pop().unwrap() {
      DashboardEvent::HomeDeleted { home_id } => assert_eq!(home_id, "b"),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(cached_ids(&client), Some(vec!["a".to_string()]));
  }

  #[tokio::test]
  async fn rejected_delete_changes_nothing() {
    let base = fake_service(vec![
      ("DELETE", "/api/admin/homes/b", 401, json!({ "error": "unauthorized" }).to_string()),
    ]).await;
    let (client, mut rx) = make_client(&base, cached(&["a", "b"]));

    client.delete_home("b", "wrong").await;

    match rx.try_recv().unwrap() {
      DashboardEvent::AdminFailed { message } => assert_eq!(message, "Delete failed: unauthorized"),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(cached_ids(&client), Some(vec!["a".to_string(), "b".to_string()]));
  }

  #[tokio::test]
  async fn add_home_then_resync() {
    let base = fake_service(vec![
      ("POST", "/api/admin/homes", 200, json!({ "ok": true, "home_id": "n3w1d" }).to_string()),
      ("GET", "/api/status", 200, status_body(&["a", "n3w1d"])),
    ]).await;
    let (client, mut rx) = make_client(&base, cached(&["a"]));

    let home = NewHome { home_name : "Daegu".to_string(), pat : "pat".to_string(), country : "KR".to_string(), ..Default::default() };
    client.add_home(home, "").await;

    match rx.try_recv().unwrap() {
      DashboardEvent::HomeAdded { home_id } => assert_eq!(home_id, "n3w1d"),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(snapshot_ids(rx.try_recv().unwrap()), vec!["a", "n3w1d"]);
  }

  #[tokio::test]
  async fn rejected_add_reports_status_when_body_is_silent() {
    let base = fake_service(vec![("POST", "/api/admin/homes", 400, String::from("not json"))]).await;
    let (client, mut rx) = make_client(&base, MemoryCacheStore::default());

    client.add_home(NewHome::default(), "").await;

    match rx.try_recv().unwrap() {
      DashboardEvent::AdminFailed { message } => assert_eq!(message, "Failed: 400"),
      other => panic!("unexpected {:?}", other),
    }
    assert!(rx.try_recv().is_err());
  }
}
