use crate::egui::Context; // b/c of re-export
use tokio::sync::mpsc::{Sender, Receiver};
use tokio;
use log;
use futures::future::{self, Either};
use std::path::PathBuf;
use std::time::Duration;
use crate::interface::*;

mod api;
mod cache;
mod client;
mod scheduler;

pub use cache::CACHE_FILE_NAME;
use api::ApiClient;
use cache::FileCacheStore;
use client::StatusClient;
use scheduler::{PollScheduler, unix_now_ms};

#[tokio::main]
pub async fn worker_thread(sender : Sender<DashboardEvent>, receiver : Receiver<DashboardCommand>, ctx : Context, cfg : DashboardConfig, cache_path : PathBuf) {
  let result = worker_thread_prime(sender, receiver, ctx, cfg, cache_path).await;
  if let Err ( e ) = result {
    log::error!("Error in worker_thread : {}. exiting....", e);
  }
}

pub async fn worker_thread_prime(sender : Sender<DashboardEvent>, receiver : Receiver<DashboardCommand>, ctx : Context, cfg : DashboardConfig, cache_path : PathBuf) -> Result<(), String> {

  let api = ApiClient::new(&cfg.server_url, Duration::from_secs(cfg.http_timeout_secs)).map_err(|e| e.to_string())?;
  log::info!("Status endpoint {}, cache file {}", api.status_url(), cache_path.display());

  let client = StatusClient::new(api, Box::new(FileCacheStore::new(cache_path)), sender, ctx);

  let startup = client.clone();
  tokio::task::spawn(async move { startup.start().await });

  let h1 = tokio::task::spawn( poll_loop(client.clone(), Duration::from_millis(cfg.poll_interval_ms)) );
  let h2 = tokio::task::spawn( execute_command_loop(receiver, client, cfg.admin_key) );

  // the poll loop never ends on its own; the command loop ends with the GUI
  match future::select(h1, h2).await {
    Either::Left( (res, _) ) => {
      if let Err( e ) = res {
        log::warn!("poll_loop task is failed... {:?}", e);
      }
    },
    Either::Right( (res, h1) ) => {
      if let Err( e ) = res {
        log::warn!("execute_command_loop task is failed... {:?}", e);
      }
      h1.abort();
    },
  }

  Ok(())
}

async fn poll_loop(client : StatusClient, interval : Duration) {
  let mut scheduler = PollScheduler::new(interval);
  scheduler.run(unix_now_ms(), move |reason| {
    let client = client.clone();
    tokio::task::spawn(async move { client.load(reason).await });
  }).await;
}

async fn execute_command_loop(
  mut receiver : Receiver<DashboardCommand>,
  client : StatusClient,
  default_admin_key : String,
  )
{
  loop {
    match receiver.recv().await {
      Some( cmd ) => execute_command( &client, cmd, &default_admin_key ),
      None => {
        log::warn!("Failed to receive command, probably GUI is dead. Exiting...");
        break;
      },
    };
  }
}

/// Commands run as their own tasks, so a slow admin call never holds up a refresh.
fn execute_command(client : &StatusClient, cmd : DashboardCommand, default_admin_key : &str)
{
  log::debug!("Got CMD: {}", cmd.name());
  let client = client.clone();
  match cmd {
    DashboardCommand::Refresh => {
      tokio::task::spawn(async move { client.load(LoadReason::Manual).await });
    },
    DashboardCommand::AddHome { home, admin_key } => {
      let admin_key = pick_admin_key(admin_key, default_admin_key);
      tokio::task::spawn(async move { client.add_home(home, &admin_key).await });
    },
    DashboardCommand::DeleteHome { home_id, admin_key } => {
      let admin_key = pick_admin_key(admin_key, default_admin_key);
      tokio::task::spawn(async move { client.delete_home(&home_id, &admin_key).await });
    },
  };
}

fn pick_admin_key(given : String, default_admin_key : &str) -> String {
  let given = given.trim();
  if given.is_empty() {
    default_admin_key.trim().to_string()
  } else {
    given.to_string()
  }
}
