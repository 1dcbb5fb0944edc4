mod error;
mod interface;
mod worker;
mod gui;

use eframe::egui;
use env_logger;
use std::path::PathBuf;
use gui::HomeDashboard;
use interface::DashboardConfig;

const APP_NAME : &str = "thinq-dashboard";

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let cfg : DashboardConfig = match confy::load(APP_NAME, None) {
    Ok( cfg ) => cfg,
    Err( e ) => {
      log::error!("Failed to load configuration : {}. Using defaults.", e);
      DashboardConfig::default()
    },
  };
  let cache_path = cache_file_path();

  let mut native_options = eframe::NativeOptions::default();
  native_options.initial_window_size = Some( egui::vec2(1024.0, 720.0) );

  if let Err( e ) = eframe::run_native(
      "Home Dashboard",
      native_options,
      Box::new(|cc| Box::new(HomeDashboard::new(cc, cfg, cache_path)) )
    )  {
    log::error!("Failed to run Home Dashboard {:?}", e);
  };
}

/// The cached status lives next to the configuration file.
fn cache_file_path() -> PathBuf {
  match confy::get_configuration_file_path(APP_NAME, None) {
    Ok( cfg_path ) => cfg_path.with_file_name(worker::CACHE_FILE_NAME),
    Err( e ) => {
      log::warn!("Can't locate configuration directory : {}. Caching in working directory.", e);
      PathBuf::from(worker::CACHE_FILE_NAME)
    },
  }
}
