//! View model of the home list.
//!
//! `HomeListView::render` rebuilds every row from a snapshot while carrying
//! the expanded/collapsed flag of each home over from the previous rows.
//! The egui frame only paints this model and flips `expanded` on click.

use std::collections::HashSet;
use chrono::{DateTime, Utc};

use crate::interface::{Snapshot, HomeStatus};
use super::format::relative_age;
use super::ordering::sort_devices;
use super::summary::summarize;

#[derive(Debug, Clone, PartialEq)]
pub struct HomeRow {
  pub home_id : String,
  pub name : String,
  pub status : HomeStatus,
  pub offline_label : String,
  /// Raw timestamp, kept so the age label can be re-formatted on its own.
  pub updated_at : Option<String>,
  pub age_label : String,
  pub expanded : bool,
  pub devices : Vec<DeviceLine>,
  pub error_line : Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceLine {
  pub text : String,
  pub control : Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// Control API is not there yet.
  Pending,
  ReadOnly,
}

impl Control {
  pub fn label(&self) -> &'static str {
    match self {
      Control::Pending => "(TODO: control API)",
      Control::ReadOnly => "(read-only)",
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct HomeListView {
  pub last_refresh : String,
  pub server_note : Option<String>,
  pub rows : Vec<HomeRow>,
}

impl HomeListView {
  pub fn new() -> Self {
    HomeListView { last_refresh : String::from("-"), server_note : None, rows : Vec::new() }
  }

  /// Replaces all rows. Homes keep the snapshot order, devices are sorted.
  pub fn render(&mut self, snapshot : &Snapshot, now : DateTime<Utc>) {
    let expanded : HashSet<String> = self.rows.iter()
      .filter(|row| row.expanded)
      .map(|row| row.home_id.clone())
      .collect();

    self.rows.clear();

    self.last_refresh = snapshot.last_refresh.clone()
      .filter(|s| !s.is_empty())
      .unwrap_or_else(|| String::from("-"));

    self.server_note = snapshot.meta.as_ref().and_then(|meta| {
      if let Some( err ) = &meta.last_error {
        Some( format!("server refresh failed: {}", err) )
      } else if meta.updating {
        Some( String::from("server is refreshing…") )
      } else {
        None
      }
    });

    for home in &snapshot.homes {
      let devices = sort_devices(&home.devices).into_iter()
        .map(|dev| DeviceLine {
          text : format!("- {} ({}) | {} | {}",
            dev.name,
            dev.kind,
            if dev.online { "ONLINE" } else { "OFFLINE" },
            summarize(dev)),
          control : if dev.kind.is_actionable() { Control::Pending } else { Control::ReadOnly },
        })
        .collect();

      self.rows.push(HomeRow {
        home_id : home.home_id.clone(),
        name : home.home_name.clone(),
        status : home.home_status,
        offline_label : format!("Offline {}/{}", home.offline_count, home.total_devices),
        updated_at : home.updated_at.clone(),
        age_label : age_label(home.updated_at.as_deref(), now),
        expanded : expanded.contains(&home.home_id),
        devices,
        error_line : home.error.as_ref().map(|e| format!("Error: {}", e)),
      });
    }
  }

  /// Re-formats only the age labels.
  pub fn refresh_ages(&mut self, now : DateTime<Utc>) {
    for row in self.rows.iter_mut() {
      row.age_label = age_label(row.updated_at.as_deref(), now);
    }
  }

  pub fn toggle(&mut self, index : usize) {
    if let Some( row ) = self.rows.get_mut(index) {
      row.expanded = !row.expanded;
    }
  }

  /// Drops a home's row right away, without waiting for the next snapshot.
  pub fn remove_home(&mut self, home_id : &str) -> bool {
    let before = self.rows.len();
    self.rows.retain(|row| row.home_id != home_id);
    self.rows.len() != before
  }
}

fn age_label(iso : Option<&str>, now : DateTime<Utc>) -> String {
  format!("Updated {}", relative_age(iso, now))
}
