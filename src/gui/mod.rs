use eframe::egui;
use crate::egui::*;
use crate::egui::widget_text::RichText;
use tokio::sync::mpsc::{channel, Sender, Receiver};
use tokio::sync::mpsc::error::TryRecvError;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use chrono::Utc;
use log;
use egui_extras::{TableBuilder, Column};

use crate::interface::*;
use crate::worker::worker_thread;

mod admin;
mod format;
mod ordering;
mod summary;
mod view;

use admin::{AdminGate, AddHomeForm};
use view::{HomeListView, HomeRow};

const AGE_REFRESH_PERIOD : Duration = Duration::from_secs(1);

struct PendingDelete {
  home_id : String,
  home_name : String,
  admin_key : String,
}

pub struct HomeDashboard {
  view : HomeListView,
  receiver : Receiver<DashboardEvent>,
  sender : Sender<DashboardCommand>,
  gate : AdminGate,
  form : AddHomeForm,
  default_admin_key : String,
  pending_delete : Option<PendingDelete>,
  notice : Option<String>,
  last_age_refresh : Instant,
}

impl HomeDashboard {
  pub fn new(cc : &eframe::CreationContext<'_>, cfg : DashboardConfig, cache_path : PathBuf) -> Self {

    log::debug!("HomeDashboard created with IntegrationInfo {:?}", cc.integration_info);
    const MAX_NUM_MESSAGES : usize = 10;

    let (worker_sender, gui_receiver) = channel::<DashboardEvent>(MAX_NUM_MESSAGES);
    let (gui_sender, worker_receiver) = channel::<DashboardCommand>(MAX_NUM_MESSAGES);

    let ctx = cc.egui_ctx.clone();

    let mut style = (*ctx.style()).clone();
    style.visuals.selection.bg_fill = Color32::DARK_GREEN;
    ctx.set_style(style);

    let gate = AdminGate::new(&cfg.admin_pass);
    let form = AddHomeForm::new(&cfg.admin_key);
    let default_admin_key = cfg.admin_key.clone();

    // it detaches but we are control it via channels
    thread::spawn(move|| worker_thread(worker_sender, worker_receiver, ctx, cfg, cache_path));

    HomeDashboard {
      view : HomeListView::new(),
      receiver : gui_receiver,
      sender : gui_sender,
      gate,
      form,
      default_admin_key,
      pending_delete : None,
      notice : None,
      last_age_refresh : Instant::now(),
    }
  }

  fn send_command(&self, cmd : DashboardCommand) {
    let name = cmd.name();
    if let Err( err ) = self.sender.try_send( cmd ) {
      log::error!("Failed to send {} command : {}. Ignoring.", name, err);
    }
  }

  fn apply_event(&mut self, event : DashboardEvent) {
    match event {
      DashboardEvent::Snapshot( snapshot ) => {
        log::debug!("recv: snapshot with {} homes", snapshot.homes.len());
        self.view.render(&snapshot, Utc::now());
        self.last_age_refresh = Instant::now();
      },
      DashboardEvent::HomeAdded { home_id } => {
        self.form.clear_secrets();
        self.notice = Some( format!("Success! home_id={}", home_id) );
      },
      DashboardEvent::HomeDeleted { home_id } => {
        self.view.remove_home(&home_id);
        self.notice = Some( format!("Deleted home {}", home_id) );
      },
      DashboardEvent::AdminFailed { message } => {
        self.notice = Some( message );
      },
    }
  }

  fn top_bar(&mut self, ui : &mut Ui) {
    ui.horizontal(|ui| {
      ui.heading("Homes");
      ui.separator();
      ui.label( RichText::new(format!("Last refresh: {}", self.view.last_refresh)).weak() );
      if let Some( note ) = &self.view.server_note {
        ui.label( RichText::new(note).color(Color32::YELLOW) );
      }

      ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
        if self.gate.is_unlocked() {
          if ui.button("Lock admin").clicked() {
            self.gate.lock();
          }
        } else if ui.button("Admin").clicked() {
          self.gate.open_prompt();
        }
        if ui.button("Refresh").clicked() {
          self.send_command( DashboardCommand::Refresh );
        }
      });
    });

    let mut dismiss = false;
    if let Some( notice ) = &self.notice {
      ui.horizontal(|ui| {
        ui.label( RichText::new(notice).color(Color32::LIGHT_BLUE) );
        dismiss = ui.small_button("✖").clicked();
      });
    }
    if dismiss {
      self.notice = None;
    }
  }

  fn home_list(&mut self, ui : &mut Ui) {
    let mut toggled : Option<usize> = None;
    let mut delete_requested : Option<usize> = None;

    ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
      if self.view.rows.is_empty() {
        ui.label( RichText::new("No homes yet").weak() );
      }
      for (index, row) in self.view.rows.iter().enumerate() {
        ui.push_id(index, |ui| {
          ui.group(|ui| {
            let (toggle, delete) = home_header(ui, row);
            if toggle {
              toggled = Some( index );
            }
            if delete {
              delete_requested = Some( index );
            }
            if row.expanded {
              device_table(ui, row);
            }
          });
        });
      }
    });

    if let Some( index ) = toggled {
      self.view.toggle(index);
    }
    if let Some( row ) = delete_requested.and_then(|i| self.view.rows.get(i)) {
      self.pending_delete = Some( PendingDelete {
        home_id : row.home_id.clone(),
        home_name : row.name.clone(),
        admin_key : self.default_admin_key.clone(),
      } );
    }
  }

  fn delete_dialog(&mut self, ctx : &Context) {
    let mut confirmed = false;
    let mut cancelled = false;

    if let Some( pending ) = &mut self.pending_delete {
      Window::new("Delete home")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
          ui.label(format!("Delete \"{}\"?", pending.home_name));
          ui.horizontal(|ui| {
            ui.label("Admin key");
            ui.add( TextEdit::singleline(&mut pending.admin_key).password(true) );
          });
          ui.horizontal(|ui| {
            confirmed = ui.button("Delete").clicked();
            cancelled = ui.button("Cancel").clicked();
          });
        });
    }

    if confirmed {
      if let Some( pending ) = self.pending_delete.take() {
        self.send_command( DashboardCommand::DeleteHome { home_id : pending.home_id, admin_key : pending.admin_key } );
      }
    } else if cancelled {
      self.pending_delete = None;
    }
  }

  fn admin_gate_dialog(&mut self, ctx : &Context) {
    if !self.gate.prompt_open {
      return;
    }
    let mut enter = false;
    let mut cancel = false;

    Window::new("Admin")
      .collapsible(false)
      .resizable(false)
      .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
      .show(ctx, |ui| {
        let response = ui.add( TextEdit::singleline(&mut self.gate.input).password(true).hint_text("password") );
        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
          enter = true;
        }
        if !self.gate.error.is_empty() {
          ui.label( RichText::new(&self.gate.error).color(Color32::RED) );
        }
        ui.horizontal(|ui| {
          enter |= ui.button("Enter").clicked();
          cancel = ui.button("Cancel").clicked();
        });
      });

    if enter {
      self.gate.try_unlock();
    } else if cancel {
      self.gate.prompt_open = false;
    }
  }

  fn admin_panel(&mut self, ui : &mut Ui) {
    ui.heading("Add home");
    Grid::new("add home form").num_columns(2).show(ui, |ui| {
      ui.label("Home name");
      ui.text_edit_singleline(&mut self.form.home_name);
      ui.end_row();
      ui.label("PAT");
      ui.add( TextEdit::singleline(&mut self.form.pat).password(true) );
      ui.end_row();
      ui.label("Country");
      ui.add( TextEdit::singleline(&mut self.form.country).hint_text(admin::DEFAULT_COUNTRY) );
      ui.end_row();
      ui.label("Server");
      ui.add( TextEdit::singleline(&mut self.form.server).hint_text("service default") );
      ui.end_row();
      ui.label("Client id");
      ui.add( TextEdit::singleline(&mut self.form.client_id).hint_text("generated") );
      ui.end_row();
      ui.label("Admin key");
      ui.add( TextEdit::singleline(&mut self.form.admin_key).password(true) );
      ui.end_row();
    });
    if ui.button("Add home").clicked() {
      self.notice = None;
      self.send_command( DashboardCommand::AddHome { home : self.form.to_new_home(), admin_key : self.form.admin_key.clone() } );
    }
  }
}

impl eframe::App for HomeDashboard {
  fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {

    //every message matters here: deletes and admin results must not be skipped
    loop {
      match self.receiver.try_recv() {
        Ok( event ) => self.apply_event(event),
        Err( TryRecvError::Disconnected ) => {
          log::error!("Worker thread is dead. Closing...");
          frame.close();
          break;
        },
        _ => break,
      }
    }

    if self.last_age_refresh.elapsed() >= AGE_REFRESH_PERIOD {
      self.view.refresh_ages(Utc::now());
      self.last_age_refresh = Instant::now();
    }
    ctx.request_repaint_after(AGE_REFRESH_PERIOD);

    egui::TopBottomPanel::top("top bar").show(ctx, |ui| {
      self.top_bar(ui);
    });

    if self.gate.is_unlocked() {
      egui::SidePanel::right("admin panel").show(ctx, |ui| {
        self.admin_panel(ui);
      });
    }

    egui::CentralPanel::default().show(ctx, |ui| {
      self.home_list(ui);
    });

    self.delete_dialog(ctx);
    self.admin_gate_dialog(ctx);

    let typing = ctx.memory(|m| m.focus().is_some());
    if !typing && ctx.input( |i| i.key_pressed(Key::Q) ) {
      frame.close();
    }
  }
}

/// Returns (toggle clicked, delete clicked).
fn home_header(ui : &mut Ui, row : &HomeRow) -> (bool, bool) {
  let mut toggle = false;
  let mut delete = false;

  ui.horizontal(|ui| {
    let arrow = if row.expanded { "▼" } else { "▶" };
    let title = RichText::new(format!("{} {}", arrow, row.name)).heading();
    if ui.add( Label::new(title).sense(Sense::click()) ).clicked() {
      toggle = true;
    }
    ui.label("|");
    ui.label( status_pill(row) );
    ui.label("|");
    ui.label( RichText::new(&row.offline_label).weak() );
    ui.label("|");
    ui.label( RichText::new(&row.age_label).weak() );

    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
      if ui.button("Delete").clicked() {
        delete = true;
      }
    });
  });

  (toggle, delete)
}

fn status_pill(row : &HomeRow) -> RichText {
  let color = match row.status.style_class() {
    "online" => Color32::DARK_GREEN,
    "partial" => Color32::from_rgb(160, 110, 0),
    _ => Color32::DARK_RED,
  };
  RichText::new(format!(" {} ", row.status.as_str()))
    .color(Color32::WHITE)
    .background_color(color)
    .strong()
}

fn device_table(ui : &mut Ui, row : &HomeRow) {
  ui.label( RichText::new("Devices:").strong() );

  TableBuilder::new(ui)
    .vscroll(false)
    .column(Column::auto())
    .column(Column::remainder())
    .body(|body| {
      body.rows(20.0, row.devices.len(), |row_index, mut table_row| {
        let line = &row.devices[row_index];
        table_row.col(|ui| {
          ui.label( line.text.as_str() );
        });
        table_row.col(|ui| {
          ui.label( RichText::new(format!("Control: {}", line.control.label())).weak() );
        });
      });
    });

  if let Some( err ) = &row.error_line {
    ui.label( RichText::new(err).color(Color32::LIGHT_RED) );
  }
}
