use crate::interface::NewHome;

pub const DEFAULT_COUNTRY : &str = "KR";

/// Client side passcode in front of the admin panel. Keeps casual clicks
/// out, nothing more; the service checks the admin key itself.
pub struct AdminGate {
  passcode : String,
  unlocked : bool,
  pub prompt_open : bool,
  pub input : String,
  pub error : String,
}

impl AdminGate {
  pub fn new(passcode : &str) -> Self {
    AdminGate {
      passcode : passcode.to_string(),
      unlocked : false,
      prompt_open : false,
      input : String::new(),
      error : String::new(),
    }
  }

  pub fn is_unlocked(&self) -> bool {
    self.unlocked
  }

  pub fn open_prompt(&mut self) {
    self.prompt_open = true;
    self.input.clear();
    self.error.clear();
  }

  pub fn try_unlock(&mut self) -> bool {
    if self.input == self.passcode {
      self.unlocked = true;
      self.prompt_open = false;
    } else {
      self.error = String::from("Wrong password");
    }
    self.input.clear();
    self.unlocked
  }

  pub fn lock(&mut self) {
    self.unlocked = false;
  }
}

#[derive(Default)]
pub struct AddHomeForm {
  pub home_name : String,
  pub pat : String,
  pub country : String,
  pub server : String,
  pub client_id : String,
  pub admin_key : String,
}

impl AddHomeForm {
  pub fn new(admin_key : &str) -> Self {
    AddHomeForm { admin_key : admin_key.to_string(), ..Default::default() }
  }

  /// Trimmed request body; blank country means the default one.
  pub fn to_new_home(&self) -> NewHome {
    let country = self.country.trim();
    NewHome {
      home_name : self.home_name.trim().to_string(),
      pat : self.pat.trim().to_string(),
      country : if country.is_empty() { DEFAULT_COUNTRY.to_string() } else { country.to_string() },
      server : self.server.trim().to_string(),
      client_id : self.client_id.trim().to_string(),
    }
  }

  /// Forget the secrets once the home has been created.
  pub fn clear_secrets(&mut self) {
    self.home_name.clear();
    self.pat.clear();
    self.client_id.clear();
  }
}
