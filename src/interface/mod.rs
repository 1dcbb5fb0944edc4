use serde::{Serialize, Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Explicit `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer : D) -> Result<T, D::Error>
  where D : Deserializer<'de>,
        T : Default + Deserialize<'de>
{
  Ok( Option::<T>::deserialize(deserializer)?.unwrap_or_default() )
}

/// One complete status payload as served by `GET /api/status`.
/// The cache file stores exactly this structure.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Snapshot {
  #[serde(default)]
  pub last_refresh : Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub homes : Vec<Home>,
  #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
  pub meta : Option<RefresherMeta>,
}

/// State of the server side refresher, sent along with every status payload.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct RefresherMeta {
  #[serde(default, deserialize_with = "null_as_default")]
  pub cache_ts : f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub updating : bool,
  #[serde(default)]
  pub last_error : Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub refresh_interval_sec : u64,
  #[serde(default)]
  pub last_success_iso : Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Home {
  #[serde(default, deserialize_with = "null_as_default")]
  pub home_id : String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub home_name : String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub home_status : HomeStatus,
  #[serde(default, deserialize_with = "null_as_default")]
  pub offline_count : i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub total_devices : i64,
  #[serde(default)]
  pub updated_at : Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub devices : Vec<Device>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error : Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HomeStatus {
  Online,
  Partial,
  #[default]
  #[serde(other)]
  Offline,
}

impl HomeStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      HomeStatus::Online => "ONLINE",
      HomeStatus::Partial => "PARTIAL",
      HomeStatus::Offline => "OFFLINE",
    }
  }

  /// Style class of the status pill.
  pub fn style_class(&self) -> &'static str {
    match self {
      HomeStatus::Online => "online",
      HomeStatus::Partial => "partial",
      HomeStatus::Offline => "offline",
    }
  }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Device {
  #[serde(default, alias = "device_id", deserialize_with = "null_as_default")]
  pub id : String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub name : String,
  #[serde(rename = "type", default, deserialize_with = "null_as_default")]
  pub kind : DeviceKind,
  #[serde(default, deserialize_with = "null_as_default")]
  pub online : bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub raw_type : Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary : Option<String>,
  /// Shape depends on `kind`; may be partial, a list, or missing altogether.
  #[serde(default)]
  pub state : Value,
}

/// Device type tag. Values this client does not know are kept verbatim.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum DeviceKind {
  AirConditioner,
  Refrigerator,
  Washer,
  Dryer,
  #[default]
  Other,
  Unknown(String),
}

impl DeviceKind {
  pub fn as_str(&self) -> &str {
    match self {
      DeviceKind::AirConditioner => "AIR_CONDITIONER",
      DeviceKind::Refrigerator => "REFRIGERATOR",
      DeviceKind::Washer => "WASHER",
      DeviceKind::Dryer => "DRYER",
      DeviceKind::Other => "OTHER",
      DeviceKind::Unknown( s ) => s,
    }
  }

  /// Only air conditioners have a (planned) control surface.
  pub fn is_actionable(&self) -> bool {
    *self == DeviceKind::AirConditioner
  }
}

impl From<String> for DeviceKind {
  fn from(s : String) -> Self {
    match s.as_str() {
      "AIR_CONDITIONER" => DeviceKind::AirConditioner,
      "REFRIGERATOR" => DeviceKind::Refrigerator,
      "WASHER" => DeviceKind::Washer,
      "DRYER" => DeviceKind::Dryer,
      "OTHER" => DeviceKind::Other,
      _ => DeviceKind::Unknown(s),
    }
  }
}

impl From<DeviceKind> for String {
  fn from(kind : DeviceKind) -> String {
    kind.as_str().to_string()
  }
}

impl fmt::Display for DeviceKind {
  fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Body of `POST /api/admin/homes`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct NewHome {
  pub home_name : String,
  pub pat : String,
  pub country : String,
  pub server : String,
  pub client_id : String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReason {
  FirstNoCache,
  AlignedTick,
  Interval,
  Manual,
  AddHome,
  Delete,
}

impl fmt::Display for LoadReason {
  fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      LoadReason::FirstNoCache => "first_no_cache",
      LoadReason::AlignedTick => "aligned_tick",
      LoadReason::Interval => "interval",
      LoadReason::Manual => "manual",
      LoadReason::AddHome => "add_home",
      LoadReason::Delete => "delete",
    };
    f.write_str(s)
  }
}

/// GUI -> worker
#[derive(Debug)]
pub enum DashboardCommand {
  Refresh,
  AddHome { home : NewHome, admin_key : String },
  DeleteHome { home_id : String, admin_key : String },
}

impl DashboardCommand {
  /// For logs; the payloads carry secrets.
  pub fn name(&self) -> &'static str {
    match self {
      DashboardCommand::Refresh => "Refresh",
      DashboardCommand::AddHome { .. } => "AddHome",
      DashboardCommand::DeleteHome { .. } => "DeleteHome",
    }
  }
}

/// worker -> GUI
#[derive(Debug, Clone)]
pub enum DashboardEvent {
  Snapshot(Snapshot),
  HomeAdded { home_id : String },
  HomeDeleted { home_id : String },
  AdminFailed { message : String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DashboardConfig {
  pub server_url : String,
  pub poll_interval_ms : u64,
  pub http_timeout_secs : u64,
  pub admin_key : String,
  pub admin_pass : String,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    DashboardConfig {
      server_url : String::from("http://127.0.0.1:5000"),
      poll_interval_ms : 180_000,
      http_timeout_secs : 12,
      admin_key : String::new(),
      admin_pass : String::from("1234"),
    }
  }
}
