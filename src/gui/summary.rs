use serde_json::Value;
use crate::interface::{Device, DeviceKind};
use super::format::PLACEHOLDER;

static NULL : Value = Value::Null;

/// One line status of a device. Never fails: whatever is missing from the
/// state payload degrades to the placeholder.
pub fn summarize(device : &Device) -> String {
  if !device.online {
    return String::from("OFFLINE");
  }
  if let Some( summary ) = device.summary.as_deref().filter(|s| !s.is_empty()) {
    return summary.to_string();
  }

  let state = &device.state;
  match device.kind {
    DeviceKind::AirConditioner => {
      let mode = text_at(state, &["operation", "airConOperationMode"]).unwrap_or_else(placeholder);
      let target = text_at(state, &["temperature", "targetTemperature"]).unwrap_or_else(placeholder);
      let unit = text_at(state, &["temperature", "unit"]).unwrap_or_default();
      format!("{} | Target {}{}", mode, target, unit)
    },
    DeviceKind::Washer => {
      let first = match state {
        Value::Array( items ) => items.first().unwrap_or(&NULL),
        other => other,
      };
      text_at(first, &["runState", "currentState"]).unwrap_or_else(placeholder)
    },
    _ => placeholder(),
  }
}

fn placeholder() -> String {
  PLACEHOLDER.to_string()
}

/// Text of the value at `path`; `None` when any step is missing or null.
fn text_at(value : &Value, path : &[&str]) -> Option<String> {
  let mut cur = value;
  for key in path {
    cur = cur.get(*key)?;
  }
  match cur {
    Value::Null => None,
    Value::String( s ) => Some( s.clone() ),
    Value::Number( n ) => Some( number_text(n) ),
    other => Some( other.to_string() ),
  }
}

/// `24.0` prints as `24`, `22.5` stays `22.5`.
fn number_text(n : &serde_json::Number) -> String {
  match n.as_f64() {
    Some( f ) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
    _ => n.to_string(),
  }
}
