use std::cmp::Ordering;
use crate::interface::Device;

/// Display order of the devices of one home: offline first, then by type,
/// then by name. The input slice is left untouched.
pub fn sort_devices(devices : &[Device]) -> Vec<&Device> {
  let mut sorted : Vec<&Device> = devices.iter().collect();
  sorted.sort_by(|a, b| compare_devices(a, b));
  sorted
}

fn compare_devices(a : &Device, b : &Device) -> Ordering {
  // false < true, so offline devices come first
  a.online.cmp(&b.online)
    .then_with(|| compare_text(a.kind.as_str(), b.kind.as_str()))
    .then_with(|| compare_text(&a.name, &b.name))
}

/// Case-insensitive, with the exact text as tie-break so the order stays total.
fn compare_text(a : &str, b : &str) -> Ordering {
  a.to_lowercase().cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}
