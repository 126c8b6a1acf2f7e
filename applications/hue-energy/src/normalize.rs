//! Turns raw bridge state into the effective brightness used for estimation.

/// Highest brightness the bridge reports.
pub const MAX_BRIGHTNESS: u8 = 254;

/// One light as reported by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub key: String,
    pub model: String,
    pub on: bool,
    /// Absent for non-dimmable devices such as plugs.
    pub brightness: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSample {
    pub key: String,
    pub model: String,
    pub brightness: u8,
}

/// Derive the short device key from a bridge unique id such as
/// `00:17:88:01:02:3b:5d:20-0b`: the last three MAC bytes, colons removed
/// (`3b5d20`).
pub fn device_key(unique_id: &str) -> String {
    let mac = unique_id.split('-').next().unwrap_or(unique_id);
    let mut tail: Vec<&str> = mac.rsplit(':').take(3).collect();
    tail.reverse();
    tail.concat().to_lowercase()
}

/// Off lights report their last brightness; it is ignored. A missing brightness
/// on a light that is on means fully on.
pub fn normalize(raw: &RawSample) -> NormalizedSample {
    let brightness = if raw.on {
        raw.brightness.unwrap_or(MAX_BRIGHTNESS).min(MAX_BRIGHTNESS)
    } else {
        0
    };
    NormalizedSample {
        key: raw.key.clone(),
        model: raw.model.clone(),
        brightness,
    }
}

pub fn normalize_all(raw: &[RawSample]) -> Vec<NormalizedSample> {
    raw.iter().map(normalize).collect()
}
