use serde::{Deserialize, Serialize};

pub const DEFAULT_USERNAME: &str = "Player";
/// Offline sessions still pass a token; the game ignores its value.
pub const OFFLINE_ACCESS_TOKEN: &str = "0";

/// The player the game is started as. Only offline play is supported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfflineProfile {
    pub username: String,
    pub uuid: String,
}

impl OfflineProfile {
    pub fn new(username: &str) -> Self {
        let username = match username.trim() {
            "" => DEFAULT_USERNAME,
            name => name,
        };
        Self {
            username: username.to_string(),
            uuid: offline_identity(username),
        }
    }
}

/// Deterministic identity for `name`: the 32-bit `h = h * 31 + c` hash over
/// the UTF-16 units of `OfflinePlayer:<name>`, laid out as
/// `XXXXXXXX-0000-0000-0000-000000000000`.
pub fn offline_identity(name: &str) -> String {
    let seed = format!("OfflinePlayer:{}", name);
    let hash = seed
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    format!("{:08x}-0000-0000-0000-000000000000", hash)
}
