use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::{PoisonError, RwLock};

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub const DEFAULT_P2P_ADDR: &str = "127.0.0.1:6001";
pub const DEFAULT_CONTROL_ADDR: &str = "127.0.0.1:3001";

const P2P_ADDRESS_KEY: &str = "P2P_ADDRESS";
const CONTROL_ADDRESS_KEY: &str = "CONTROL_ADDRESS";
const PEERS_KEY: &str = "PEERS";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Defaults, overridden by `P2P_ADDRESS`, `CONTROL_ADDRESS` and `PEERS`
    pub fn new() -> Config {
        let mut map = HashMap::new();
        for key in [P2P_ADDRESS_KEY, CONTROL_ADDRESS_KEY, PEERS_KEY] {
            if let Ok(value) = env::var(key) {
                map.insert(String::from(key), value);
            }
        }
        Self::from_map(map)
    }

    pub fn from_map(map: HashMap<String, String>) -> Config {
        Config {
            inner: RwLock::new(map),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(String::from(key), value);
    }

    pub fn get_p2p_addr(&self) -> String {
        self.get(P2P_ADDRESS_KEY)
            .unwrap_or_else(|| String::from(DEFAULT_P2P_ADDR))
    }

    pub fn set_p2p_addr(&self, addr: String) {
        self.set(P2P_ADDRESS_KEY, addr);
    }

    pub fn get_control_addr(&self) -> String {
        self.get(CONTROL_ADDRESS_KEY)
            .unwrap_or_else(|| String::from(DEFAULT_CONTROL_ADDR))
    }

    pub fn set_control_addr(&self, addr: String) {
        self.set(CONTROL_ADDRESS_KEY, addr);
    }

    /// Peers to dial at startup, comma separated in the environment
    pub fn get_initial_peers(&self) -> Vec<String> {
        self.get(PEERS_KEY)
            .map(|peers| {
                peers
                    .split(',')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_initial_peers(&self, peers: &[String]) {
        self.set(PEERS_KEY, peers.join(","));
    }
}
