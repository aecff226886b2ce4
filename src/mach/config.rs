use crate::lang::Dialect;
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Program store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Keyword set for tokenising and listing.
    pub dialect: Dialect,
    /// Whether a loaded protected program stays protected.
    pub allow_protect: bool,
    /// Lines above this number are left out of LIST and ASCII saves.
    pub hide_listing: u16,
    /// Address of the program buffer, the base of next-line pointers.
    pub code_start: u16,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            dialect: Dialect::default(),
            allow_protect: false,
            hide_listing: 65535,
            code_start: 0x126D,
        }
    }
}

impl Config {
    /// Defaults overridden by `BASIC_SYNTAX`, `BASIC_ALLOW_PROTECT` and
    /// `BASIC_HIDE_LISTING`. Unusable values are logged and ignored.
    pub fn from_env() -> Config {
        let mut config = Config::default();
        if let Some(dialect) = var("BASIC_SYNTAX") {
            config.dialect = dialect;
        }
        if let Some(allow) = var::<Flag>("BASIC_ALLOW_PROTECT") {
            config.allow_protect = allow.0;
        }
        if let Some(hide) = var("BASIC_HIDE_LISTING") {
            config.hide_listing = hide;
        }
        config
    }
}

fn var<T: FromStr>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {}={:?}", key, value);
            None
        }
    }
}

struct Flag(bool);

impl FromStr for Flag {
    type Err = ();
    fn from_str(s: &str) -> Result<Flag, ()> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Flag(true)),
            "0" | "false" | "no" | "off" => Ok(Flag(false)),
            _ => Err(()),
        }
    }
}
