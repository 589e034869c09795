//! Server configuration shape (§6), loadable as plain `serde::Deserialize`
//! structs — matching `opcua-server/src/config/*` — from TOML for tests and
//! the demo binary. The XML loader that populates this struct in
//! production is an external collaborator; we only specify the struct
//! shape it must produce.

use std::collections::HashMap;

use chrono::NaiveTime;
use mdp_types::{BinDecl, FidTable};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Per-request overrides are capped here regardless of what a client asks
/// for (§4.1.4, §6). Not a config knob: the grammar fixes this at 90.
pub const MAX_OFFSET_AND_DAYS: u32 = 90;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service_name: String,
    pub session_name: String,
    pub connection_name: String,
    pub publisher_name: String,
    /// `rssl` server host:port list, in priority order.
    #[serde(default)]
    pub rssl_servers: Vec<String>,
    #[serde(default = "defaults::default_port")]
    pub default_port: u16,

    /// Size of each worker's pre-sized field-encoding scratch buffer.
    #[serde(default = "defaults::maximum_data_size")]
    pub maximum_data_size: usize,
    #[serde(default = "defaults::session_capacity")]
    pub session_capacity: usize,
    #[serde(default = "defaults::worker_count")]
    pub worker_count: usize,

    /// Whitespace-separated list of symbols, read from `symbolmap_path` by
    /// the (external) XML loader and materialized here as a flat list.
    #[serde(default)]
    pub symbol_map: Vec<String>,

    /// IANA time zone name used to resolve "today" before the business-day
    /// walk, absent an `open`/`close`/`tz` override on the request.
    pub tz: String,
    /// Default lookback day count, used when a request carries no `days`
    /// override.
    #[serde(default = "defaults::default_day_count")]
    pub default_day_count: u32,

    /// Named bin declarations (`NAME=HH:MM-HH:MM`), config-level presets.
    /// The item-name grammar (§6) has no bin-name selector, so exactly one
    /// entry — `default_bin_name` — is ever active for a running provider;
    /// the rest are carried for completeness and future per-service
    /// selection (§9 design notes call this out as unresolved upstream).
    pub bins: HashMap<String, BinDeclConfig>,
    pub default_bin_name: String,

    /// FID sets per named bin's realtime response (§6). Must contain an
    /// entry for `default_bin_name`.
    pub realtime_fids: HashMap<String, FidTableConfig>,
    /// FID set for historical/archive responses. Carried for completeness;
    /// this provider issues only snapshot responses (no persisted archive
    /// replay — an explicit Non-goal), so it is never read at runtime.
    pub archive_fids: Option<FidTableConfig>,

    #[serde(default)]
    pub cool: Option<CoolConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BinDeclConfig {
    pub start_time: String,
    pub end_time: String,
}

impl BinDeclConfig {
    fn parse_time(s: &str) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map_err(|_| ConfigError::InvalidBinDecl(s.to_string(), mdp_types::Error::InvalidBinDecl(s.to_string())))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FidTableConfig {
    pub timact: i32,
    pub activ_date: i32,
    pub vma: i32,
    pub nzero_vma: i32,
    pub num_moves: i32,
    pub nm_high: i32,
    pub nm_low: i32,
    pub nm_small: i32,
    pub pctchg_10d: i32,
    pub pctchg_15d: i32,
    pub pctchg_20d: i32,
    pub pctchg_10t: i32,
    pub pctchg_15t: i32,
    pub pctchg_20t: i32,
}

impl From<FidTableConfig> for FidTable {
    fn from(c: FidTableConfig) -> Self {
        FidTable {
            timact: c.timact,
            activ_date: c.activ_date,
            vma: c.vma,
            nzero_vma: c.nzero_vma,
            num_moves: c.num_moves,
            nm_high: c.nm_high,
            nm_low: c.nm_low,
            nm_small: c.nm_small,
            pctchg_10d: c.pctchg_10d,
            pctchg_15d: c.pctchg_15d,
            pctchg_20d: c.pctchg_20d,
            pctchg_10t: c.pctchg_10t,
            pctchg_15t: c.pctchg_15t,
            pctchg_20t: c.pctchg_20t,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoolConfig {
    #[serde(default = "defaults::history_table_size")]
    pub history_table_size: usize,
    #[serde(default)]
    pub registered_names: Vec<String>,
}

impl ServerConfig {
    /// Required-field checks returning a descriptive error, mirroring
    /// `original_source/src/config.cc`'s `gomi::config_t::validate()`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::MissingField("service_name"));
        }
        if self.session_name.is_empty() {
            return Err(ConfigError::MissingField("session_name"));
        }
        if self.worker_count == 0 {
            return Err(ConfigError::WorkerCountZero);
        }
        if self.session_capacity == 0 {
            return Err(ConfigError::SessionCapacityZero);
        }
        if !self.bins.contains_key(&self.default_bin_name) {
            return Err(ConfigError::UnknownDefaultBin(self.default_bin_name.clone()));
        }
        if !self.realtime_fids.contains_key(&self.default_bin_name) {
            return Err(ConfigError::UnknownDefaultBin(self.default_bin_name.clone()));
        }
        Ok(())
    }

    /// Resolve the active default [`BinDecl`], folding in `tz` and
    /// `default_day_count`.
    pub fn default_bin_decl(&self) -> Result<BinDecl, ConfigError> {
        let cfg = self
            .bins
            .get(&self.default_bin_name)
            .ok_or_else(|| ConfigError::UnknownDefaultBin(self.default_bin_name.clone()))?;
        let start = BinDeclConfig::parse_time(&cfg.start_time)?;
        let end = BinDeclConfig::parse_time(&cfg.end_time)?;
        BinDecl::new(self.default_bin_name.clone(), start, end, self.tz.clone(), self.default_day_count)
            .map_err(|e| ConfigError::InvalidBinDecl(self.default_bin_name.clone(), e))
    }

    pub fn default_fid_table(&self) -> Result<FidTable, ConfigError> {
        self.realtime_fids
            .get(&self.default_bin_name)
            .copied()
            .map(FidTable::from)
            .ok_or_else(|| ConfigError::UnknownDefaultBin(self.default_bin_name.clone()))
    }
}

mod defaults {
    pub fn default_port() -> u16 {
        14002
    }
    pub fn maximum_data_size() -> usize {
        65536
    }
    pub fn session_capacity() -> usize {
        1000
    }
    pub fn worker_count() -> usize {
        4
    }
    pub fn default_day_count() -> u32 {
        1
    }
    pub fn history_table_size() -> usize {
        64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerConfig {
        ServerConfig {
            service_name: "MDP".into(),
            session_name: "mdp-session".into(),
            connection_name: "mdp-connection".into(),
            publisher_name: "mdp-publisher".into(),
            rssl_servers: vec!["localhost:14002".into()],
            default_port: 14002,
            maximum_data_size: 65536,
            session_capacity: 100,
            worker_count: 4,
            symbol_map: vec!["IBM.N".into()],
            tz: "America/New_York".into(),
            default_day_count: 1,
            bins: HashMap::from([(
                "open30".into(),
                BinDeclConfig {
                    start_time: "09:00".into(),
                    end_time: "09:30".into(),
                },
            )]),
            default_bin_name: "open30".into(),
            realtime_fids: HashMap::from([(
                "open30".into(),
                FidTableConfig {
                    timact: 1010,
                    activ_date: 17,
                    vma: 30001,
                    nzero_vma: 30002,
                    num_moves: 30003,
                    nm_high: 30004,
                    nm_low: 30005,
                    nm_small: 30006,
                    pctchg_10d: 30007,
                    pctchg_15d: 30008,
                    pctchg_20d: 30009,
                    pctchg_10t: 30010,
                    pctchg_15t: 30011,
                    pctchg_20t: 30012,
                },
            )]),
            archive_fids: None,
            cool: None,
        }
    }

    #[test]
    fn validates_a_well_formed_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_default_bin() {
        let mut cfg = sample();
        cfg.default_bin_name = "missing".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::UnknownDefaultBin(_))));
    }

    #[test]
    fn rejects_zero_worker_count() {
        let mut cfg = sample();
        cfg.worker_count = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::WorkerCountZero)));
    }

    #[test]
    fn resolves_default_bin_decl() {
        let decl = sample().default_bin_decl().unwrap();
        assert_eq!(decl.day_count(), 1);
        assert_eq!(decl.timezone(), "America/New_York");
    }
}
