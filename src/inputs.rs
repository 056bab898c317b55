use crate::{
    atlas::MeasurementPlatform,
    error::{Error, Result},
    types::ProbeId,
};
use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// What `--probes` asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSelection {
    All,
    Ids(Vec<ProbeId>),
}

impl ProbeSelection {
    /// Turns the selection into a concrete probe list.
    pub fn resolve<P: MeasurementPlatform + ?Sized>(self, platform: &P) -> anyhow::Result<Vec<ProbeId>> {
        match self {
            ProbeSelection::Ids(ids) => Ok(ids),
            ProbeSelection::All => {
                info!("fetching all connected probes");
                let ids = platform
                    .list_active_probe_ids()
                    .with_context(|| "listing connected probes")?;
                info!("found {} connected probe(s)", ids.len());
                Ok(dedup_ids(ids))
            }
        }
    }
}

/// `ALL`, a probe-id file, or a comma-separated list of ids.
pub fn parse_probe_arg(arg: &str) -> Result<ProbeSelection> {
    let arg = arg.trim();
    if arg.eq_ignore_ascii_case("all") {
        return Ok(ProbeSelection::All);
    }
    let raw = read_list_source(arg)?;
    let ids = parse_probe_list(&raw)?;
    if ids.is_empty() {
        return Err(Error::InvalidArgument(format!("no probe ids in '{arg}'")));
    }
    Ok(ProbeSelection::Ids(ids))
}

/// Parses ids separated by commas and/or newlines; `#` starts a comment.
pub fn parse_probe_list(raw: &str) -> Result<Vec<ProbeId>> {
    let mut ids = Vec::new();
    for item in list_items(raw) {
        let id = item
            .parse::<ProbeId>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid probe id: '{item}'")))?;
        ids.push(id);
    }
    Ok(dedup_ids(ids))
}

/// A hitlist file or a comma-separated list of IPs / hostnames.
pub fn parse_target_arg(arg: &str) -> Result<Vec<String>> {
    let raw = read_list_source(arg.trim())?;
    let targets = parse_target_list(&raw);
    if targets.is_empty() {
        return Err(Error::InvalidArgument(format!("no targets in '{arg}'")));
    }
    Ok(targets)
}

pub fn parse_target_list(raw: &str) -> Vec<String> {
    list_items(raw).map(str::to_string).collect()
}

fn read_list_source(arg: &str) -> Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        info!("reading list from {}", path.display());
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(arg.to_string())
}

fn list_items(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn dedup_ids(ids: Vec<ProbeId>) -> Vec<ProbeId> {
    let mut seen = HashSet::with_capacity(ids.len());
    let before = ids.len();
    let out: Vec<ProbeId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if out.len() < before {
        warn!("dropped {} duplicate probe id(s)", before - out.len());
    }
    out
}
