use crate::{
    atlas::ProbeDirectory,
    error::{Error, Result},
    pool,
    table::Table,
    types::{ProbeId, ProbeMetadata},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// How a single identifier cell was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdCell {
    Missing,
    Invalid(String),
    Valid(ProbeId),
}

/// Coerces an identifier cell to a probe id.
///
/// Integral float text (`"1001.0"`) is accepted, since tables that once held
/// missing values store their id column as floats.
pub fn parse_id_cell(raw: &str) -> IdCell {
    let s = raw.trim();
    if s.is_empty() || ["nan", "na", "null", "none"].iter().any(|m| s.eq_ignore_ascii_case(m)) {
        return IdCell::Missing;
    }
    if let Ok(id) = s.parse::<ProbeId>() {
        return if id > 0 {
            IdCell::Valid(id)
        } else {
            IdCell::Invalid(s.to_string())
        };
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            IdCell::Valid(f as ProbeId)
        }
        _ => IdCell::Invalid(s.to_string()),
    }
}

static UNKNOWN: ProbeMetadata = ProbeMetadata::UNKNOWN;

/// Metadata per distinct probe id, scoped to one enrichment run.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    entries: HashMap<ProbeId, ProbeMetadata>,
}

impl MetadataCache {
    pub fn insert(&mut self, id: ProbeId, meta: ProbeMetadata) {
        self.entries.insert(id, meta);
    }

    /// Metadata for `id`, or [`ProbeMetadata::UNKNOWN`] when it was never resolved.
    pub fn get(&self, id: ProbeId) -> &ProbeMetadata {
        self.entries.get(&id).unwrap_or(&UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attaches probe metadata columns to a table keyed by a probe id column.
pub struct MetadataEnricher<'a, D: ProbeDirectory + ?Sized> {
    directory: &'a D,
    id_column: String,
    workers: usize,
}

impl<'a, D: ProbeDirectory + ?Sized> MetadataEnricher<'a, D> {
    pub fn new(directory: &'a D, id_column: impl Into<String>, workers: usize) -> Self {
        Self {
            directory,
            id_column: id_column.into(),
            workers,
        }
    }

    /// Looks up one probe; any failure yields the unknown record.
    pub fn lookup(&self, id: ProbeId) -> ProbeMetadata {
        match self.directory.lookup(id) {
            Ok(detail) => ProbeMetadata::from(detail),
            Err(err) => {
                warn!("could not fetch metadata for probe {id}: {err:#}");
                ProbeMetadata::UNKNOWN
            }
        }
    }

    /// Resolves every distinct, well-formed id in the table's id column.
    pub fn build_cache(&self, table: &Table) -> Result<MetadataCache> {
        let idx = self.id_index(table)?;

        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        let mut invalid = HashSet::new();
        for cell in table.column(idx) {
            match parse_id_cell(cell) {
                IdCell::Valid(id) => {
                    if seen.insert(id) {
                        distinct.push(id);
                    }
                }
                IdCell::Invalid(raw) => {
                    if invalid.insert(raw.clone()) {
                        warn!("invalid probe id '{raw}'; using unknown metadata");
                    }
                }
                IdCell::Missing => {}
            }
        }

        info!("fetching metadata for {} unique probe(s)", distinct.len());
        let fetched = pool::map_bounded(&distinct, self.workers, |i, id| {
            let done = i + 1;
            if done % 10 == 0 {
                debug!("metadata progress {}/{}", done, distinct.len());
            }
            self.lookup(*id)
        });

        let mut cache = MetadataCache::default();
        for (id, meta) in distinct.into_iter().zip(fetched) {
            cache.insert(id, meta);
        }
        Ok(cache)
    }

    /// Returns a copy of `table` with the seven metadata columns populated.
    ///
    /// Fails with `InvalidInput` before any lookup if the id column is absent.
    pub fn enrich(&self, table: &Table) -> Result<Table> {
        info!("found {} row(s) with probe ids", table.len());
        let cache = self.build_cache(table)?;
        let idx = self.id_index(table)?;
        let enriched = join(table, idx, &cache);
        info!("enriched {} row(s)", enriched.len());
        Ok(enriched)
    }

    fn id_index(&self, table: &Table) -> Result<usize> {
        table.column_index(&self.id_column).ok_or_else(|| {
            Error::InvalidInput(format!("table must contain a '{}' column", self.id_column))
        })
    }
}

/// Attaches cached metadata to every row of `table`.
///
/// Metadata columns already present are overwritten where they stand; the
/// rest are appended in [`ProbeMetadata::COLUMNS`] order. Row count is
/// preserved.
pub fn join(table: &Table, id_idx: usize, cache: &MetadataCache) -> Table {
    let mut headers = table.headers.clone();
    let targets: Vec<usize> = ProbeMetadata::COLUMNS
        .iter()
        .map(|col| match headers.iter().position(|h| h == col) {
            Some(pos) => pos,
            None => {
                headers.push((*col).to_string());
                headers.len() - 1
            }
        })
        .collect();
    let width = headers.len();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let meta = match parse_id_cell(row.get(id_idx).map(String::as_str).unwrap_or("")) {
                IdCell::Valid(id) => cache.get(id),
                _ => &UNKNOWN,
            };
            let mut out = row.clone();
            out.resize(width.max(out.len()), String::new());
            for (pos, cell) in targets.iter().zip(meta.cells()) {
                out[*pos] = cell;
            }
            out
        })
        .collect();

    Table { headers, rows }
}
