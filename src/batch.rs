use crate::error::{Error, Result};
use crate::types::ProbeId;
use serde::Serialize;

/// A contiguous, non-empty slice of the campaign's probe set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Batch<'a> {
    /// 1-based position of this batch within the probe set.
    pub index: usize,
    pub probes: &'a [ProbeId],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

/// Splits `probes` into batches of `capacity`, the last one possibly shorter.
///
/// Batches are produced lazily and in input order; concatenating them yields
/// `probes` exactly. An empty probe set yields no batches.
pub fn partition(probes: &[ProbeId], capacity: usize) -> Result<impl Iterator<Item = Batch<'_>>> {
    if capacity == 0 {
        return Err(Error::InvalidArgument("batch capacity must be > 0".into()));
    }
    Ok(probes
        .chunks(capacity)
        .enumerate()
        .map(|(i, probes)| Batch {
            index: i + 1,
            probes,
        }))
}

/// Number of batches `partition` produces for `len` probes.
pub fn batch_count(len: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    len.div_ceil(capacity)
}
