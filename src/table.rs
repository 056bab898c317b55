use crate::error::{Error, Result};
use crate::types::NormalizedRecord;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// An in-memory, header-having table of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell values of one column; short rows read as empty.
    pub fn column<'a>(&'a self, idx: usize) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .map(move |r| r.get(idx).map(String::as_str).unwrap_or(""))
    }
}

/// Where an enriched table goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSink {
    NewFile(PathBuf),
    InPlace,
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = BufReader::new(File::open(path)?);
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Plain or gzip-compressed output stream.
enum Sink<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Sink<W> {
    fn new(out: W, gzip: bool) -> Self {
        if gzip {
            Sink::Gzip(GzEncoder::new(out, Compression::default()))
        } else {
            Sink::Plain(out)
        }
    }

    fn finish(self) -> std::io::Result<W> {
        let mut inner = match self {
            Sink::Plain(w) => w,
            Sink::Gzip(enc) => enc.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(enc) => enc.flush(),
        }
    }
}

/// Runs `body` against a headerless CSV writer over `out`, then finishes the
/// compression stream.
fn with_writer<W, F>(out: W, gzip: bool, body: F) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut csv::Writer<Sink<W>>) -> Result<()>,
{
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Sink::new(out, gzip));
    body(&mut w)?;
    let sink = w.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    sink.finish()?;
    Ok(())
}

pub fn read_table(path: &Path) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(open_reader(path)?);
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(headers);
    for rec in rdr.records() {
        table.rows.push(rec?.iter().map(str::to_string).collect());
    }
    Ok(table)
}

pub fn write_table_to<W: Write>(out: W, gzip: bool, table: &Table) -> Result<()> {
    with_writer(out, gzip, |w| {
        w.write_record(&table.headers)?;
        for row in &table.rows {
            w.write_record(row)?;
        }
        w.flush()?;
        Ok(())
    })
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_table_to(file, is_gzip(path), table)?;
    info!("wrote {} row(s) to {}", table.len(), path.display());
    Ok(())
}

/// Writes `table` according to `sink`; `input` is the file it was read from.
///
/// In-place writes go through a temporary file in the same directory that
/// replaces `input` only once fully written.
pub fn write_to_sink(input: &Path, sink: &TableSink, table: &Table) -> Result<PathBuf> {
    match sink {
        TableSink::NewFile(path) => {
            write_table(path, table)?;
            Ok(path.clone())
        }
        TableSink::InPlace => {
            let dir = match input.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let tmp = tempfile::NamedTempFile::new_in(dir)?;
            write_table_to(BufWriter::new(tmp.as_file()), is_gzip(input), table)?;
            tmp.persist(input).map_err(|e| Error::Io(e.error))?;
            info!("rewrote {} in place ({} row(s))", input.display(), table.len());
            Ok(input.to_path_buf())
        }
    }
}

/// Writes campaign output with header `probe_id,rtt,hop_count`.
pub fn write_records(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    info!("writing {} result(s) to {}", records.len(), path.display());
    let file = BufWriter::new(File::create(path)?);
    with_writer(file, is_gzip(path), |w| {
        w.write_record(["probe_id", "rtt", "hop_count"])?;
        for rec in records {
            w.serialize(rec)?;
        }
        w.flush()?;
        Ok(())
    })
}

pub fn read_records(path: &Path) -> Result<Vec<NormalizedRecord>> {
    let mut rdr = csv::Reader::from_reader(open_reader(path)?);
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        out.push(rec?);
    }
    Ok(out)
}
