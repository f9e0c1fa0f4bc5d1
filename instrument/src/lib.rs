//! Column-oriented capture of auction events.
//!
//! `LedgerLayer` is a `tracing_subscriber` layer that turns events on the
//! auction targets (`trade`, `period`, `exhausted`) into rows of per-target
//! tables. Columns are created from event fields as they first appear, so the
//! schema follows whatever the engine emits. Tables convert to polars
//! DataFrames and can be written as parquet.
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//!
//! let subscriber = tracing_subscriber::registry().with(instrument::LedgerLayer);
//! tracing::subscriber::with_default(subscriber, || {
//!     // ... run the market ...
//! });
//! let trades = &instrument::drain_to_dataframes()["trade"];
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One row per executed trade.
pub const TRADE: &str = "trade";
/// One row per finished period.
pub const PERIOD: &str = "period";
/// One row per trader leaving the active pool.
pub const EXHAUSTED: &str = "exhausted";

pub const RECORDED_TARGETS: [&str; 3] = [TRADE, PERIOD, EXHAUSTED];

// === TABLES ===

#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    I64(Vec<i64>),
    U64(Vec<u64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    pub fn len(&self) -> usize {
        match self {
            TypedColumn::I64(v) => v.len(),
            TypedColumn::U64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        match self {
            TypedColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TypedColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TypedColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// Rows of one event target. Columns keep the order fields first appeared in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    columns: Vec<(String, TypedColumn)>,
    row_count: usize,
}

impl EventTable {
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Column `name`, created (and back-filled for earlier rows) on first use.
    fn column_mut(&mut self, name: &str, empty: fn() -> TypedColumn) -> &mut TypedColumn {
        let idx = match self.columns.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                let mut col = empty();
                col.pad_to(self.row_count);
                self.columns.push((name.to_string(), col));
                self.columns.len() - 1
            }
        };
        &mut self.columns[idx].1
    }

    /// Close the current row: count it and default any field it lacked.
    fn finish_row(&mut self) {
        self.row_count += 1;
        for (_, col) in &mut self.columns {
            col.pad_to(self.row_count);
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|(name, col)| match col {
                TypedColumn::I64(v) => Column::new(name.into(), v),
                TypedColumn::U64(v) => Column::new(name.into(), v),
                TypedColumn::F64(v) => Column::new(name.into(), v),
                TypedColumn::Bool(v) => Column::new(name.into(), v),
                TypedColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// All captured tables, keyed by event target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorder {
    pub tables: BTreeMap<String, EventTable>,
}

impl Recorder {
    pub fn to_dataframes(&self) -> BTreeMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

// === CAPTURE ===

struct RowVisitor<'a> {
    table: &'a mut EventTable,
}

impl RowVisitor<'_> {
    fn push_str(&mut self, field: &Field, value: String) {
        if let TypedColumn::Str(v) = self
            .table
            .column_mut(field.name(), || TypedColumn::Str(Vec::new()))
        {
            v.push(value);
        }
    }
}

impl Visit for RowVisitor<'_> {
    fn record_i64(&mut self, field: &Field, value: i64) {
        if let TypedColumn::I64(v) = self
            .table
            .column_mut(field.name(), || TypedColumn::I64(Vec::new()))
        {
            v.push(value);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if let TypedColumn::U64(v) = self
            .table
            .column_mut(field.name(), || TypedColumn::U64(Vec::new()))
        {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let TypedColumn::F64(v) = self
            .table
            .column_mut(field.name(), || TypedColumn::F64(Vec::new()))
        {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let TypedColumn::Bool(v) = self
            .table
            .column_mut(field.name(), || TypedColumn::Bool(Vec::new()))
        {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push_str(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push_str(field, format!("{:?}", value));
    }
}

/// Layer that records events on `RECORDED_TARGETS` into the thread-local
/// recorder. Other events pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerLayer;

impl<S: Subscriber> Layer<S> for LedgerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !RECORDED_TARGETS.contains(&target) {
            return;
        }
        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            let table = recorder.tables.entry(target.to_string()).or_default();
            event.record(&mut RowVisitor {
                table: &mut *table,
            });
            table.finish_row();
        });
    }
}

/// Take everything recorded on this thread, leaving the recorder empty.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

pub fn drain_to_dataframes() -> BTreeMap<String, DataFrame> {
    drain().to_dataframes()
}

/// Write each DataFrame as `{dir}/{name}.parquet`.
pub fn save_parquet(dfs: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PolarsError::IO {
        error: e.into(),
        msg: None,
    })?;
    for (name, df) in dfs.iter_mut() {
        let path = dir.join(format!("{}.parquet", name));
        let file = std::fs::File::create(&path).map_err(|e| PolarsError::IO {
            error: e.into(),
            msg: None,
        })?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Replace anything but ASCII alphanumerics with `_`, capped at 60 chars.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(60)
        .collect()
}

/// Clears the recorder on creation and writes parquet tables on drop.
///
/// The caller installs `LedgerLayer` itself. Each run writes to
/// `{parent}/{name}/` and drops a `_ready` file once every table is on disk.
///
/// ```ignore
/// let rec = instrument::ScopedRecorder::new("data", "seed_42");
/// // ... run the market ...
/// rec.save()?; // data/seed_42/{trade,period,exhausted}.parquet + _ready
/// ```
pub struct ScopedRecorder {
    run_dir: PathBuf,
    saved: bool,
}

impl ScopedRecorder {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        clear();
        Self {
            run_dir: parent.into().join(sanitize(name)),
            saved: false,
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write the tables now and report failures to the caller.
    pub fn save(mut self) -> PolarsResult<usize> {
        self.write()
    }

    /// Drain the recorder and write its tables. Runs at most once.
    fn write(&mut self) -> PolarsResult<usize> {
        if std::mem::replace(&mut self.saved, true) {
            return Ok(0);
        }
        let mut dfs = drain_to_dataframes();
        if dfs.is_empty() {
            return Ok(0);
        }
        save_parquet(&mut dfs, &self.run_dir)?;
        std::fs::File::create(self.run_dir.join("_ready")).map_err(|e| PolarsError::IO {
            error: e.into(),
            msg: None,
        })?;
        Ok(dfs.len())
    }
}

impl Drop for ScopedRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.write() {
            tracing::warn!(dir = %self.run_dir.display(), error = %e, "failed to write parquet tables");
        }
    }
}
