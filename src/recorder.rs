// src/recorder.rs
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use log::info;
use crate::drivers::{RollingStore, SampleFrame, ScopeError};
/// Writes frames as `timestamp_ms,ch0,ch1,...` rows under a header sized
/// for the widest frame. Short frames leave trailing cells empty.
pub fn write_csv<W: Write>(frames: &[SampleFrame], writer: W) -> Result<(), ScopeError> {
    let mut w = BufWriter::new(writer);
    let width = frames.iter().map(SampleFrame::channel_count).max().unwrap_or(0);
    write!(w, "timestamp_ms")?;
    for ch in 0..width {
        write!(w, ",ch{}", ch)?;
    }
    writeln!(w)?;
    for frame in frames {
        write!(w, "{}", frame.timestamp_ms)?;
        for ch in 0..width {
            match frame.values.get(ch) {
                Some(v) => write!(w, ",{}", v)?,
                None => write!(w, ",")?,
            }
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}
/// Reads what [`write_csv`] produced. Empty trailing cells shorten the frame.
pub fn read_csv<R: BufRead>(reader: R) -> Result<Vec<SampleFrame>, ScopeError> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if idx == 0 || line.trim().is_empty() {
            continue;
        }
        let mut cells = line.split(',');
        let timestamp_ms = parse_cell(cells.next().unwrap_or(""), line_no)?;
        let mut values = Vec::new();
        for cell in cells {
            if cell.trim().is_empty() {
                break;
            }
            values.push(parse_cell(cell, line_no)?);
        }
        frames.push(SampleFrame::new(timestamp_ms, values));
    }
    Ok(frames)
}
fn parse_cell(cell: &str, line: usize) -> Result<f64, ScopeError> {
    cell.trim().parse::<f64>().map_err(|e| ScopeError::Csv {
        line,
        reason: format!("{:?}: {}", cell, e),
    })
}
pub fn export_store(store: &RollingStore, path: impl AsRef<Path>) -> Result<usize, ScopeError> {
    let frames = store.export_all();
    write_csv(&frames, File::create(path.as_ref())?)?;
    info!("exported {} frames to {}", frames.len(), path.as_ref().display());
    Ok(frames.len())
}
/// Replaces the store's contents with a previously exported capture.
pub fn import_store(store: &mut RollingStore, path: impl AsRef<Path>) -> Result<usize, ScopeError> {
    let frames = read_csv(BufReader::new(File::open(path.as_ref())?))?;
    let count = frames.len();
    store.import_replacing_all(frames);
    info!("imported {} frames from {}", count, path.as_ref().display());
    Ok(count)
}
