//! Destinations for velocity readings

use crate::error::Result;
use centrack::{ObjectId, VelocityReading};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Consumer of readings produced by the pipeline
pub trait ReadingSink {
    fn record(&mut self, frame_index: u64, reading: &VelocityReading) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects readings in memory
impl ReadingSink for Vec<VelocityReading> {
    fn record(&mut self, _frame_index: u64, reading: &VelocityReading) -> Result<()> {
        self.push(reading.clone());
        Ok(())
    }
}

/// An absent sink discards readings
impl<S: ReadingSink> ReadingSink for Option<S> {
    fn record(&mut self, frame_index: u64, reading: &VelocityReading) -> Result<()> {
        match self {
            Some(sink) => sink.record(frame_index, reading),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReadingRecord<'a> {
    frame: u64,
    id: ObjectId,
    elapsed_secs: f64,
    velocity: f64,
    unit: &'a str,
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    unit: String,
}

impl JsonLinesSink<File> {
    pub fn create<P: AsRef<Path>>(path: P, unit: impl Into<String>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        log::info!("Writing readings to {}", path.as_ref().display());
        Ok(Self::new(file, unit))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W, unit: impl Into<String>) -> Self {
        Self {
            writer: BufWriter::new(writer),
            unit: unit.into(),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error().into())
    }
}

impl<W: Write> ReadingSink for JsonLinesSink<W> {
    fn record(&mut self, frame_index: u64, reading: &VelocityReading) -> Result<()> {
        let record = ReadingRecord {
            frame: frame_index,
            id: reading.id,
            elapsed_secs: reading.elapsed_secs,
            velocity: reading.velocity,
            unit: &self.unit,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
