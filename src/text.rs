//! Plain text chromatogram files and peak tables.
//!
//! Chromatograms are read from two columns, time then intensity, separated by
//! tabs, spaces or commas. Blank lines and lines starting with `#` are skipped,
//! as is a leading header line that does not parse as numbers.
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path;

use log::debug;

use crate::arrayops::ChromatogramArrays;
use crate::peak::ChromatographicPeak;

fn invalid_data(line_number: usize, message: String) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line {line_number}: {message}"),
    )
}

fn parse_pair(line: &str) -> Option<Result<(f64, f64), String>> {
    let mut fields = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let time = fields.next()?;
    let Some(intensity) = fields.next() else {
        return Some(Err(format!("expected two columns, found {line:?}")));
    };
    let parsed = match (time.parse::<f64>(), intensity.parse::<f64>()) {
        (Ok(t), Ok(y)) => Ok((t, y)),
        _ => Err(format!("could not parse {line:?} as numbers")),
    };
    Some(parsed)
}

/// Read a two column chromatogram from `reader`
pub fn arrays_from_reader<R: BufRead>(reader: R) -> io::Result<ChromatogramArrays<'static>> {
    let mut time_array = Vec::new();
    let mut intensity_array = Vec::new();
    let mut header_seen = false;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_pair(line) {
            Some(Ok((t, y))) => {
                time_array.push(t);
                intensity_array.push(y);
            }
            Some(Err(_)) if time_array.is_empty() && !header_seen => {
                debug!("Skipping header {line:?}");
                header_seen = true;
            }
            Some(Err(message)) => return Err(invalid_data(i + 1, message)),
            None => {}
        }
    }
    Ok(ChromatogramArrays::new(time_array, intensity_array))
}

pub fn arrays_from_file<P: AsRef<path::Path>>(path: P) -> io::Result<ChromatogramArrays<'static>> {
    let reader = io::BufReader::new(fs::File::open(path)?);
    arrays_from_reader(reader)
}

/// Write `arrays` as tab separated time and intensity columns
pub fn arrays_to_writer<W: Write>(arrays: &ChromatogramArrays<'_>, writer: &mut W) -> io::Result<()> {
    for (time, intensity) in arrays.iter() {
        writeln!(writer, "{time}\t{intensity}")?;
    }
    Ok(())
}

pub fn to_file<P: AsRef<path::Path>>(arrays: &ChromatogramArrays<'_>, path: P) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    arrays_to_writer(arrays, &mut writer)?;
    writer.flush()
}

pub const PEAK_TABLE_HEADER: &str =
    "retention_time\theight\tarea\twidth\tsignal_to_noise\tstart_time\tend_time\tboundary";

/// Write a tab separated table of `peaks` with a header row
pub fn write_peak_table<W: Write>(peaks: &[ChromatographicPeak], writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{PEAK_TABLE_HEADER}")?;
    for peak in peaks {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:?}",
            peak.retention_time,
            peak.height,
            peak.area,
            peak.width,
            peak.signal_to_noise,
            peak.start_time,
            peak.end_time,
            peak.boundary
        )?;
    }
    Ok(())
}
