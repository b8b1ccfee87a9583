use crate::core::branch::{PipeRecord, SystemRecord};
use csv::WriterBuilder;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Column headings of the supply and return line files, kept verbatim from
/// the measurement campaign spreadsheets the results are compared against.
const PIPE_HEADINGS: [&str; 13] = [
    "Latitude",
    "Longitude",
    "L tot [m]",
    "T [°C]",
    "mdot [kg/s]",
    "Qdot loss [W]",
    "qdot loss [W/m]",
    "Qdot loss total [W]",
    "v [m/s]",
    "mdot consumer [kg/s]",
    "Qdot consumer absolute [W]",
    "Qdot consumer actual [W]",
    "Qdot tot [W]",
];

const SYSTEM_HEADINGS: [&str; 4] = ["Latitude", "Longitude", "L tot [m]", "Qdot [MW]"];

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        Ok(BufWriter::new(File::create(self.directory_path.join(
            formatx!(&self.file_template, location_key)?,
        ))?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Write one line's records as a CSV file under the given location key.
pub fn write_pipe_records(
    output: &impl Output,
    location_key: &str,
    records: &[PipeRecord],
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(location_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(PIPE_HEADINGS)?;
    for record in records {
        writer.write_record([
            record.latitude.to_string(),
            record.longitude.to_string(),
            record.position_m.to_string(),
            record.temperature_c.to_string(),
            record.mass_flow_kg_per_s.to_string(),
            record.heat_loss_w.to_string(),
            record.heat_loss_w_per_m.to_string(),
            record.cumulative_heat_loss_w.to_string(),
            record.velocity_m_per_s.to_string(),
            record.consumer_mass_flow_kg_per_s.to_string(),
            record.consumer_heat_flow_w.to_string(),
            record.consumer_useful_heat_flow_w.to_string(),
            record.total_heat_flow_w.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the system profile as a CSV file under the given location key.
pub fn write_system_records(
    output: &impl Output,
    location_key: &str,
    records: &[SystemRecord],
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(location_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(SYSTEM_HEADINGS)?;
    for record in records {
        writer.write_record([
            record.latitude.to_string(),
            record.longitude.to_string(),
            record.position_m.to_string(),
            record.net_heat_flow_mw.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::sync::{Arc, Mutex};

    /// Collects everything written to it so tests can read the file back.
    #[derive(Clone, Debug, Default)]
    struct CaptureOutput {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureOutput {
        fn contents(&self) -> String {
            String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
        }
    }

    impl Output for CaptureOutput {
        fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
            Ok(CaptureWriter {
                buffer: self.buffer.clone(),
            })
        }
    }

    struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn pipe_record() -> PipeRecord {
        PipeRecord {
            latitude: 46.36,
            longitude: 15.11,
            position_m: 12.5,
            temperature_c: 129.98,
            mass_flow_kg_per_s: 5.,
            heat_loss_w: 419.26,
            heat_loss_w_per_m: 33.54,
            cumulative_heat_loss_w: 419.26,
            velocity_m_per_s: 0.28,
            consumer_mass_flow_kg_per_s: 0.,
            consumer_heat_flow_w: 0.,
            consumer_useful_heat_flow_w: 0.,
            total_heat_flow_w: 8433478.74,
        }
    }

    #[rstest]
    fn should_write_line_files_with_the_full_column_headings() {
        let output = CaptureOutput::default();
        write_pipe_records(&output, "supply", &[pipe_record()]).unwrap();

        let contents = output.contents();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Latitude,Longitude,L tot [m],T [°C],mdot [kg/s],Qdot loss [W],qdot loss [W/m],\
             Qdot loss total [W],v [m/s],mdot consumer [kg/s],Qdot consumer absolute [W],\
             Qdot consumer actual [W],Qdot tot [W]"
        );
        assert_eq!(
            lines.next().unwrap(),
            "46.36,15.11,12.5,129.98,5,419.26,33.54,419.26,0.28,0,0,0,8433478.74"
        );
        assert!(lines.next().is_none());
    }

    #[rstest]
    fn should_write_the_system_profile_in_megawatts() {
        let output = CaptureOutput::default();
        write_system_records(
            &output,
            "system",
            &[SystemRecord {
                latitude: 46.36,
                longitude: 15.11,
                position_m: 12.5,
                net_heat_flow_mw: 1.32,
            }],
        )
        .unwrap();

        assert_eq!(
            output.contents(),
            "Latitude,Longitude,L tot [m],Qdot [MW]\n46.36,15.11,12.5,1.32\n"
        );
    }

    #[rstest]
    fn should_mark_the_sink_output_as_a_noop() {
        assert!(SinkOutput.is_noop());
        write_pipe_records(&SinkOutput, "supply", &[pipe_record()]).unwrap();
    }
}
