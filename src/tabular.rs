//! Purpose: Thin CSV writer over block schemas.
//! Exports: `TableWriter`.
//! Role: The only file-writing path for export rows; the decoding engine never
//! touches the file system.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};
use crate::core::row::Value;

pub struct TableWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    columns: usize,
}

impl TableWriter {
    pub fn create<S: AsRef<str>>(path: impl AsRef<Path>, header: &[S]) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&path).with_source(err))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(header.iter().map(|column| column.as_ref()))
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&path).with_source(err))?;
        Ok(Self {
            writer,
            path,
            columns: header.len(),
        })
    }

    pub fn write_row(&mut self, values: &[Value]) -> Result<(), Error> {
        if values.len() != self.columns {
            return Err(Error::new(ErrorKind::Internal).with_message(format!(
                "row has {} cells but the header declares {} columns",
                values.len(),
                self.columns
            )));
        }
        let cells: Vec<String> = values.iter().map(|value| value.to_string()).collect();
        self.writer
            .write_record(&cells)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))
    }

    pub fn finish(mut self) -> Result<PathBuf, Error> {
        self.writer
            .flush()
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::TableWriter;
    use crate::core::row::Value;
    use std::fs;

    #[test]
    fn header_and_rows_land_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weight.csv");
        let mut writer =
            TableWriter::create(&path, &["species_id", "weight"]).expect("create");
        writer
            .write_row(&[Value::UInt(1), Value::UInt(69)])
            .expect("row");
        writer
            .write_row(&[Value::UInt(2), Value::Empty])
            .expect("row");
        let written = writer.finish().expect("finish");

        let body = fs::read_to_string(written).expect("read");
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines, vec!["species_id,weight", "1,69", "2,"]);
    }

    #[test]
    fn column_count_mismatch_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.csv");
        let mut writer = TableWriter::create(&path, &["a", "b"]).expect("create");
        assert!(writer.write_row(&[Value::UInt(1)]).is_err());
    }
}
