use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// CSV sink for any of the record types; the header comes from the first row.
pub struct RecordLogger {
    writer: Writer<File>,
}

impl RecordLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_batch<T: Serialize>(&mut self, records: &[T]) -> Result<()> {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SweepPoint;

    #[test]
    fn writes_header_and_rows() {
        let path = std::env::temp_dir().join(format!("queuesim_logger_{}.csv", std::process::id()));
        let point = SweepPoint {
            value: 1.5,
            replications: 3,
            lambda: 1.0,
            mu: 1.5,
            load: 1.0 / 1.5,
            analytic_bp: 0.1,
            empirical_bp: 0.11,
            analytic_len: 2.0,
            empirical_len: 2.1,
            analytic_wait: 3.0,
            empirical_wait: 3.1,
            empirical_sojourn: 2.9,
        };

        {
            let mut logger = RecordLogger::new(&path).unwrap();
            logger.log_batch(&[point.clone(), point]).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("value,replications,lambda,mu,load,analytic_bp"));
        assert_eq!(lines.count(), 2);
    }
}
