use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};
use flate2::{Compression, write::GzEncoder};
use rand::Rng;
use tracing::{debug, info};

use crate::generator::{generate_garbage_line, generate_ui_short_log};

const PROGRESS_EVERY: usize = 100_000;

#[derive(Debug, Clone)]
pub struct LogSpec {
    pub service: String,
    pub date: NaiveDate,
    pub lines: usize,
    pub error_rate: f64,
    pub gzip: bool,
}

impl LogSpec {
    /// `<service>-access-ui.log-YYYYMMDD[.gz]`
    pub fn file_name(&self) -> String {
        let ext = if self.gzip { ".gz" } else { "" };
        format!(
            "{}-access-ui.log-{}{ext}",
            self.service,
            self.date.format("%Y%m%d")
        )
    }
}

/// Writes a rotated log for `spec.date` into `folder`, spreading requests over
/// that day, and returns the path of the new file.
pub fn write_log_file<R: Rng + ?Sized>(
    folder: &Path,
    spec: &LogSpec,
    rng: &mut R,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(folder)?;
    let path = folder.join(spec.file_name());
    let file = BufWriter::new(File::create(&path)?);
    if spec.gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_lines(&mut encoder, spec, rng)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        write_lines(&mut file, spec, rng)?;
        file.flush()?;
    }
    info!(path = %path.display(), lines = spec.lines, "log written");
    Ok(path)
}

fn write_lines<W: Write, R: Rng + ?Sized>(
    out: &mut W,
    spec: &LogSpec,
    rng: &mut R,
) -> std::io::Result<()> {
    let offset = FixedOffset::east_opt(3 * 3600).expect("valid offset");
    let midnight = spec
        .date
        .and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .expect("fixed offsets are unambiguous");
    let step = Duration::milliseconds(86_400_000 / spec.lines.max(1) as i64);

    for i in 0..spec.lines {
        let line = if rng.random_bool(spec.error_rate) {
            generate_garbage_line(rng)
        } else {
            generate_ui_short_log(rng, midnight + step * i as i32)
        };
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        if (i + 1) % PROGRESS_EVERY == 0 {
            debug!(written = i + 1, "progress");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn spec(gzip: bool) -> LogSpec {
        LogSpec {
            service: "nginx".into(),
            date: NaiveDate::from_ymd_opt(2017, 6, 30).unwrap(),
            lines: 10,
            error_rate: 0.0,
            gzip,
        }
    }

    #[test]
    fn file_name_follows_rotation_convention() {
        assert_eq!(spec(false).file_name(), "nginx-access-ui.log-20170630");
        assert_eq!(spec(true).file_name(), "nginx-access-ui.log-20170630.gz");
    }

    #[test]
    fn writes_requested_number_of_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let path = write_log_file(dir.path(), &spec(false), &mut rng).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 10);
    }

    #[test]
    fn full_error_rate_writes_only_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let spec = LogSpec {
            error_rate: 1.0,
            ..spec(false)
        };
        let path = write_log_file(dir.path(), &spec, &mut rng).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.lines().all(|l| !l.contains("access") && !l.ends_with(|c: char| c.is_ascii_digit())));
    }
}
