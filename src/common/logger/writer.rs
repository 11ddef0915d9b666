use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    sync::Arc,
};

use parking_lot::Mutex;

/// Appends log output to a file and trims the oldest lines once the file
/// grows past `max_lines`.
#[derive(Clone)]
pub(crate) struct LineCappedWriter {
    path: PathBuf,
    max_lines: u32,
    state: Arc<Mutex<WriterState>>,
}

struct WriterState {
    file: Option<File>,
    lines_since_prune: u32,
}

impl LineCappedWriter {
    pub fn new(path: impl Into<PathBuf>, max_lines: u32) -> Self {
        Self {
            path: path.into(),
            max_lines: max_lines.max(1),
            state: Arc::new(Mutex::new(WriterState {
                file: None,
                lines_since_prune: 0,
            })),
        }
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
    }

    /// Rewrites the file keeping only the newest `max_lines` lines.
    fn prune(&self) -> io::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        if lines.len() <= self.max_lines as usize {
            return Ok(());
        }

        let start = lines.len() - self.max_lines as usize;
        let mut file = File::create(&self.path)?;
        for line in &lines[start..] {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

impl io::Write for LineCappedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.file.is_none() {
            state.file = Some(self.open()?);
        }
        if let Some(file) = state.file.as_mut() {
            file.write_all(buf)?;
        }

        state.lines_since_prune += buf.iter().filter(|&&b| b == b'\n').count() as u32;

        // Prune after 10% of max_lines new lines, but never more often than every 50.
        let threshold = (self.max_lines / 10).max(50);
        if state.lines_since_prune >= threshold {
            // The append handle must be reopened after the file is rewritten.
            state.file = None;
            if let Err(e) = self.prune() {
                eprintln!("Failed to prune log file: {}", e);
            }
            state.lines_since_prune = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LineCappedWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
