// External PDF toolkit wrapper (pdfcpu-compatible CLI)
//
// Every interaction with the toolkit goes through `run_command`, which enforces a
// wall-clock timeout and returns the combined stdout/stderr of the invocation.

pub mod info;

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::error::{PdfEditError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program args...`, waiting at most `timeout`.
///
/// Returns the combined output (stdout followed by stderr) on a zero exit status.
/// A non-zero exit yields [`PdfEditError::ExternalToolFailure`] carrying the captured
/// output; exceeding the timeout yields [`PdfEditError::ExternalToolTimeout`] regardless
/// of what the process printed. No retries are attempted.
pub fn run_command<S: AsRef<str>>(timeout: Duration, program: &str, args: &[S]) -> Result<Vec<u8>> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let command_line = describe(program, &args);
    debug!(command = %command_line, ?timeout, "running external tool");

    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PdfEditError::ExternalToolFailure {
            command: command_line.clone(),
            status: "not started".to_string(),
            output: e.to_string(),
        })?;

    // Drain both pipes on helper threads so a chatty child never blocks on a full pipe.
    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(pipe) = child.stdout.take() {
        spawn_reader(Stream::Stdout, pipe, tx.clone());
        pending += 1;
    }
    if let Some(pipe) = child.stderr.take() {
        spawn_reader(Stream::Stderr, pipe, tx.clone());
        pending += 1;
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(timed_out(command_line, timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };

    // The pipes close only when every holder exits; a background grandchild keeps them open.
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, buf)) => stdout = buf,
            Ok((Stream::Stderr, buf)) => stderr = buf,
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(timed_out(command_line, timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        pending -= 1;
    }
    let mut output = stdout;
    output.extend(stderr);

    if status.success() {
        Ok(output)
    } else {
        Err(PdfEditError::ExternalToolFailure {
            command: command_line,
            status: describe_status(&status),
            output: String::from_utf8_lossy(&output).into_owned(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Reader threads still blocked on a pipe after a timeout are left detached.
fn spawn_reader<R: Read + Send + 'static>(
    stream: Stream,
    mut pipe: R,
    tx: mpsc::Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
}

fn timed_out(command: String, timeout: Duration) -> PdfEditError {
    warn!(command = %command, ?timeout, "external tool timed out");
    PdfEditError::ExternalToolTimeout { command, timeout }
}

fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_status(status: &ExitStatus) -> String {
    status
        .code()
        .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"))
}

/// Typed front-end for the toolkit's sub-commands.
///
/// Holds the program, its leading arguments and the two timeouts from [`Settings`].
#[derive(Debug, Clone)]
pub struct PdfTool {
    program: String,
    leading_args: Vec<String>,
    command_timeout: Duration,
    analysis_timeout: Duration,
}

impl PdfTool {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: settings.tool.clone(),
            leading_args: settings.tool_args.clone(),
            command_timeout: settings.command_timeout(),
            analysis_timeout: settings.analysis_timeout(),
        }
    }

    fn run(&self, timeout: Duration, args: &[&str]) -> Result<Vec<u8>> {
        let full: Vec<&str> = self
            .leading_args
            .iter()
            .map(String::as_str)
            .chain(args.iter().copied())
            .collect();
        run_command(timeout, &self.program, &full)
    }

    /// `info <file>`
    pub fn info(&self, file: &Path) -> Result<String> {
        let out = self.run(self.command_timeout, &["info", &path_arg(file)])?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// `images list <file>`; uses the longer analysis timeout.
    pub fn list_images(&self, file: &Path) -> Result<String> {
        let out = self.run(self.analysis_timeout, &["images", "list", &path_arg(file)])?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// `images update <in> <replacement> <out> <selector>`; the selector is an object
    /// reference or a `"page id"` pair.
    pub fn update_image(
        &self,
        input: &Path,
        replacement: &Path,
        output: &Path,
        selector: &str,
    ) -> Result<Vec<u8>> {
        self.run(
            self.command_timeout,
            &[
                "images",
                "update",
                &path_arg(input),
                &path_arg(replacement),
                &path_arg(output),
                selector,
            ],
        )
    }

    /// `optimize <in> <out>`
    pub fn optimize(&self, input: &Path, output: &Path) -> Result<Vec<u8>> {
        self.run(
            self.command_timeout,
            &["optimize", &path_arg(input), &path_arg(output)],
        )
    }

    /// `pages remove -p <pages> -- <in> <out>`
    pub fn remove_pages(&self, input: &Path, output: &Path, pages: &str) -> Result<Vec<u8>> {
        self.run(
            self.command_timeout,
            &[
                "pages",
                "remove",
                "-p",
                pages,
                "--",
                &path_arg(input),
                &path_arg(output),
            ],
        )
    }

    /// `watermark remove -- <in> <out>`
    pub fn remove_watermarks(&self, input: &Path, output: &Path) -> Result<Vec<u8>> {
        self.run(
            self.command_timeout,
            &["watermark", "remove", "--", &path_arg(input), &path_arg(output)],
        )
    }

    /// `stamp remove -- <in> <out>`
    pub fn remove_stamps(&self, input: &Path, output: &Path) -> Result<Vec<u8>> {
        self.run(
            self.command_timeout,
            &["stamp", "remove", "--", &path_arg(input), &path_arg(output)],
        )
    }

    /// `extract -mode=image -pages=<page> <in> <outDir>`
    pub fn extract_images(&self, input: &Path, page: u32, out_dir: &Path) -> Result<Vec<u8>> {
        let pages = format!("-pages={page}");
        self.run(
            self.command_timeout,
            &[
                "extract",
                "-mode=image",
                &pages,
                &path_arg(input),
                &path_arg(out_dir),
            ],
        )
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
