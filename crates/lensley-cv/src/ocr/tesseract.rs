//! Tesseract command-line recognizer

use super::DigitRecognizer;
use crate::detection::config::OcrConfig;
use crate::error::CvError;
use crate::utils::ImageUtils;
use crate::Result;
use opencv::core::Mat;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Runs `tesseract stdin stdout` on a PNG, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    timeout: Duration,
    page_seg_mode: u8,
    whitelist: String,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout(),
            page_seg_mode: config.page_seg_mode,
            whitelist: config.whitelist.clone(),
        }
    }

    /// `Some` if the binary answers `--version` within the recognition timeout.
    pub fn probe(config: &OcrConfig) -> Option<Self> {
        match Self::answers_version(config) {
            Ok(true) => Some(Self::new(config)),
            Ok(false) => None,
            Err(e) => {
                debug!("tesseract probe failed: {:#}", e);
                None
            }
        }
    }

    fn answers_version(config: &OcrConfig) -> Result<bool> {
        let mut child = Command::new(&config.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(CvError::RecognizerIo)?;
        Ok(wait_with_timeout(&mut child, config.timeout())?.success())
    }

    fn args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "--oem".to_string(),
            "3".to_string(),
            "--psm".to_string(),
            self.page_seg_mode.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", self.whitelist),
        ]
    }
}

/// Kills the child once `timeout` elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(CvError::RecognizerIo)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CvError::RecognizerTimeout(timeout).into());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl DigitRecognizer for TesseractCli {
    fn recognize(&self, image: &Mat) -> Result<String> {
        let png = ImageUtils::encode_png(image)?;

        let mut child = Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(CvError::RecognizerIo)?;

        // Pipes are serviced on their own threads; only the timeout ends a stalled child.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CvError::RecognizerFailed("stdin not captured".into()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| CvError::RecognizerFailed("stdout not captured".into()))?;
        let writer = thread::spawn(move || stdin.write_all(&png));
        let reader = thread::spawn(move || {
            let mut text = String::new();
            stdout.read_to_string(&mut text).map(|_| text)
        });

        let status = wait_with_timeout(&mut child, self.timeout)?;
        if !status.success() {
            return Err(CvError::RecognizerFailed(format!("tesseract exited with {status}")).into());
        }

        writer
            .join()
            .map_err(|_| CvError::RecognizerFailed("stdin writer panicked".into()))?
            .map_err(CvError::RecognizerIo)?;
        let text = reader
            .join()
            .map_err(|_| CvError::RecognizerFailed("stdout reader panicked".into()))?
            .map_err(CvError::RecognizerIo)?;

        Ok(text)
    }
}
