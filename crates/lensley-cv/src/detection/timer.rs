//! Countdown timer presence and value

use super::config::TimerConfig;
use crate::frame::Frame;
use crate::ocr::{TimerReading, TimerValueReader};
use crate::traits::Detector;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use lensley_core::DetectionValue;
use opencv::{
    core::{Mat, Rect},
    imgproc,
};
use tracing::debug;

/// Presence and value verdicts for the countdown display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerDetection {
    pub has_timer: DetectionValue<bool>,
    /// Reader verdict before the aggregator caps unread values
    pub timer_value: DetectionValue<Option<u8>>,
}

/// Looks for digit-like edge texture where countdown displays sit, and
/// hands the same region to the digit reader.
pub struct TimerDetector {
    config: TimerConfig,
    reader: TimerValueReader,
}

impl TimerDetector {
    pub fn new(config: TimerConfig, reader: TimerValueReader) -> Self {
        Self { config, reader }
    }

    pub fn reader(&self) -> &TimerValueReader {
        &self.reader
    }

    /// Upper-right region: rows [0, bottom), cols [left, width). `None` when empty.
    pub fn roi(&self, width: i32, height: i32) -> Option<Rect> {
        let bottom = (height as f64 * self.config.roi_bottom) as i32;
        let left = (width as f64 * self.config.roi_left) as i32;
        let rect = Rect::new(left, 0, width - left, bottom);
        (rect.width > 0 && rect.height > 0).then_some(rect)
    }

    /// Fraction of Canny edge pixels in a grayscale image
    pub fn edge_ratio(&self, gray: &Mat) -> Result<f64> {
        let mut edges = Mat::default();
        imgproc::canny_def(gray, &mut edges, self.config.canny_low, self.config.canny_high)
            .context("Canny failed")?;
        ImageUtils::nonzero_ratio(&edges)
    }

    /// Presence verdict from edge density and the reader's outcome
    pub fn presence(&self, edge_ratio: f64, reading: TimerReading) -> DetectionValue<bool> {
        let value_read = reading.value().is_some();
        let has_timer = edge_ratio > self.config.edge_ratio_threshold || value_read;

        let bonus = (edge_ratio * self.config.edge_gain).min(self.config.max_edge_bonus);
        let verdict = DetectionValue::new(has_timer, self.config.base_confidence + bonus);
        if value_read {
            let raised = verdict.confidence().max(self.config.read_confidence_floor);
            verdict.with_confidence(raised)
        } else {
            verdict
        }
    }
}

impl Detector for TimerDetector {
    type Output = TimerDetection;

    fn name(&self) -> &'static str {
        "timer"
    }

    fn detect(&self, frame: &Frame) -> Result<Self::Output> {
        let Some(rect) = self.roi(frame.width(), frame.height()) else {
            return Ok(self.fallback());
        };

        let roi = ImageUtils::crop(frame.as_mat(), rect)?;
        let gray = ImageUtils::to_grayscale(&roi)?;
        let edge_ratio = self.edge_ratio(&gray)?;

        let reading = self.reader.read(&gray);
        let has_timer = self.presence(edge_ratio, reading);
        debug!(
            ?rect,
            edge_ratio,
            ?reading,
            has_timer = has_timer.value,
            conf = has_timer.confidence(),
            "timer scored"
        );

        Ok(TimerDetection {
            has_timer,
            timer_value: self.reader.to_detection(reading),
        })
    }

    fn fallback(&self) -> Self::Output {
        TimerDetection {
            has_timer: DetectionValue::new(false, self.config.empty_roi_confidence),
            timer_value: DetectionValue::absent(self.config.empty_roi_confidence),
        }
    }
}
