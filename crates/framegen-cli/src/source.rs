//! Synthetic frame source and a counting display sink for demo runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use framegen_core::clock::now_ns;
use framegen_core::{DisplaySink, Frame, FrameImage, FrameSource, PixelFormat};
use framegen_errors::PresentError;

/// Scrolling checkerboard with a vertical gradient, moving `speed` pixels
/// per frame to the right.
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    speed: u32,
    next_index: u64,
    limit: Option<u64>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, speed: u32) -> Self {
        Self {
            width,
            height,
            speed,
            next_index: 0,
            limit: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Whether the frame limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.next_index >= limit)
    }

    fn render(&self, index: u64) -> Option<FrameImage> {
        let mut image = FrameImage::new(self.width, self.height, PixelFormat::Rgba8).ok()?;
        let offset = i64::try_from(index.wrapping_mul(u64::from(self.speed)) % 1_000_000).ok()?;
        let height = i64::from(self.height.max(1));
        for y in 0..self.height {
            let shade = u8::try_from(i64::from(y) * 200 / height).unwrap_or(200);
            for x in 0..self.width {
                let wx = i64::from(x) - offset;
                let cell = (wx.div_euclid(8) + i64::from(y / 8)).rem_euclid(2);
                let v = if cell == 0 { shade } else { 255 - shade / 2 };
                image.set_rgba(x, y, [v, v / 2 + 40, 255 - v, 255]);
            }
        }
        Some(image)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.is_exhausted() {
            return None;
        }
        let index = self.next_index;
        let image = self.render(index)?;
        self.next_index += 1;
        Some(Frame::captured(image, index, now_ns()))
    }
}

/// Display sink that only counts frames.
#[derive(Debug, Default)]
pub struct CountingSink {
    presented: Arc<AtomicU64>,
    synthetic: Arc<AtomicU64>,
}

/// Read side of a [`CountingSink`].
#[derive(Debug, Clone)]
pub struct SinkCounters {
    presented: Arc<AtomicU64>,
    synthetic: Arc<AtomicU64>,
}

impl SinkCounters {
    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Relaxed)
    }

    pub fn synthetic(&self) -> u64 {
        self.synthetic.load(Ordering::Relaxed)
    }
}

impl CountingSink {
    pub fn new() -> (Self, SinkCounters) {
        let sink = Self::default();
        let counters = SinkCounters {
            presented: Arc::clone(&sink.presented),
            synthetic: Arc::clone(&sink.synthetic),
        };
        (sink, counters)
    }
}

impl DisplaySink for CountingSink {
    fn present(&mut self, frame: &Frame, _deadline: Instant) -> Result<(), PresentError> {
        self.presented.fetch_add(1, Ordering::Relaxed);
        if frame.is_synthetic() {
            self.synthetic.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}
