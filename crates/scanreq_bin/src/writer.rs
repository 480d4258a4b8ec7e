use indicatif::{MultiProgress, ProgressDrawTarget};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Redraw rate of the spinner on stderr.
const REFRESH_RATE_HZ: u8 = 20;

static BARS: OnceLock<MultiProgress> = OnceLock::new();

/// The bars drawn by this process. Every handle returned refers to the same set.
pub fn global_multi_progress() -> MultiProgress {
    BARS.get_or_init(|| {
        MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(REFRESH_RATE_HZ))
    })
    .clone()
}

/// Log sink for `tracing_subscriber::fmt` that clears the bars, writes to stderr and redraws.
#[derive(Clone)]
pub struct IndicatifWriter {
    bars: MultiProgress,
}

impl IndicatifWriter {
    /// Writes around `bars`.
    pub fn new(bars: MultiProgress) -> Self {
        Self { bars }
    }
}

impl Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A formatted event arrives in one piece; writing it whole keeps lines intact.
        self.bars
            .suspend(|| io::stderr().lock().write_all(buf))
            .map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self {
        self.clone()
    }
}
