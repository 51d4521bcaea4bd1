use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use segstream_fetch::Progress;

pub trait TrackerBuilder<T: Tracker<U>, U> {
    fn build(self) -> T;
}

pub trait Tracker<Inc> {
    fn step(&self, step: Inc) -> &Self;
    fn finish(self);
}

const PB_STYLE: &str =
    "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK))
});

/// Spinner over an open-ended segment stream.
///
/// Clones share the same bar, so one can live inside the progress callback
/// while the caller keeps another to finish it.
#[derive(Clone)]
pub struct SegmentTracker {
    pb: ProgressBar,
    finish: Option<String>,
}

impl SegmentTracker {
    pub fn bytes(&self) -> u64 {
        self.pb.position()
    }
}

impl Tracker<&Progress> for SegmentTracker {
    fn step(&self, progress: &Progress) -> &Self {
        self.pb.set_position(progress.bytes_written);
        self.pb.set_message(format!(
            "segment {} ({} written)",
            progress.index, progress.segments_written
        ));
        self.pb.tick();
        self
    }

    fn finish(self) {
        match self.finish {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SegmentTrackerBuilder {
    prefix: Option<String>,
    finish: Option<String>,
    hidden: bool,
}

impl SegmentTrackerBuilder {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

impl<'a> TrackerBuilder<SegmentTracker, &'a Progress> for SegmentTrackerBuilder {
    fn build(self) -> SegmentTracker {
        let pb = ProgressBar::new_spinner();
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        if self.hidden {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }

        SegmentTracker {
            pb,
            finish: self.finish,
        }
    }
}
