use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress bar over the discovered files, drawn on stderr.
///
/// Status lines printed through [`Progress::println`] appear above the bar
/// while it is visible and fall back to plain stderr when it is hidden
/// (disabled, quiet, or stderr is not a terminal). Quiet mode suppresses
/// them entirely. The bar clears itself when dropped.
pub struct Progress {
    progress_bar: ProgressBar,
    quiet: bool,
}

impl Progress {
    /// Creates a bar over `total` files. A hidden bar is used when `enabled`
    /// is false or `quiet` is set.
    #[allow(clippy::unwrap_used)]
    pub fn new(total: u64, enabled: bool, quiet: bool) -> Self {
        if !enabled || quiet {
            return Self {
                progress_bar: ProgressBar::hidden(),
                quiet,
            };
        }

        let progress_bar = ProgressBar::new(total);
        // unwrap is safe: template string is a compile-time constant
        progress_bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
                .progress_chars("=> "),
        );
        progress_bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            progress_bar,
            quiet,
        }
    }

    /// A progress reporter that draws nothing. Status lines still go to stderr.
    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
            quiet: false,
        }
    }

    /// Shows the file currently being processed.
    pub fn set_file(&self, relative: &Path) {
        self.progress_bar
            .set_message(relative.display().to_string());
    }

    /// Marks one file as done.
    pub fn inc(&self) {
        self.progress_bar.inc(1);
    }

    /// Prints a status line without corrupting the bar.
    pub fn println(&self, line: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.progress_bar.is_hidden() {
            eprintln!("{}", line.as_ref());
        } else {
            self.progress_bar.println(line);
        }
    }

    /// Stops the bar and clears it from the terminal.
    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.progress_bar.finish_and_clear();
    }
}
