use std::io::Write;

use facegram_core::capture::domain::capture_view::{CaptureView, IndicatorState};

/// Capture screen rendered as status lines on a terminal.
///
/// The indicator is printed only when it changes, so a long search shows a
/// single "searching" line.
pub struct TerminalCaptureView<W: Write> {
    out: W,
    indicator: Option<IndicatorState>,
    spinner_visible: bool,
}

impl TerminalCaptureView<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TerminalCaptureView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            indicator: None,
            spinner_visible: false,
        }
    }

    fn line(&mut self, text: &str) {
        // A closed terminal is not worth failing the session over
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

fn ansi_dot(state: IndicatorState) -> String {
    let [r, g, b] = state.color();
    format!("\x1b[38;2;{r};{g};{b}m\u{25CF}\x1b[0m")
}

impl<W: Write> CaptureView for TerminalCaptureView<W> {
    fn set_indicator(&mut self, state: IndicatorState) {
        if self.indicator == Some(state) {
            return;
        }
        self.indicator = Some(state);
        log::debug!("indicator -> {state:?}");
        let label = match state {
            IndicatorState::Searching => "Looking for a face in the centre of the frame...",
            IndicatorState::Found => "Face found",
        };
        self.line(&format!("{} {label}", ansi_dot(state)));
    }

    fn show_spinner(&mut self) {
        if !self.spinner_visible {
            self.spinner_visible = true;
            self.line("Preparing histogram...");
        }
    }

    fn hide_spinner(&mut self) {
        self.spinner_visible = false;
    }
}
