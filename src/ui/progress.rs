use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::ui::renderer::SpinnerHandle;

const TICK: Duration = Duration::from_millis(80);

#[derive(Debug)]
pub enum ListSpinner {
    Live(ProgressBar),
    Silent,
}

impl ListSpinner {
    pub fn live(label: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(label.to_owned());
        spinner.enable_steady_tick(TICK);
        ListSpinner::Live(spinner)
    }
}

impl SpinnerHandle for ListSpinner {
    fn finish_success(&self, message: &str) {
        if let ListSpinner::Live(spinner) = self {
            spinner.finish_with_message(message.to_owned());
        }
    }

    fn finish_error(&self, message: &str) {
        if let ListSpinner::Live(spinner) = self {
            spinner.abandon_with_message(message.to_owned());
        }
    }
}
