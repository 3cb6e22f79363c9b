use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress spinner shown while waiting on slow provider calls.
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Runs a fallible task under a spinner. On success the spinner finishes
/// with `done`; on failure it is cleared so the error is not printed under
/// a dangling tick line.
pub fn with_spinner<T>(
    done: &str,
    task: impl FnOnce(&ProgressBar) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let spinner = create_spinner();
    match task(&spinner) {
        Ok(value) => {
            spinner.finish_with_message(done.to_string());
            Ok(value)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_finishes_on_success() {
        let mut seen = None;
        with_spinner("done", |spinner| {
            seen = Some(spinner.clone());
            Ok(())
        })
        .unwrap();
        assert!(seen.unwrap().is_finished());
    }

    #[test]
    fn spinner_is_cleared_when_the_task_fails() {
        let mut seen = None;
        let result = with_spinner("done", |spinner| -> Result<(), _> {
            seen = Some(spinner.clone());
            Err("deploy failed".into())
        });
        assert!(result.is_err());
        assert!(seen.unwrap().is_finished());
    }
}
