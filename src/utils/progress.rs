use indicatif::{ProgressBar, ProgressStyle};

const STAGE_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg} Records scanned: {pos} ({per_sec})";

/// Spinner counting the records a stage scans. Hidden when `enabled` is false.
pub fn stage_spinner(enabled: bool, stage_name: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()), // Fallback style
    );
    pb.set_message(stage_name.to_string());
    pb
}
