use indicatif::{ProgressBar, ProgressStyle};

/// Returns None for empty workloads so callers can skip bar bookkeeping.
pub fn progress_bar(len: u64, message: String) -> Option<ProgressBar> {
    if len == 0 {
        return None;
    }

    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-")
    );
    bar.set_message(message);

    Some(bar)
}
