use indicatif::ProgressStyle;

/// Extension trait for creating named progress indicators.
pub trait NamedProgress {
    /// Creates a spinner style with a name label, for streams of unknown length.
    ///
    /// # Arguments
    ///
    /// * `name` - Label to display with the spinner
    fn named_spinner(name: &str) -> Self;
}

impl NamedProgress for ProgressStyle {
    fn named_spinner(name: &str) -> Self {
        let fmt = format!("{{spinner:.cyan}} {name:<31} {{human_pos:>12}} records [{{elapsed_precise}}, {{per_sec}}] {{msg}}");
        ProgressStyle::default_spinner()
            .template(&fmt)
            .unwrap_or(ProgressStyle::default_spinner())
    }
}
