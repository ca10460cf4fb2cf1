use std::{borrow::Cow, time::Duration};

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone)]
pub struct ProgressConfig {
    is_enabled: bool,
    template: String,
    spinner_template: String,
}

impl ProgressConfig {
    pub fn new(is_enabled: bool, template: String, spinner_template: String) -> Self {
        ProgressConfig {
            is_enabled,
            template,
            spinner_template,
        }
    }

    pub fn default() -> Self {
        ProgressConfig {
            is_enabled: true,
            template: "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
                .to_string(),
            spinner_template: "{spinner:.green} [{elapsed_precise}] {msg}".to_string(),
        }
    }

    pub fn disabled() -> Self {
        ProgressConfig {
            is_enabled: false,
            template: "".to_string(),
            spinner_template: "".to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn style(&self) -> Result<ProgressStyle> {
        Ok(ProgressStyle::default_bar().template(&self.template)?)
    }

    /// Bar over a known number of pages
    pub fn build_with_message<T: TryInto<u64>>(
        &self,
        length: T,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<ProgressBar> {
        if !self.is_enabled() {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(
            length
                .try_into()
                .map_err(|_e| anyhow!("Failed to convert length into u64"))?,
        );
        pb.set_style(self.style()?);
        pb.set_message(message);

        Ok(pb)
    }

    /// Spinner for when the number of pages is unknown
    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> Result<ProgressBar> {
        if !self.is_enabled() {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template(&self.spinner_template)?);
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));

        Ok(pb)
    }
}
