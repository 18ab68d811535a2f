//! CLI overrides on top of file configuration.

use super::HarvestConfig;

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub language: Option<String>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<usize>,
    pub retry_delay_secs: Option<u64>,
    pub clone_timeout_secs: Option<u64>,
    pub pushed_after: Option<String>,
}

pub fn merge_cli_with_config(mut config: HarvestConfig, cli: CliOverrides) -> HarvestConfig {
    if let Some(language) = cli.language {
        config.language = language;
    }
    // One flag drives both batch stages.
    if let Some(concurrency) = cli.concurrency {
        config.acquire_concurrency = concurrency.max(1);
        config.enrich_concurrency = concurrency.max(1);
    }
    if let Some(retries) = cli.max_retries {
        config.max_retries = retries;
    }
    if let Some(delay) = cli.retry_delay_secs {
        config.retry_delay_secs = delay;
    }
    if let Some(timeout) = cli.clone_timeout_secs {
        config.clone_timeout_secs = timeout;
    }
    if cli.pushed_after.is_some() {
        config.pushed_after = cli.pushed_after;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_win_over_file_values() {
        let file = HarvestConfig { max_retries: 7, language: "rust".into(), ..Default::default() };
        let merged = merge_cli_with_config(
            file,
            CliOverrides { max_retries: Some(1), concurrency: Some(0), ..Default::default() },
        );
        assert_eq!(merged.max_retries, 1);
        assert_eq!(merged.language, "rust");
        assert_eq!(merged.acquire_concurrency, 1);
        assert_eq!(merged.enrich_concurrency, 1);
    }
}
