use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use crate::auth::Token;
use crate::cache::SummaryCache;
use crate::config::{Config, RateLimit, SentryConfig, TranslationConfig};
use crate::error::SentryLensError;
use crate::language::CommonWordDetector;
use crate::providers::sentry::SentryProvider;
use crate::providers::together::{PassthroughTranslator, TogetherTranslator, Translator};
use crate::rate_limit::RateLimiter;

#[derive(Parser)]
#[command(name = "sentrylens")]
#[command(author, version, about = "AI-summarized Sentry issue reports", long_about = None)]
pub struct Cli {
    /// Sentry API base URL
    #[arg(long, env = "SENTRY_URL", default_value = "https://us.sentry.io/api/0")]
    sentry_url: String,

    /// Sentry organization slug
    #[arg(long, env = "SENTRY_ORG")]
    org: String,

    /// Numeric Sentry project id
    #[arg(short = 'P', long, env = "SENTRY_PROJECT")]
    project: String,

    /// Sentry auth token
    #[arg(short, long, env = "SENTRY_AUTH_TOKEN", hide_env_values = true)]
    token: String,

    /// Completion endpoint used for translation
    #[arg(
        long,
        env = "TOGETHER_URL",
        default_value = "https://api.together.xyz/v1/completions"
    )]
    together_url: String,

    /// Translation API key (summaries stay untranslated without it)
    #[arg(long, env = "TOGETHER_API_KEY", hide_env_values = true)]
    together_key: Option<String>,

    /// Model used for translation
    #[arg(long, default_value = "meta-llama/Llama-3.3-70B-Instruct-Turbo")]
    model: String,

    /// Summary cache file
    #[arg(long, default_value = "summary_cache.json")]
    cache_file: PathBuf,

    /// Days before a cached summary expires
    #[arg(long, default_value_t = 7)]
    cache_days: i64,

    /// Summary requests allowed per window
    #[arg(long, default_value_t = 5)]
    summary_limit: u32,

    /// Summary rate window in seconds
    #[arg(long, default_value_t = 60)]
    summary_window: u64,

    /// Translation requests allowed per window
    #[arg(long, default_value_t = 60)]
    translation_limit: u32,

    /// Translation rate window in seconds
    #[arg(long, default_value_t = 60)]
    translation_window: u64,

    /// Retries for failed issue queries
    #[arg(long, default_value_t = crate::retry::MAX_RETRIES)]
    max_retries: u32,

    /// Pause between enrichment batches in seconds
    #[arg(long, default_value_t = 2)]
    batch_pause: u64,

    /// Titles kept in the priority cache
    #[arg(long, default_value_t = 1000)]
    priority_capacity: u64,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, default_value_t = false)]
    pretty: bool,

    /// Print the fields of one unresolved issue and exit
    #[arg(long, default_value_t = false)]
    show_issue_fields: bool,
}

impl Cli {
    fn config(&self) -> crate::error::Result<Config> {
        let cache_ttl = chrono::Duration::try_days(self.cache_days).ok_or_else(|| {
            SentryLensError::Config(format!("cache days out of range: {}", self.cache_days))
        })?;

        Ok(Config {
            sentry: SentryConfig {
                base_url: self.sentry_url.clone(),
                org: self.org.clone(),
                project: self.project.clone(),
                token: Token::from(self.token.as_str()),
            },
            translation: TranslationConfig {
                endpoint: self.together_url.clone(),
                api_key: self
                    .together_key
                    .as_deref()
                    .map(Token::from)
                    .filter(|t| !t.is_empty()),
                model: self.model.clone(),
            },
            cache_path: self.cache_file.clone(),
            cache_ttl,
            summary_limit: RateLimit::new(
                self.summary_limit,
                Duration::from_secs(self.summary_window),
            ),
            translation_limit: RateLimit::new(
                self.translation_limit,
                Duration::from_secs(self.translation_window),
            ),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_secs(1),
            batch_pause: Duration::from_secs(self.batch_pause),
            priority_capacity: self.priority_capacity,
        })
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.config()?;
        config.validate()?;

        if self.show_issue_fields {
            return show_issue_fields(&config).await;
        }

        let limiter = Arc::new(RateLimiter::new(
            config.summary_limit,
            config.translation_limit,
        ));
        let cache = Arc::new(SummaryCache::load(&config.cache_path, config.cache_ttl));

        let translator: Arc<dyn Translator> = match &config.translation.api_key {
            Some(key) => Arc::new(TogetherTranslator::new(
                &config.translation,
                key.clone(),
                limiter.clone(),
            )?),
            None => {
                warn!("TOGETHER_API_KEY not set, summaries will not be translated");
                Arc::new(PassthroughTranslator)
            }
        };

        info!(
            "Collecting Sentry issues for {}/{}",
            config.sentry.org, config.sentry.project
        );
        let provider = SentryProvider::connect(
            &config,
            cache,
            limiter,
            translator,
            Arc::new(CommonWordDetector::default()),
        )
        .await?;
        let report = provider.generate_multi_sheet_report().await?;

        for (name, sheet) in &report.sheets {
            info!("{name}: {} issues", sheet.len());
        }

        let json_output = report.to_json(self.pretty)?;

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Report written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

async fn show_issue_fields(config: &Config) -> Result<()> {
    match SentryProvider::sample_issue(config).await? {
        Some(serde_json::Value::Object(fields)) => {
            println!("Example issue fields:");
            for (key, value) in &fields {
                println!("{key}: {value}");
            }
        }
        Some(other) => println!("{other}"),
        None => warn!("No unresolved issues to inspect"),
    }
    Ok(())
}
