use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub ansi_colors: bool,
    pub include_target: bool,
    pub include_thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            ansi_colors: true,
            include_target: false,
            include_thread_names: false,
        }
    }
}

impl LogConfig {
    /// Debug output with the decode/reader thread names attached.
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            include_thread_names: true,
            ..Self::default()
        }
    }
}

pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_thread_names(config.include_thread_names)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
