use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL")]
    pub database_url: String,

    #[envconfig(from = "REDIS_URL")]
    pub redis_url: String,

    #[envconfig(from = "WORKER_COUNT", default = "4")]
    pub worker_count: u32,

    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub bind_host: String,

    #[envconfig(from = "BIND_PORT", default = "8080")]
    pub bind_port: u16,

    #[envconfig(from = "MAX_DB_CONNECTIONS", default = "10")]
    pub max_db_connections: u32,

    #[envconfig(from = "MAX_BODY_BYTES", default = "2097152")]
    pub max_body_bytes: usize,

    #[envconfig(from = "QUEUE_POP_TIMEOUT_MS", default = "1000")]
    pub queue_pop_timeout_ms: u64,

    #[envconfig(from = "WORKER_ERROR_BACKOFF_MS", default = "1000")]
    pub worker_error_backoff_ms: u64,

    #[envconfig(from = "STARTUP_MAX_RETRIES", default = "5")]
    pub startup_max_retries: u32,

    #[envconfig(from = "STARTUP_INITIAL_BACKOFF_MS", default = "2000")]
    pub startup_initial_backoff_ms: u64,

    #[envconfig(from = "EXPORT_PROMETHEUS", default = "true")]
    pub export_prometheus: bool,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = Config {
            database_url: "postgres://localhost".to_string(),
            redis_url: "redis://localhost".to_string(),
            worker_count: 4,
            bind_host: "127.0.0.1".to_string(),
            bind_port: 9090,
            max_db_connections: 10,
            max_body_bytes: 2_097_152,
            queue_pop_timeout_ms: 1000,
            worker_error_backoff_ms: 1000,
            startup_max_retries: 5,
            startup_initial_backoff_ms: 2000,
            export_prometheus: true,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }
}
