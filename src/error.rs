use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum MarketDataError {
    #[display("failed to build {provider} client")]
    Client { provider: String },
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum DashboardError {
    #[display("terminal setup failed")]
    Terminal,
    #[display("failed to read terminal event")]
    Event,
    #[display("failed to draw frame")]
    Draw,
}
