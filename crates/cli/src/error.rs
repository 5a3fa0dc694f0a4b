use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Settings(#[from] engine::settings::SettingsError),

    #[error(transparent)]
    UnknownTable(#[from] model::table::UnknownTable),

    #[error("connector setup failed: {0}")]
    Connector(#[from] connectors::error::ConnectorError),

    #[error(transparent)]
    Source(#[from] connectors::error::SourceError),

    #[error(transparent)]
    Engine(#[from] engine::error::EngineError),

    #[error("failed to serialize report: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
