pub mod schema;

pub use schema::{
    Config, EngineKind, GatewayConfig, MemoryConfig, PipelineConfig, ReliabilityConfig,
    ResponseConfig, ResponseMode, StorageConfig,
};
