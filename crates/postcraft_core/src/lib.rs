pub mod domain;
pub mod ports;
pub mod workflow;

pub use domain::{
    AuthSession, DescriptorSource, GeneratedPost, GeneratedText, GenerationSource, Language,
    RawSample, StyleAnalysis, StyleDescriptor, StyleProfile, User, UserCredentials,
};
pub use ports::{
    DatabaseService, PortError, PortResult, PostGenerationService, StyleAnalysisService,
};
pub use workflow::{Workflow, WorkflowError};
