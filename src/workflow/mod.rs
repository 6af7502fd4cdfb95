pub mod flows;
pub mod processors;

pub use flows::AnalysisPipeline;
