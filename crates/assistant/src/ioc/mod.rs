//! IOC Extraction & Threat Scoring Engine
//!
//! Pure, deterministic components shared by the specialist tools: indicator
//! extraction from free text, type detection for bare indicator strings,
//! detection-ratio scoring, and threat-level recommendation lookup.

pub mod detect;
pub mod extractor;
pub mod recommend;
pub mod scoring;
pub mod types;

pub use detect::detect_type;
pub use extractor::{ExtractorConfig, IocExtractor};
pub use recommend::{recommend, recommend_markdown};
pub use scoring::{aggregate, confidence, score, Confidence};
pub use types::{DetectionResult, Indicator, IocKind, IocSource, ThreatLevel};
