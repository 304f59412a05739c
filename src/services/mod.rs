pub mod assembler;
pub mod classifier;
pub mod group_resolver;
pub mod rules;
pub mod sampler;
pub mod text_normalizer;

pub use assembler::{assemble_mock, assemble_practice, PracticeRequest};
pub use classifier::{Classification, RuleBasedClassifier};
pub use group_resolver::{GroupBuilder, GroupKey, GroupKeyResolver, PushOutcome};
pub use rules::ExamProfile;
pub use sampler::{filter_by_year, ExamPatternSampler, YearRange};
pub use text_normalizer::normalize;
