pub mod exam_type;
pub mod loaders;
pub mod paper;
pub mod question;

pub use exam_type::ExamType;
pub use loaders::{
    list_raw_files, load_group_database, load_raw_batch, save_group_database,
};
pub use paper::{MockTest, PracticeSet, SectionMap};
pub use question::{AnswerKey, Group, Question, RawBatch, RawQuestion};
