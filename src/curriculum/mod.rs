// Curriculum reference data: lessons, sublessons, completion config
//
// The curriculum is immutable after load. All mutable progress lives in
// the progression engine's per-session snapshots, never here.

mod catalog;
mod model;

pub use model::{CompletionConfig, Curriculum, Lesson, Sublesson, SublessonKind};
