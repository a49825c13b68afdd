pub mod ast;
pub mod compiler;
pub mod condition;
pub mod error;
pub mod parser;
pub mod relation;
mod render;
pub mod storage;

#[cfg(test)]
mod tests;

pub use compiler::{Engine, Outcome, Plan, PlanStep};
pub use condition::{Condition, Operand, Operator};
pub use error::{Error, ErrorKind, Result};
pub use parser::{parse_condition, parse_conjunction, parse_statement};
pub use relation::{Relation, Tuple};
pub use storage::{DirStorage, MemoryStorage, Storage};
