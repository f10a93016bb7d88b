//! Operation domain module.
//!
//! - `request`: The four-operation vocabulary and validated argument shapes
//! - `result`: Uniform success/error result handed to the composer

mod request;
mod result;

pub use request::{
    AppendArgs, CreateArgs, Operation, OperationKind, OperationRequest, SearchArgs, UpdateArgs,
};
pub use result::{OperationResult, Outcome, SYNTHESIZE_OPERATION};
