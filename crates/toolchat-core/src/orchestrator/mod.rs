//! The turn state machine
//!
//! ```text
//! AwaitingQuery -> BuildingCatalog -> AwaitingCompletion -+-> Done
//!                                                         |
//!                    ExecutingTool -> AwaitingFinalCompletion -> Done
//! ```
//!
//! At most one tool is executed per query. Tool and completion failures end
//! the turn, never the loop.

mod options;
mod turn;
mod turn_loop;

pub use options::{HistoryPolicy, LoopOptions, ToolCallStyle};
pub use turn::{TurnError, TurnOutcome, TurnReport, TurnState};
pub use turn_loop::OrchestrationLoop;
