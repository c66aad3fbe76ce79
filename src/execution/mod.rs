// Position management, account reporting and buffered market data
pub mod candle_buffer;
pub mod performance;
pub mod position_manager;

pub use candle_buffer::CandleBuffer;
pub use performance::{best_performers, AccountSnapshot, InstrumentPerformance};
pub use position_manager::{
    EquityPoint, ExecutionAction, ExecutionDecision, Position, PositionManager,
};
