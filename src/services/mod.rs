pub mod board;
pub mod payment;

pub use board::{BoardService, BoardView, ViewKind};
