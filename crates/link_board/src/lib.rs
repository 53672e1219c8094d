mod board;

pub use board::{LinkBoard, LinkBoardState, LinkRowState, link_board};
