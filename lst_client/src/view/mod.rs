pub mod board;
pub mod card;

pub use board::BoardView;
pub use card::{CardView, DragSource, DropTarget};
