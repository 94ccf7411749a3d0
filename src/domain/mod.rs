pub mod board;
pub mod card;
pub mod filter;
pub mod ids;
pub mod list;
pub mod ordering;
pub mod view;

pub use board::Board;
pub use card::{Card, CardPatch};
pub use filter::{CardFilter, DateFilter};
pub use ids::{BoardId, CardId, ListId};
pub use list::List;
pub use view::{ListCards, LocalView};
