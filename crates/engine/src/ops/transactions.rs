mod list;
mod write;

pub use list::{HistoryFilter, HistoryItem, HistoryPage};
pub use write::TransferReceipt;
