mod ico;
mod order;
mod status;
mod wallet;

pub use ico::{IcoTransaction, IcoTransactionFilter, IcoTransactionStatus, IcoTransactionType};
pub use order::{Order, OrderPaymentStatus, OrderStatus};
pub use status::{transition, StatusLifecycle, Transition, TransitionDetails, Transitional};
pub use wallet::{
    TransactionCategory, TransactionFilter, TransactionStatus, TransactionType, WalletTransaction,
};
