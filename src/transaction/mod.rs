pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{
    create_transaction, delete_transaction, get_import_context, get_transaction,
    import_transactions, list_transactions, update_transaction,
};
