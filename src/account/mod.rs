pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{
    create_account, delete_account, get_account, get_accounts_summary, list_accounts,
    update_account, update_account_balance,
};
