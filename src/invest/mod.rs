pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{
    create_invest_asset, create_invest_transaction, delete_invest_asset,
    delete_invest_transaction, get_invest_stats, list_asset_transactions, list_invest_assets,
    update_invest_asset, update_invest_asset_value,
};
