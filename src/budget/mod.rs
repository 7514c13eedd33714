pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{
    change_budget_status, create_budget, delete_budget, get_budget, get_budget_by_month_year,
    get_new_budget_form_data, list_budgets, update_budget,
};
