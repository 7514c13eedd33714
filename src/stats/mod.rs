pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{
    get_month_distribution, get_patrimony_evolution, get_year_by_year_distribution,
};
