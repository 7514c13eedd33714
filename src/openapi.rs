use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::models::{
    AccountResponse, AccountType, AccountsSummary, AccountsSummaryResponse, CreateAccountDto,
    UpdateAccountDto, UpdateBalanceDto,
};
use crate::auth::models::{
    AuthTokenResponse, CreateUserDto, LoginDto, RefreshTokenDto, UserResponseDto,
};
use crate::budget::models::{
    BudgetCategoryDetail, BudgetDetailResponse, BudgetListItem, CategoryPlannedValuesDto,
    CreateBudgetDto, NewBudgetCategoryData, NewBudgetFormDataResponse, PaginatedBudgetsResponse,
    UpdateBudgetDto, UpdateBudgetStatusDto,
};
use crate::category::models::{
    CategoryResponse, CategoryType, CreateCategoryDto, UpdateCategoryDto,
};
use crate::errors::ErrorResponse;
use crate::invest::models::{
    AssetType, AssetTypeDistribution, CreateAssetDto, CreateInvestTransactionDto,
    InvestAssetResponse, InvestStatsResponse, InvestTransactionResponse, InvestTrxType,
    TopPerformingAsset, UpdateAssetDto, UpdateAssetValueDto,
};
use crate::stats::models::{
    CategoryDistributionItem, MonthDistributionResponse, PatrimonyEvolutionResponse,
    PatrimonyMonth, YearByYearResponse,
};
use crate::transaction::models::{
    CreateTransactionDto, ImportContextResponse, ImportResultResponse, ImportTransactionItemDto,
    ImportTransactionsDto, PaginatedTransactionResponse, TransactionResponse, TransactionType,
    UpdateTransactionDto,
};

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FinWise API",
        version = "1.0.0",
        description = "RESTful API for personal finances: accounts, transactions, monthly budgets, investments and dashboards",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Authentication and user management"),
        (name = "Accounts", description = "Financial account management"),
        (name = "Categories", description = "Income/expense category management"),
        (name = "Budgets", description = "Monthly budgets with planned vs. actual amounts"),
        (name = "Transactions", description = "Transaction management with atomic balance updates"),
        (name = "Investments", description = "Investment portfolio and statistics"),
        (name = "Stats", description = "Dashboard statistics")
    ),
    paths(
        // Auth endpoints
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        // Account endpoints
        crate::account::handlers::list_accounts,
        crate::account::handlers::get_accounts_summary,
        crate::account::handlers::get_account,
        crate::account::handlers::create_account,
        crate::account::handlers::update_account,
        crate::account::handlers::update_account_balance,
        crate::account::handlers::delete_account,
        // Category endpoints
        crate::category::handlers::list_categories,
        crate::category::handlers::get_category,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::delete_category,
        // Budget endpoints
        crate::budget::handlers::list_budgets,
        crate::budget::handlers::get_new_budget_form_data,
        crate::budget::handlers::get_budget_by_month_year,
        crate::budget::handlers::get_budget,
        crate::budget::handlers::create_budget,
        crate::budget::handlers::update_budget,
        crate::budget::handlers::change_budget_status,
        crate::budget::handlers::delete_budget,
        // Transaction endpoints
        crate::transaction::handlers::list_transactions,
        crate::transaction::handlers::get_import_context,
        crate::transaction::handlers::import_transactions,
        crate::transaction::handlers::get_transaction,
        crate::transaction::handlers::create_transaction,
        crate::transaction::handlers::update_transaction,
        crate::transaction::handlers::delete_transaction,
        // Investment endpoints
        crate::invest::handlers::list_invest_assets,
        crate::invest::handlers::get_invest_stats,
        crate::invest::handlers::create_invest_asset,
        crate::invest::handlers::update_invest_asset,
        crate::invest::handlers::update_invest_asset_value,
        crate::invest::handlers::delete_invest_asset,
        crate::invest::handlers::list_asset_transactions,
        crate::invest::handlers::create_invest_transaction,
        crate::invest::handlers::delete_invest_transaction,
        // Stats endpoints
        crate::stats::handlers::get_patrimony_evolution,
        crate::stats::handlers::get_month_distribution,
        crate::stats::handlers::get_year_by_year_distribution,
    ),
    components(
        schemas(
            // Error response
            ErrorResponse,
            // Auth schemas
            CreateUserDto,
            LoginDto,
            RefreshTokenDto,
            UserResponseDto,
            AuthTokenResponse,
            // Account schemas
            AccountType,
            AccountResponse,
            AccountsSummary,
            AccountsSummaryResponse,
            CreateAccountDto,
            UpdateAccountDto,
            UpdateBalanceDto,
            // Category schemas
            CategoryType,
            CategoryResponse,
            CreateCategoryDto,
            UpdateCategoryDto,
            // Budget schemas
            BudgetListItem,
            PaginatedBudgetsResponse,
            BudgetCategoryDetail,
            BudgetDetailResponse,
            NewBudgetCategoryData,
            NewBudgetFormDataResponse,
            CategoryPlannedValuesDto,
            CreateBudgetDto,
            UpdateBudgetDto,
            UpdateBudgetStatusDto,
            // Transaction schemas
            TransactionType,
            TransactionResponse,
            PaginatedTransactionResponse,
            CreateTransactionDto,
            UpdateTransactionDto,
            ImportContextResponse,
            ImportTransactionItemDto,
            ImportTransactionsDto,
            ImportResultResponse,
            // Investment schemas
            AssetType,
            InvestTrxType,
            InvestAssetResponse,
            InvestTransactionResponse,
            CreateAssetDto,
            UpdateAssetDto,
            UpdateAssetValueDto,
            CreateInvestTransactionDto,
            AssetTypeDistribution,
            TopPerformingAsset,
            InvestStatsResponse,
            // Stats schemas
            PatrimonyMonth,
            PatrimonyEvolutionResponse,
            CategoryDistributionItem,
            MonthDistributionResponse,
            YearByYearResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
