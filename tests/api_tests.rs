use serde_json::{json, Value};

mod common;
use common::TestApp;

// ============================================================================
// Auth
// ============================================================================

#[actix_rt::test]
async fn test_register_success() {
    let app = TestApp::new().await;
    let email = app.unique_email("newuser");

    let payload = json!({
        "email": email,
        "password": "Password123",
        "full_name": "New User"
    });

    let response = app.post("/auth/register", &payload, None).await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await;
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["full_name"], "New User");
}

#[actix_rt::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;
    let email = app.unique_email("duplicate");

    let payload = json!({
        "email": email,
        "password": "Password123"
    });

    let response1 = app.post("/auth/register", &payload, None).await;
    assert_eq!(response1.status(), 201);

    let response2 = app.post("/auth/register", &payload, None).await;
    assert_eq!(response2.status(), 409);
    let body: Value = response2.json().await;
    assert_eq!(body["error"], "CONFLICT");
}

#[actix_rt::test]
async fn test_register_invalid_email() {
    let app = TestApp::new().await;

    let payload = json!({
        "email": "not-an-email",
        "password": "Password123"
    });

    let response = app.post("/auth/register", &payload, None).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_register_weak_password() {
    let app = TestApp::new().await;
    let email = app.unique_email("weakpass");

    // No uppercase, no digit
    let payload = json!({
        "email": email,
        "password": "weakpassword"
    });

    let response = app.post("/auth/register", &payload, None).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    let email = app.unique_email("login");

    let register_payload = json!({
        "email": email,
        "password": "Password123",
        "full_name": "Login Test"
    });
    app.post("/auth/register", &register_payload, None).await;

    let login_payload = json!({
        "email": email,
        "password": "Password123"
    });

    let response = app.post("/auth/login", &login_payload, None).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await;
    assert!(body["access_token"].is_string());
    assert_eq!(body["user"]["email"], email);
}

#[actix_rt::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    let email = app.unique_email("wrongpass");

    let register_payload = json!({
        "email": email,
        "password": "Password123"
    });
    app.post("/auth/register", &register_payload, None).await;

    let login_payload = json!({
        "email": email,
        "password": "Password456"
    });

    let response = app.post("/auth/login", &login_payload, None).await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_refresh_rotates_token() {
    let app = TestApp::new().await;
    let email = app.unique_email("refresh");

    let register_payload = json!({
        "email": email,
        "password": "Password123"
    });
    let register = app.post("/auth/register", &register_payload, None).await;
    let register_body = register.json().await;
    let refresh_token = register_body["refresh_token"].as_str().unwrap().to_string();

    let refresh_payload = json!({ "refresh_token": refresh_token });
    let response = app.post("/auth/refresh", &refresh_payload, None).await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    assert_ne!(body["refresh_token"].as_str().unwrap(), refresh_token);

    // The old token is revoked after rotation
    let reuse = app.post("/auth/refresh", &refresh_payload, None).await;
    assert_eq!(reuse.status(), 401);
}

#[actix_rt::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let response = app.get("/auth/me", None).await;
    assert_eq!(response.status(), 401);

    let token = app.register_user("me").await;
    let response = app.get("/auth/me", Some(&token)).await;
    assert_eq!(response.status(), 200);
}

// ============================================================================
// Accounts
// ============================================================================

#[actix_rt::test]
async fn test_create_and_list_accounts() {
    let app = TestApp::new().await;
    let token = app.register_user("accounts").await;

    let payload = json!({
        "name": "Daily checking",
        "type": "checking",
        "balance": 1500.00,
        "colorGradient": "blue"
    });

    let response = app.post("/accounts", &payload, Some(&token)).await;
    assert_eq!(response.status(), 201);
    let body = response.json().await;
    assert_eq!(body["name"], "Daily checking");
    assert_eq!(body["type"], "checking");
    assert_eq!(body["balance"], "1500.00");

    let response = app.get("/accounts", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let accounts = response.json().await;
    assert_eq!(accounts.as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_account_summary_buckets() {
    let app = TestApp::new().await;
    let token = app.register_user("summary").await;

    for (name, account_type, balance) in [
        ("Checking", "checking", 1000.00),
        ("Savings", "savings", 5000.00),
        ("Broker", "investment", 2000.00),
        ("Card", "credit", -300.00),
    ] {
        let payload = json!({
            "name": name,
            "type": account_type,
            "balance": balance,
            "colorGradient": "green"
        });
        let response = app.post("/accounts", &payload, Some(&token)).await;
        assert_eq!(response.status(), 201);
    }

    let response = app.get("/accounts/summary", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    assert_eq!(body["summary"]["operatingFunds"], "1000.00");
    assert_eq!(body["summary"]["investing"], "7000.00");
    assert_eq!(body["summary"]["debt"], "-300.00");
    assert_eq!(body["summary"]["netWorth"], "7700.00");
    assert_eq!(body["summary"]["accountsCount"], 4);
}

#[actix_rt::test]
async fn test_account_sub_cent_balance_rejected() {
    let app = TestApp::new().await;
    let token = app.register_user("subcent").await;

    let payload = json!({
        "name": "Precise",
        "type": "checking",
        "balance": 10.001,
        "colorGradient": "blue"
    });

    let response = app.post("/accounts", &payload, Some(&token)).await;
    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_account_ownership_isolation() {
    let app = TestApp::new().await;
    let token_a = app.register_user("owner_a").await;
    let token_b = app.register_user("owner_b").await;

    let payload = json!({
        "name": "Private account",
        "type": "checking",
        "colorGradient": "blue"
    });
    let response = app.post("/accounts", &payload, Some(&token_a)).await;
    let account_id = response.json().await["id"].as_str().unwrap().to_string();

    let response = app
        .get(&format!("/accounts/{account_id}"), Some(&token_b))
        .await;
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Transactions
// ============================================================================

async fn create_account(app: &TestApp, token: &str, name: &str, account_type: &str) -> String {
    let payload = json!({
        "name": name,
        "type": account_type,
        "balance": 0.00,
        "colorGradient": "blue"
    });
    let response = app.post("/accounts", &payload, Some(token)).await;
    assert_eq!(response.status(), 201);
    response.json().await["id"].as_str().unwrap().to_string()
}

async fn create_category(app: &TestApp, token: &str, name: &str, excluded: bool) -> String {
    let payload = json!({
        "name": name,
        "type": "mixed",
        "excludeFromBudgets": excluded,
        "colorGradient": "orange"
    });
    let response = app.post("/categories", &payload, Some(token)).await;
    assert_eq!(response.status(), 201);
    response.json().await["id"].as_str().unwrap().to_string()
}

#[actix_rt::test]
async fn test_income_credits_account_balance() {
    let app = TestApp::new().await;
    let token = app.register_user("income").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;

    let payload = json!({
        "amount": 1200.00,
        "type": "income",
        "transactionDate": "2030-06-10",
        "accountToId": account_id
    });

    let response = app.post("/transactions", &payload, Some(&token)).await;
    assert_eq!(response.status(), 201);

    let response = app.get(&format!("/accounts/{account_id}"), Some(&token)).await;
    assert_eq!(response.json().await["balance"], "1200.00");
}

#[actix_rt::test]
async fn test_transfer_moves_balance_between_accounts() {
    let app = TestApp::new().await;
    let token = app.register_user("transfer").await;
    let from_id = create_account(&app, &token, "Checking", "checking").await;
    let to_id = create_account(&app, &token, "Savings", "savings").await;

    // Seed the source account
    let payload = json!({
        "amount": 500.00,
        "type": "income",
        "transactionDate": "2030-06-01",
        "accountToId": from_id
    });
    app.post("/transactions", &payload, Some(&token)).await;

    let payload = json!({
        "amount": 200.00,
        "type": "transfer",
        "transactionDate": "2030-06-15",
        "accountFromId": from_id,
        "accountToId": to_id
    });
    let response = app.post("/transactions", &payload, Some(&token)).await;
    assert_eq!(response.status(), 201);

    let from = app.get(&format!("/accounts/{from_id}"), Some(&token)).await;
    assert_eq!(from.json().await["balance"], "300.00");
    let to = app.get(&format!("/accounts/{to_id}"), Some(&token)).await;
    assert_eq!(to.json().await["balance"], "200.00");
}

#[actix_rt::test]
async fn test_delete_transaction_restores_balance() {
    let app = TestApp::new().await;
    let token = app.register_user("trx_delete").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;

    let payload = json!({
        "amount": 80.00,
        "type": "expense",
        "transactionDate": "2030-06-20",
        "accountFromId": account_id
    });
    let response = app.post("/transactions", &payload, Some(&token)).await;
    let trx_id = response.json().await["id"].as_str().unwrap().to_string();

    let account = app.get(&format!("/accounts/{account_id}"), Some(&token)).await;
    assert_eq!(account.json().await["balance"], "-80.00");

    let response = app
        .delete(&format!("/transactions/{trx_id}"), Some(&token))
        .await;
    assert_eq!(response.status(), 204);

    let account = app.get(&format!("/accounts/{account_id}"), Some(&token)).await;
    assert_eq!(account.json().await["balance"], "0.00");
}

#[actix_rt::test]
async fn test_expense_requires_source_account() {
    let app = TestApp::new().await;
    let token = app.register_user("shape").await;

    let payload = json!({
        "amount": 10.00,
        "type": "expense",
        "transactionDate": "2030-06-20"
    });
    let response = app.post("/transactions", &payload, Some(&token)).await;
    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_import_creates_rows_and_updates_balance() {
    let app = TestApp::new().await;
    let token = app.register_user("import").await;
    let account_id = create_account(&app, &token, "Statement", "checking").await;

    let context = app
        .get(
            &format!("/transactions/import-context?accountId={account_id}"),
            Some(&token),
        )
        .await;
    assert_eq!(context.status(), 200);
    assert_eq!(context.json().await["balance"], "0.00");

    let payload = json!({
        "accountId": account_id,
        "transactions": [
            { "amount": 1000.00, "type": "income", "transactionDate": "2030-05-01" },
            { "amount": 150.00, "type": "expense", "transactionDate": "2030-05-03",
              "description": "Groceries" }
        ]
    });
    let response = app
        .post("/transactions/import", &payload, Some(&token))
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(response.json().await["importedCount"], 2);

    let account = app.get(&format!("/accounts/{account_id}"), Some(&token)).await;
    assert_eq!(account.json().await["balance"], "850.00");
}

// ============================================================================
// Budgets
// ============================================================================

#[actix_rt::test]
async fn test_open_budget_balance_from_planned_values() {
    let app = TestApp::new().await;
    let token = app.register_user("budget_open").await;
    let salary = create_category(&app, &token, "Salary", false).await;
    let rent = create_category(&app, &token, "Rent", false).await;
    let ignored = create_category(&app, &token, "Ignored", true).await;

    let payload = json!({
        "month": 6,
        "year": 2030,
        "observations": "June plan",
        "categories": [
            { "categoryId": salary, "plannedCredit": 2000.00, "plannedDebit": 0.00 },
            { "categoryId": rent, "plannedCredit": 0.00, "plannedDebit": 650.00 },
            { "categoryId": ignored, "plannedCredit": 0.00, "plannedDebit": 9999.00 }
        ]
    });
    let response = app.post("/budgets", &payload, Some(&token)).await;
    assert_eq!(response.status(), 201);

    let response = app.get("/budgets?page=0&pageSize=10", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    let item = &body["results"][0];
    // Balance is planned credits minus debits over non-excluded categories
    assert_eq!(item["balance"], "1350.00");
    assert_eq!(item["creditAmount"], "2000.00");
    assert_eq!(item["debitAmount"], "650.00");
    assert_eq!(item["savingsRatePercentage"], "67.5");
}

#[actix_rt::test]
async fn test_closed_budget_balance_from_actuals() {
    let app = TestApp::new().await;
    let token = app.register_user("budget_closed").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;
    let food = create_category(&app, &token, "Food", false).await;

    let payload = json!({
        "month": 6,
        "year": 2030,
        "categories": [
            { "categoryId": food, "plannedCredit": 0.00, "plannedDebit": 100.00 }
        ]
    });
    let response = app.post("/budgets", &payload, Some(&token)).await;
    let budget_id = response.json().await["id"].as_str().unwrap().to_string();

    // Actual activity in the budget month
    for (amount, trx_type, key) in [
        (900.00, "income", "accountToId"),
        (250.00, "expense", "accountFromId"),
    ] {
        let payload = json!({
            "amount": amount,
            "type": trx_type,
            "transactionDate": "2030-06-15",
            "categoryId": food,
            key: account_id
        });
        let response = app.post("/transactions", &payload, Some(&token)).await;
        assert_eq!(response.status(), 201);
    }

    let response = app
        .patch(
            &format!("/budgets/{budget_id}/status"),
            &json!({ "isOpen": false }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/budgets?page=0&pageSize=10", Some(&token)).await;
    let body = response.json().await;
    let item = &body["results"][0];
    // Closed budgets use actual amounts, not planned ones
    assert_eq!(item["balance"], "650.00");
    assert_eq!(item["creditAmount"], "900.00");
    assert_eq!(item["debitAmount"], "250.00");
}

#[actix_rt::test]
async fn test_budget_detail_reports_current_amounts() {
    let app = TestApp::new().await;
    let token = app.register_user("budget_detail").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;
    let food = create_category(&app, &token, "Food", false).await;

    let payload = json!({
        "month": 7,
        "year": 2030,
        "categories": [
            { "categoryId": food, "plannedCredit": 0.00, "plannedDebit": 400.00 }
        ]
    });
    let response = app.post("/budgets", &payload, Some(&token)).await;
    let budget_id = response.json().await["id"].as_str().unwrap().to_string();

    let payload = json!({
        "amount": 120.00,
        "type": "expense",
        "transactionDate": "2030-07-04",
        "categoryId": food,
        "accountFromId": account_id,
        "isEssential": true
    });
    app.post("/transactions", &payload, Some(&token)).await;

    let response = app.get(&format!("/budgets/{budget_id}"), Some(&token)).await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    assert_eq!(body["debitEssentialTrxTotal"], "120.00");

    let category = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["categoryId"] == food.as_str())
        .expect("category in detail");
    assert_eq!(category["plannedDebit"], "400.00");
    assert_eq!(category["currentDebit"], "120.00");
}

#[actix_rt::test]
async fn test_budget_duplicate_month_conflict() {
    let app = TestApp::new().await;
    let token = app.register_user("budget_dup").await;

    let payload = json!({ "month": 3, "year": 2031 });
    let response = app.post("/budgets", &payload, Some(&token)).await;
    assert_eq!(response.status(), 201);

    let response = app.post("/budgets", &payload, Some(&token)).await;
    assert_eq!(response.status(), 409);
}

#[actix_rt::test]
async fn test_budget_search_filters_results() {
    let app = TestApp::new().await;
    let token = app.register_user("budget_search").await;

    for (month, observations) in [(1, "vacation fund"), (2, "normal month")] {
        let payload = json!({
            "month": month,
            "year": 2031,
            "observations": observations
        });
        app.post("/budgets", &payload, Some(&token)).await;
    }

    let response = app
        .get("/budgets?query=vacation&page=0&pageSize=10", Some(&token))
        .await;
    let body = response.json().await;
    assert_eq!(body["filteredCount"], 1);
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["results"][0]["observations"], "vacation fund");
}

#[actix_rt::test]
async fn test_budget_ownership_isolation() {
    let app = TestApp::new().await;
    let token_a = app.register_user("budget_a").await;
    let token_b = app.register_user("budget_b").await;

    let payload = json!({ "month": 4, "year": 2031 });
    let response = app.post("/budgets", &payload, Some(&token_a)).await;
    let budget_id = response.json().await["id"].as_str().unwrap().to_string();

    let response = app.get(&format!("/budgets/{budget_id}"), Some(&token_b)).await;
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Investments
// ============================================================================

#[actix_rt::test]
async fn test_invest_asset_roundtrip_and_stats() {
    let app = TestApp::new().await;
    let token = app.register_user("invest").await;

    let payload = json!({
        "name": "World ETF",
        "ticker": "VWCE",
        "type": "etf",
        "broker": "Broker X"
    });
    let response = app.post("/invest/assets", &payload, Some(&token)).await;
    assert_eq!(response.status(), 201);
    let asset_id = response.json().await["id"].as_str().unwrap().to_string();

    let payload = json!({
        "assetId": asset_id,
        "type": "buy",
        "trxDate": "2030-01-10",
        "totalAmount": 500.00,
        "units": 5.0
    });
    let response = app
        .post("/invest/transactions", &payload, Some(&token))
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .patch(
            &format!("/invest/assets/{asset_id}/value"),
            &json!({ "currentValue": 600.00 }),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    assert_eq!(body["investedValue"], "500.00");
    assert_eq!(body["currentValue"], "600.00");
    assert_eq!(body["absoluteRoiValue"], "100.00");

    let response = app.get("/invest/stats", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let stats = response.json().await;
    assert_eq!(stats["totalInvestedValue"], "500.00");
    assert_eq!(stats["totalCurrentValue"], "600.00");
    assert_eq!(stats["globalRoiValue"], "100.00");
    assert_eq!(stats["globalRoiPercentage"], "20");
    let distribution = stats["currentValueDistribution"].as_array().unwrap();
    assert_eq!(distribution.len(), 1);
    assert_eq!(distribution[0]["type"], "etf");
    assert_eq!(distribution[0]["percentage"], "100");
    assert_eq!(stats["topPerformingAssets"][0]["name"], "World ETF");
}

#[actix_rt::test]
async fn test_invest_cannot_sell_more_than_held() {
    let app = TestApp::new().await;
    let token = app.register_user("oversell").await;

    let payload = json!({
        "name": "Tiny position",
        "type": "stocks"
    });
    let response = app.post("/invest/assets", &payload, Some(&token)).await;
    let asset_id = response.json().await["id"].as_str().unwrap().to_string();

    let payload = json!({
        "assetId": asset_id,
        "type": "sell",
        "trxDate": "2030-01-10",
        "totalAmount": 100.00,
        "units": 1.0
    });
    let response = app
        .post("/invest/transactions", &payload, Some(&token))
        .await;
    assert_eq!(response.status(), 400);
}

// ============================================================================
// Stats
// ============================================================================

#[actix_rt::test]
async fn test_month_distribution_totals() {
    let app = TestApp::new().await;
    let token = app.register_user("distribution").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;
    let food = create_category(&app, &token, "Food", false).await;

    for (amount, trx_type, key) in [
        (2000.00, "income", "accountToId"),
        (300.00, "expense", "accountFromId"),
    ] {
        let payload = json!({
            "amount": amount,
            "type": trx_type,
            "transactionDate": "2030-09-10",
            "categoryId": food,
            key: account_id
        });
        app.post("/transactions", &payload, Some(&token)).await;
    }

    let response = app
        .get("/stats/month-distribution?month=9&year=2030", Some(&token))
        .await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    assert_eq!(body["totalIncome"], "2000.00");
    assert_eq!(body["totalExpenses"], "300.00");
}

#[actix_rt::test]
async fn test_patrimony_evolution_returns_series() {
    let app = TestApp::new().await;
    let token = app.register_user("patrimony").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;

    let payload = json!({
        "amount": 1000.00,
        "type": "income",
        "transactionDate": "2025-01-15",
        "accountToId": account_id
    });
    app.post("/transactions", &payload, Some(&token)).await;

    let response = app.get("/stats/patrimony-evolution", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    let months = body["months"].as_array().unwrap();
    assert!(!months.is_empty());
    // The series ends at the current total
    assert_eq!(months.last().unwrap()["netWorth"], "1000.00");
    // And starts at the first month with activity
    assert_eq!(months[0]["month"], 1);
    assert_eq!(months[0]["year"], 2025);
    assert_eq!(months[0]["netWorth"], "1000.00");
}

#[actix_rt::test]
async fn test_year_by_year_distribution() {
    let app = TestApp::new().await;
    let token = app.register_user("yearly").await;
    let account_id = create_account(&app, &token, "Main", "checking").await;
    let food = create_category(&app, &token, "Food", false).await;

    for date in ["2030-02-01", "2030-11-30"] {
        let payload = json!({
            "amount": 50.00,
            "type": "expense",
            "transactionDate": date,
            "categoryId": food,
            "accountFromId": account_id
        });
        app.post("/transactions", &payload, Some(&token)).await;
    }

    let response = app.get("/stats/year-by-year?year=2030", Some(&token)).await;
    assert_eq!(response.status(), 200);
    let body = response.json().await;
    assert_eq!(body["totalExpenses"], "100.00");

    let food_row = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["categoryId"] == food.as_str())
        .expect("category in distribution");
    assert_eq!(food_row["currentDebit"], "100.00");
}
