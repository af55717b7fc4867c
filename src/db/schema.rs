pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id    TEXT PRIMARY KEY NOT NULL,
    name  TEXT NOT NULL UNIQUE,
    color TEXT NOT NULL DEFAULT '',
    icon  TEXT NOT NULL DEFAULT '',
    type  TEXT NOT NULL CHECK(type IN ('income', 'expense'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id          TEXT PRIMARY KEY NOT NULL,
    categoryId  TEXT NOT NULL,
    amount      REAL NOT NULL CHECK(amount > 0),
    date        TEXT NOT NULL,
    description TEXT,
    type        TEXT NOT NULL CHECK(type IN ('income', 'expense'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(categoryId);

CREATE TABLE IF NOT EXISTS budgets (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    categoryId TEXT REFERENCES categories(id) ON DELETE SET NULL,
    amount     REAL NOT NULL CHECK(amount > 0),
    spent      REAL NOT NULL DEFAULT 0 CHECK(spent >= 0),
    startDate  TEXT NOT NULL,
    endDate    TEXT NOT NULL,
    CHECK(endDate > startDate)
);

CREATE INDEX IF NOT EXISTS idx_budgets_end ON budgets(endDate);
"#;

pub(crate) const CURRENT_VERSION: i32 = 2;

/// Migrations from version N to N+1, applied in order.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS preferences (
        key   TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );",
)];

/// Seeded when the categories table is empty: (id, name, icon, color, type).
pub(crate) const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str, &str)] = &[
    ("food", "Food & Dining", "utensils", "#10b981", "expense"),
    ("shopping", "Shopping", "shopping-bag", "#f59e0b", "expense"),
    ("transportation", "Transportation", "car", "#3b82f6", "expense"),
    ("health", "Health & Fitness", "heart", "#ef4444", "expense"),
    ("entertainment", "Entertainment", "film", "#8b5cf6", "expense"),
    ("housing", "Housing", "home", "#64748b", "expense"),
    ("utilities", "Utilities", "plug", "#0ea5e9", "expense"),
    ("subscriptions", "Subscriptions", "repeat", "#ec4899", "expense"),
    ("other_expense", "Other Expense", "more-horizontal", "#6b7280", "expense"),
    ("salary", "Salary", "briefcase", "#10b981", "income"),
    ("freelance", "Freelance", "laptop", "#3b82f6", "income"),
    ("investments", "Investments", "trending-up", "#f59e0b", "income"),
    ("gifts", "Gifts", "gift", "#ec4899", "income"),
    ("other_income", "Other Income", "more-horizontal", "#6b7280", "income"),
];
