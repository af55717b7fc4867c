#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::error::LedgerError;
use crate::models::timestamp::{parse_end_timestamp, parse_timestamp};

fn ledger() -> Ledger {
    Ledger::from_database(Database::open_in_memory().unwrap())
}

fn expense(id: &str, amount: Decimal, date: &str, category: &str) -> Transaction {
    Transaction {
        id: TransactionId::new(id),
        amount,
        date: parse_timestamp(date).unwrap(),
        description: None,
        category_id: CategoryId::new(category),
        kind: EntryType::Expense,
    }
}

fn march_budget(id: &str, category: Option<&str>) -> Budget {
    Budget {
        id: BudgetId::new(id),
        name: format!("{id} budget"),
        amount: dec!(200),
        spent: Decimal::ZERO,
        category_id: category.map(CategoryId::from),
        start_date: parse_timestamp("2024-03-01").unwrap(),
        end_date: parse_end_timestamp("2024-03-31").unwrap(),
    }
}

fn spent(ledger: &mut Ledger, id: &str) -> Decimal {
    ledger.budget(&BudgetId::new(id)).unwrap().unwrap().spent
}

// ── Initialization ────────────────────────────────────────────

#[test]
fn test_initialize_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = Ledger::new(dir.path().join("ledger.db"));

    ledger.initialize().unwrap();
    let first = ledger.categories().unwrap().len();
    assert!(first > 0);

    ledger.initialize().unwrap();
    assert_eq!(ledger.categories().unwrap().len(), first);
}

#[test]
fn test_first_access_initializes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazy.db");
    let mut ledger = Ledger::new(path.clone());
    assert!(!path.exists());

    assert!(ledger.budgets().unwrap().is_empty());
    assert!(path.exists());
    assert!(!ledger.categories().unwrap().is_empty());
}

#[test]
fn test_reopen_keeps_data_without_reseeding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let seeded = {
        let mut ledger = Ledger::new(path.clone());
        ledger.delete_category(&CategoryId::new("gifts")).unwrap();
        ledger
            .add_transaction(&expense("t1", dec!(12.5), "2024-03-02", "food"))
            .unwrap();
        ledger.categories().unwrap().len()
    };

    let mut ledger = Ledger::new(path);
    assert_eq!(ledger.categories().unwrap().len(), seeded);
    assert_eq!(ledger.transactions().unwrap().len(), 1);
}

#[test]
fn test_open_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = Ledger::new(dir.path().join("missing").join("ledger.db"));
    assert!(matches!(ledger.initialize(), Err(LedgerError::Open { .. })));
}

// ── Budget synchronization ────────────────────────────────────

#[test]
fn test_add_expense_updates_matching_budget() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();

    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(50));
}

#[test]
fn test_delete_restores_spent() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .unwrap();

    assert_eq!(ledger.delete_transaction(&TransactionId::new("t1")).unwrap(), 1);
    assert_eq!(spent(&mut ledger, "food"), Decimal::ZERO);
}

#[test]
fn test_update_category_moves_spend() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    ledger
        .add_budget(&march_budget("transport", Some("transportation")))
        .unwrap();

    let mut txn = expense("t1", dec!(50), "2024-03-15", "food");
    ledger.add_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(50));
    assert_eq!(spent(&mut ledger, "transport"), Decimal::ZERO);

    txn.category_id = CategoryId::new("transportation");
    assert_eq!(ledger.update_transaction(&txn).unwrap(), 1);
    assert_eq!(spent(&mut ledger, "food"), Decimal::ZERO);
    assert_eq!(spent(&mut ledger, "transport"), dec!(50));
}

#[test]
fn test_all_categories_budget_accumulates_everything() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("all", None)).unwrap();

    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .unwrap();
    ledger
        .add_transaction(&expense("t2", dec!(30), "2024-03-20", "housing"))
        .unwrap();
    ledger
        .add_transaction(&expense("t3", dec!(99), "2024-04-01", "housing"))
        .unwrap();
    assert_eq!(spent(&mut ledger, "all"), dec!(80));
}

#[test]
fn test_income_never_counts() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("all", None)).unwrap();

    let mut txn = expense("t1", dec!(1000), "2024-03-15", "salary");
    txn.kind = EntryType::Income;
    ledger.add_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "all"), Decimal::ZERO);
}

#[test]
fn test_type_change_removes_and_restores_spend() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("all", None)).unwrap();

    let mut txn = expense("t1", dec!(40), "2024-03-10", "food");
    ledger.add_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "all"), dec!(40));

    txn.kind = EntryType::Income;
    ledger.update_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "all"), Decimal::ZERO);

    txn.kind = EntryType::Expense;
    txn.amount = dec!(45);
    ledger.update_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "all"), dec!(45));
}

#[test]
fn test_update_date_out_of_range() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();

    let mut txn = expense("t1", dec!(50), "2024-03-31T23:59:59.999", "food");
    ledger.add_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(50));

    txn.date = parse_timestamp("2024-04-01").unwrap();
    ledger.update_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "food"), Decimal::ZERO);
}

#[test]
fn test_update_missing_transaction_is_noop() {
    let mut ledger = ledger();
    let txn = expense("ghost", dec!(5), "2024-03-01", "food");
    assert_eq!(ledger.update_transaction(&txn).unwrap(), 0);
    assert_eq!(ledger.delete_transaction(&txn.id).unwrap(), 0);
    assert!(ledger.transactions().unwrap().is_empty());
}

#[test]
fn test_duplicate_transaction_leaves_budget_alone() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    let txn = expense("t1", dec!(50), "2024-03-15", "food");
    ledger.add_transaction(&txn).unwrap();

    let err = ledger.add_transaction(&txn).unwrap_err();
    assert!(err.is_constraint());
    assert_eq!(spent(&mut ledger, "food"), dec!(50));
}

#[test]
fn test_new_budget_picks_up_existing_expenses() {
    let mut ledger = ledger();
    ledger
        .add_transaction(&expense("t1", dec!(20), "2024-03-05", "food"))
        .unwrap();
    ledger
        .add_transaction(&expense("t2", dec!(15), "2024-03-06", "food"))
        .unwrap();

    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(35));
}

#[test]
fn test_budget_rescope_recomputes() {
    let mut ledger = ledger();
    ledger
        .add_transaction(&expense("t1", dec!(20), "2024-03-05", "food"))
        .unwrap();
    ledger
        .add_transaction(&expense("t2", dec!(15), "2024-03-06", "housing"))
        .unwrap();

    let mut budget = march_budget("b", Some("food"));
    ledger.add_budget(&budget).unwrap();
    assert_eq!(spent(&mut ledger, "b"), dec!(20));

    budget.category_id = Some(CategoryId::new("housing"));
    assert_eq!(ledger.update_budget(&budget).unwrap(), 1);
    assert_eq!(spent(&mut ledger, "b"), dec!(15));
}

#[test]
fn test_delete_category_widens_budget() {
    let mut ledger = ledger();
    ledger
        .add_transaction(&expense("t1", dec!(20), "2024-03-05", "food"))
        .unwrap();
    ledger
        .add_transaction(&expense("t2", dec!(15), "2024-03-06", "housing"))
        .unwrap();
    ledger.add_budget(&march_budget("b", Some("food"))).unwrap();

    assert_eq!(ledger.delete_category(&CategoryId::new("food")).unwrap(), 1);
    let budget = ledger.budget(&BudgetId::new("b")).unwrap().unwrap();
    assert!(budget.category_id.is_none());
    assert_eq!(budget.spent, dec!(35));
}

#[test]
fn test_delete_budget() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("b", None)).unwrap();
    assert_eq!(ledger.delete_budget(&BudgetId::new("b")).unwrap(), 1);
    assert!(ledger.budgets().unwrap().is_empty());
}

// ── Pure sync helpers ─────────────────────────────────────────

#[test]
fn test_apply_new_expense_only_matching() {
    let budgets = vec![
        march_budget("food", Some("food")),
        march_budget("all", None),
        march_budget("housing", Some("housing")),
    ];
    let updates =
        sync::apply_new_expense(&budgets, &expense("t", dec!(7), "2024-03-02", "food")).unwrap();
    let ids: Vec<&str> = updates.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["food", "all"]);
    assert!(updates.iter().all(|(_, spent)| *spent == dec!(7)));
}

#[test]
fn test_recompute_skips_unchanged() {
    let mut stale = march_budget("stale", None);
    stale.spent = dec!(999);
    let fresh = march_budget("fresh", Some("housing"));
    let txns = vec![expense("t", dec!(10), "2024-03-02", "food")];

    let updates = sync::recompute_spent(&[stale, fresh], &txns).unwrap();
    assert_eq!(updates, vec![(BudgetId::new("stale"), dec!(10))]);
}

#[test]
fn test_sync_overflow_is_an_error() {
    let mut full = march_budget("full", None);
    full.spent = Decimal::MAX;
    let txn = expense("t", dec!(1), "2024-03-02", "food");

    let err = sync::apply_new_expense(std::slice::from_ref(&full), &txn).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let huge = vec![
        expense("a", Decimal::MAX, "2024-03-02", "food"),
        expense("b", Decimal::MAX, "2024-03-03", "food"),
    ];
    assert!(sync::spent_for(&full, &huge).is_err());
    assert!(sync::recompute_spent(&[full], &huge).is_err());
}

// ── Precision, limits, atomicity ──────────────────────────────

#[test]
fn test_sub_millisecond_expense_at_budget_end() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();

    // finer than storage keeps; built directly so no parser truncates it
    let mut txn = expense("t1", dec!(50), "2024-03-31T23:59:59.999", "food");
    txn.date += chrono::Duration::microseconds(500);
    ledger.add_transaction(&txn).unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(50));

    // a full recompute agrees with the incremental result
    ledger
        .add_transaction(&expense("other", dec!(1), "2024-05-01", "food"))
        .unwrap();
    ledger.delete_transaction(&TransactionId::new("other")).unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(50));
}

#[test]
fn test_parsed_sub_millisecond_expense_matches_budget() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-31T23:59:59.9995", "food"))
        .unwrap();
    assert_eq!(spent(&mut ledger, "food"), dec!(50));
}

#[test]
fn test_oversized_amounts_rejected_without_side_effects() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("all", None)).unwrap();

    let err = ledger
        .add_transaction(&expense("a", Decimal::MAX, "2024-03-10", "food"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    ledger
        .add_transaction(&expense("b", MAX_AMOUNT, "2024-03-11", "food"))
        .unwrap();
    ledger
        .add_transaction(&expense("c", MAX_AMOUNT, "2024-03-12", "food"))
        .unwrap();

    assert_eq!(ledger.transactions().unwrap().len(), 2);
    assert_eq!(spent(&mut ledger, "all"), MAX_AMOUNT * dec!(2));
}

#[test]
fn test_failed_spent_write_rolls_back_insert() {
    let db = Database::open_in_memory().unwrap();
    db.execute_batch(
        "CREATE TRIGGER lock_spent BEFORE UPDATE OF spent ON budgets
         BEGIN SELECT RAISE(ABORT, 'spent is locked'); END;",
    )
    .unwrap();
    let mut ledger = Ledger::from_database(db);
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();

    assert!(ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .is_err());
    assert!(ledger.transaction(&TransactionId::new("t1")).unwrap().is_none());
    assert_eq!(spent(&mut ledger, "food"), Decimal::ZERO);

    // an expense no budget tracks needs no spent write and still commits
    ledger
        .add_transaction(&expense("t2", dec!(5), "2024-06-01", "food"))
        .unwrap();
    assert_eq!(ledger.transactions().unwrap().len(), 1);
}

#[test]
fn test_failed_resync_rolls_back_delete() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .unwrap();

    if let Some(db) = ledger.db.as_ref() {
        db.execute_batch(
            "CREATE TRIGGER lock_spent BEFORE UPDATE OF spent ON budgets
             BEGIN SELECT RAISE(ABORT, 'spent is locked'); END;",
        )
        .unwrap();
    }
    assert!(ledger.delete_transaction(&TransactionId::new("t1")).is_err());
    assert!(ledger.transaction(&TransactionId::new("t1")).unwrap().is_some());
    assert_eq!(spent(&mut ledger, "food"), dec!(50));
}

// ── Categories, preferences, export ───────────────────────────

#[test]
fn test_category_lifecycle() {
    let mut ledger = ledger();
    let mut cat = Category::new("Pets".into(), "paw".into(), "#abcdef".into(), EntryType::Expense);
    ledger.add_category(&cat).unwrap();
    assert!(ledger.category(&cat.id).unwrap().is_some());

    cat.icon = "dog".into();
    assert_eq!(ledger.update_category(&cat).unwrap(), 1);
    assert_eq!(ledger.category(&cat.id).unwrap().unwrap().icon, "dog");

    assert!(ledger.add_category(&cat).unwrap_err().is_constraint());
}

#[test]
fn test_theme_preference() {
    let mut ledger = ledger();
    assert_eq!(ledger.theme().unwrap(), Theme::System);
    ledger.set_theme(Theme::Dark).unwrap();
    assert_eq!(ledger.theme().unwrap(), Theme::Dark);
}

#[test]
fn test_export_roundtrip_counts() {
    let mut ledger = ledger();
    ledger.add_budget(&march_budget("food", Some("food"))).unwrap();
    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .unwrap();

    let text = ledger.export_all().unwrap();
    let parsed = crate::export::parse_export(&text).unwrap();
    let current = ledger.snapshot().unwrap();
    assert_eq!(parsed.categories.len(), current.categories.len());
    assert_eq!(parsed.transactions.len(), current.transactions.len());
    assert_eq!(parsed.budgets.len(), current.budgets.len());
    assert_eq!(parsed.budgets[0].spent, dec!(50));

    // export is read-only
    assert_eq!(ledger.transactions().unwrap().len(), 1);
}

#[test]
fn test_export_csv_through_ledger() {
    let mut ledger = ledger();
    ledger
        .add_transaction(&expense("t1", dec!(50), "2024-03-15", "food"))
        .unwrap();
    let mut out = Vec::new();
    assert_eq!(ledger.export_transactions_csv(&mut out).unwrap(), 1);
    assert!(String::from_utf8(out).unwrap().contains("Food & Dining"));
}
