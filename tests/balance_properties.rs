//! Property tests for the balance ledger invariants.

mod common;

use proptest::prelude::*;

use common::{TestContext, USER_ID};

#[derive(Debug, Clone)]
enum LedgerOp {
    Credit(i64),
    Debit(i64),
    AdminSet(i64),
    AdminTake(i64),
}

fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (1i64..500).prop_map(LedgerOp::Credit),
        (1i64..500).prop_map(LedgerOp::Debit),
        (0i64..500).prop_map(LedgerOp::AdminSet),
        (1i64..500).prop_map(LedgerOp::AdminTake),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any operation sequence keeps the balance non-negative, and a failed
    /// debit leaves it untouched.
    #[test]
    fn balance_never_goes_negative(ops in prop::collection::vec(ledger_op(), 1..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let ctx = TestContext::new();
            let users = &ctx.services.users;
            let mut expected: i64 = 0;

            for op in ops {
                match op {
                    LedgerOp::Credit(amount) => {
                        users.credit(USER_ID, amount).await;
                        expected += amount;
                    }
                    LedgerOp::Debit(amount) => {
                        let before = users.get_balance(USER_ID).await;
                        let ok = users.debit(USER_ID, amount).await;
                        if ok {
                            expected -= amount;
                        } else {
                            // Rejected debit must not mutate
                            prop_assert_eq!(users.get_balance(USER_ID).await, before);
                        }
                    }
                    LedgerOp::AdminSet(amount) => {
                        users.set_balance(USER_ID, amount).await;
                        expected = amount;
                    }
                    LedgerOp::AdminTake(amount) => {
                        users.take_balance(USER_ID, amount).await;
                        expected = (expected - amount).max(0);
                    }
                }
                let balance = users.get_balance(USER_ID).await;
                prop_assert!(balance >= 0);
                prop_assert_eq!(balance, expected);
            }
            Ok(())
        })?;
    }
}
