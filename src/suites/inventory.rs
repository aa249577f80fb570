//! Inventory demonstration suite
//!
//! A passing suite built around one store opened in suite setup. Stock
//! reserved by one test stays reserved for the tests after it.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::assertions::{
    assert_equal, assert_equal_msg, assert_false, assert_not_null, assert_null, assert_throws,
    assert_true_msg, fail, Message,
};
use crate::executor::{TestMethod, TestSuite};
use crate::models::{raise, throw, Outcome, TestError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("cannot reserve {requested} x {item}, only {available} left")]
    OutOfStock {
        item: String,
        requested: u32,
        available: u32,
    },
}

#[derive(Debug, Error)]
#[error("item name must not be empty")]
pub struct EmptyItemName;

/// In-memory stock keeper
#[derive(Debug, Default)]
pub struct Store {
    stock: BTreeMap<String, u32>,
}

impl Store {
    pub fn with_stock<'a>(items: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        Self {
            stock: items
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
        }
    }

    pub fn get(&self, item: &str) -> Option<u32> {
        self.stock.get(item).copied()
    }

    pub fn reserve(&mut self, item: &str, count: u32) -> Result<u32, InventoryError> {
        let available = self
            .stock
            .get_mut(item)
            .ok_or_else(|| InventoryError::UnknownItem(item.to_string()))?;
        if *available < count {
            return Err(InventoryError::OutOfStock {
                item: item.to_string(),
                requested: count,
                available: *available,
            });
        }
        *available -= count;
        Ok(*available)
    }

    pub fn restock(&mut self, item: &str, count: u32) -> u32 {
        if item.is_empty() {
            throw(EmptyItemName);
        }
        let entry = self.stock.entry(item.to_string()).or_insert(0);
        *entry += count;
        *entry
    }
}

#[derive(Debug, Default)]
pub struct InventorySuite {
    store: Option<Store>,
    lookups: u32,
    restocked: u32,
}

impl InventorySuite {
    fn store(&mut self) -> Result<&mut Store, TestError> {
        self.store
            .as_mut()
            .ok_or_else(|| TestError::Failed("store is not open".into()))
    }

    fn lookup(&mut self, item: &str) -> Result<Option<u32>, TestError> {
        self.lookups += 1;
        Ok(self.store()?.get(item))
    }

    fn check_invariants(&mut self) -> Outcome {
        let lookups = self.lookups;
        assert_true_msg(
            lookups <= 2,
            Message::lazy(move || format!("a single test performed {lookups} lookups")),
        )
    }
}

impl TestSuite for InventorySuite {
    fn name() -> &'static str {
        "InventorySuite"
    }

    fn create() -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn methods() -> Vec<TestMethod<Self>> {
        vec![
            TestMethod::suite_setup("openStore", |s: &mut Self| {
                s.store = Some(Store::with_stock([("apple", 10), ("pear", 4)]));
                Ok(())
            }),
            TestMethod::case_setup("resetLookups", |s: &mut Self| {
                s.lookups = 0;
                Ok(())
            }),
            TestMethod::test("lookupKnownItem", |s: &mut Self| {
                assert_not_null(&s.lookup("apple")?)
            }),
            TestMethod::test("lookupUnknownItem", |s: &mut Self| {
                assert_null(&s.lookup("durian")?)
            }),
            TestMethod::test("reserveStock", |s: &mut Self| {
                let left = s.store()?.reserve("apple", 3).map_err(raise)?;
                assert_equal(7, left)
            }),
            TestMethod::test("stockReflectsReservation", |s: &mut Self| {
                let apples = s.lookup("apple")?;
                assert_equal_msg(
                    Some(7),
                    apples,
                    Message::lazy(|| "reservation made by reserveStock is visible".to_string()),
                )
            })
            .depends_on(["reserveStock"]),
            TestMethod::test("reserveTooMany", |s: &mut Self| {
                s.store()?.reserve("pear", 100).map_err(raise)?;
                Ok(())
            })
            .expect::<InventoryError>()
            .display_name("Reserving more than available raises"),
            TestMethod::test("rejectsEmptyName", |s: &mut Self| {
                let store = s.store()?;
                let raised = assert_throws::<EmptyItemName, _>(|| {
                    store.restock("", 1);
                    Ok(())
                })?;
                assert_equal("item name must not be empty", raised.message())
            }),
            TestMethod::test("restock", |s: &mut Self| {
                s.restocked += 1;
                let pears = s.store()?.restock("pear", 1);
                assert_equal(4 + s.restocked, pears)
            })
            .repeat(3),
            TestMethod::test("unknownItemIsNotReserved", |s: &mut Self| {
                match s.store()?.reserve("durian", 1) {
                    Ok(_) => fail("reserved an item that is not stocked")?,
                    Err(err) => assert_equal(InventoryError::UnknownItem("durian".into()), err)?,
                }
                assert_false(s.lookup("durian")?.is_some())
            }),
            TestMethod::case_teardown("checkInvariants", |s: &mut Self| s.check_invariants()),
            TestMethod::suite_teardown("closeStore", |s: &mut Self| {
                s.store = None;
                Ok(())
            }),
        ]
    }
}
