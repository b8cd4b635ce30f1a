//! Volume boost plan catalogue.

use payment_verifier::Chain;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// A purchasable boost, priced in the chain's native asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Callback key, e.g. `24_hour`.
    pub key: String,
    pub description: String,
    pub amount: Decimal,
}

impl Plan {
    pub fn new(key: &str, description: &str, amount: Decimal) -> Self {
        Self {
            key: key.to_string(),
            description: description.to_string(),
            amount,
        }
    }
}

/// Plans offered on each chain, in menu order.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: HashMap<Chain, Vec<Plan>>,
}

/// Plan keys and descriptions, longest boost first.
const DURATIONS: [(&str, &str); 4] = [
    ("24_hour", "24 Hour Volume Boost"),
    ("12_hour", "12 Hour Volume Boost"),
    ("6_hour", "6 Hour Volume Boost"),
    ("3_hour", "3 Hour Volume Boost"),
];

fn priced(prices: [Decimal; 4]) -> Vec<Plan> {
    DURATIONS
        .iter()
        .zip(prices)
        .map(|((key, description), amount)| Plan::new(key, description, amount))
        .collect()
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let mut plans = HashMap::new();
        plans.insert(
            Chain::ETHEREUM,
            priced([
                Decimal::new(1, 1),
                Decimal::new(5, 2),
                Decimal::new(25, 3),
                Decimal::new(1, 2),
            ]),
        );
        plans.insert(
            Chain::BASE,
            priced([
                Decimal::new(8, 2),
                Decimal::new(4, 2),
                Decimal::new(2, 2),
                Decimal::new(8, 3),
            ]),
        );
        plans.insert(
            Chain::Solana,
            priced([
                Decimal::from(10),
                Decimal::from(5),
                Decimal::new(25, 1),
                Decimal::ONE,
            ]),
        );
        Self { plans }
    }
}

impl PlanCatalog {
    pub fn new(plans: HashMap<Chain, Vec<Plan>>) -> Self {
        Self { plans }
    }

    /// Plans for `chain`; empty if the chain has none.
    pub fn for_chain(&self, chain: Chain) -> &[Plan] {
        self.plans.get(&chain).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn find(&self, chain: Chain, key: &str) -> Option<&Plan> {
        self.for_chain(chain).iter().find(|p| p.key == key)
    }

    pub fn has_chain(&self, chain: Chain) -> bool {
        !self.for_chain(chain).is_empty()
    }
}
