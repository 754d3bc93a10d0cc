//! Market Desk: buying labor and land with capital.

use factor_core::{check_amount, EngineError, MarketState, Resource, ResourcePool};
use serde::{Deserialize, Serialize};

/// Quantities to buy in one transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub labor: f64,
    pub land: f64,
}

impl PurchaseOrder {
    /// An order for a single resource.
    pub fn single(resource: Resource, amount: f64) -> Result<Self, EngineError> {
        match resource {
            Resource::Labor => Ok(Self {
                labor: amount,
                land: 0.0,
            }),
            Resource::Land => Ok(Self {
                labor: 0.0,
                land: amount,
            }),
            Resource::Capital => Err(EngineError::NotPurchasable(resource)),
        }
    }
}

/// What a completed purchase bought and what it cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub labor: f64,
    pub land: f64,
    pub cost: f64,
}

impl PurchaseReceipt {
    pub fn describe(&self) -> String {
        format!(
            "Purchase: labor +{:.2}, land +{:.2}, cost {:.2}",
            self.labor, self.land, self.cost
        )
    }
}

/// Total capital an order would cost at current prices.
pub fn quote(order: &PurchaseOrder, market: &MarketState) -> Result<f64, EngineError> {
    check_amount("labor purchase", order.labor)?;
    check_amount("land purchase", order.land)?;
    Ok(order.labor * market.prices.labor + order.land * market.prices.land)
}

/// Fill an order against `pool`, returning the updated pool.
///
/// Nothing is modified on error; the caller commits the returned pool.
pub fn purchase_order(
    order: &PurchaseOrder,
    pool: &ResourcePool,
    market: &MarketState,
) -> Result<(ResourcePool, PurchaseReceipt), EngineError> {
    let cost = quote(order, market)?;
    if cost > pool.capital {
        return Err(EngineError::InsufficientCapital {
            cost,
            available: pool.capital,
        });
    }
    let mut next = *pool;
    next.labor += order.labor;
    next.land += order.land;
    next.capital -= cost;
    Ok((
        next,
        PurchaseReceipt {
            labor: order.labor,
            land: order.land,
            cost,
        },
    ))
}

/// Buy `amount` units of one resource.
pub fn purchase(
    resource: Resource,
    amount: f64,
    pool: &ResourcePool,
    market: &MarketState,
) -> Result<ResourcePool, EngineError> {
    let order = PurchaseOrder::single(resource, amount)?;
    purchase_order(&order, pool, market).map(|(next, _)| next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buying_land_spends_capital() {
        let pool = ResourcePool::new(100.0, 1000.0, 100.0);
        let next = purchase(Resource::Land, 5.0, &pool, &MarketState::default()).unwrap();
        assert_eq!(next, ResourcePool::new(100.0, 500.0, 105.0));
    }

    #[test]
    fn insufficient_capital_is_rejected() {
        let pool = ResourcePool::new(100.0, 50.0, 100.0);
        let err = purchase(Resource::Land, 10.0, &pool, &MarketState::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientCapital {
                cost: 1000.0,
                available: 50.0
            }
        );
    }

    #[test]
    fn capital_and_negative_amounts_are_refused() {
        let pool = ResourcePool::default();
        let m = MarketState::default();
        assert_eq!(
            purchase(Resource::Capital, 1.0, &pool, &m),
            Err(EngineError::NotPurchasable(Resource::Capital))
        );
        assert!(matches!(
            purchase(Resource::Labor, -1.0, &pool, &m),
            Err(EngineError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn combined_order_is_all_or_nothing() {
        let pool = ResourcePool::new(0.0, 1000.0, 0.0);
        let m = MarketState::default();
        let order = PurchaseOrder {
            labor: 10.0,
            land: 6.0,
        };
        assert!(matches!(
            purchase_order(&order, &pool, &m),
            Err(EngineError::InsufficientCapital { cost, .. }) if cost == 1100.0
        ));
        let ok = PurchaseOrder {
            labor: 10.0,
            land: 5.0,
        };
        let (next, receipt) = purchase_order(&ok, &pool, &m).unwrap();
        assert_eq!(next, ResourcePool::new(10.0, 0.0, 5.0));
        assert_eq!(receipt.cost, 1000.0);
        assert_eq!(receipt.describe(), "Purchase: labor +10.00, land +5.00, cost 1000.00");
    }

    #[test]
    fn zero_order_is_free() {
        let pool = ResourcePool::default();
        let (next, receipt) =
            purchase_order(&PurchaseOrder::default(), &pool, &MarketState::default()).unwrap();
        assert_eq!(next, pool);
        assert_eq!(receipt.cost, 0.0);
    }
}
