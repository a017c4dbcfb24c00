//! Platform-wide sustainability impact aggregate.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use ecowear_store::ImpactTotals;

use crate::api::AppState;
use crate::error::ApiError;

/// Fixed conversion constant: kilograms of CO2e counted as one planted tree.
const KG_CO2E_PER_TREE: f64 = 20.0;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_orders: i64,
    pub total_carbon_offset: f64,
    pub trees_planted: i64,
}

impl PlatformStats {
    /// Derive the published stats from the scanned totals. The tree count is
    /// floored, never rounded up.
    pub fn from_totals(totals: ImpactTotals) -> Self {
        Self {
            total_orders: totals.total_orders,
            total_carbon_offset: totals.total_carbon_offset,
            trees_planted: (totals.total_carbon_offset / KG_CO2E_PER_TREE).floor() as i64,
        }
    }
}

/// Platform totals across all orders. Public.
pub async fn platform_stats(
    State(state): State<AppState>,
) -> Result<Json<PlatformStats>, ApiError> {
    let totals = state.db.lock().await.platform_impact()?;
    Ok(Json(PlatformStats::from_totals(totals)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(total_orders: i64, total_carbon_offset: f64) -> ImpactTotals {
        ImpactTotals {
            total_orders,
            total_carbon_offset,
        }
    }

    #[test]
    fn zero_orders_mean_zero_everything() {
        let stats = PlatformStats::from_totals(totals(0, 0.0));
        assert_eq!(
            stats,
            PlatformStats {
                total_orders: 0,
                total_carbon_offset: 0.0,
                trees_planted: 0,
            }
        );
    }

    #[test]
    fn trees_are_floored() {
        // 15 kg is under one tree's worth.
        let stats = PlatformStats::from_totals(totals(1, 15.0));
        assert_eq!(stats.total_carbon_offset, 15.0);
        assert_eq!(stats.trees_planted, 0);

        // 40 kg is exactly two.
        let stats = PlatformStats::from_totals(totals(3, 40.0));
        assert_eq!(stats.trees_planted, 2);

        let stats = PlatformStats::from_totals(totals(3, 59.9));
        assert_eq!(stats.trees_planted, 2);
    }

    #[tokio::test]
    async fn handler_reads_through_the_store() {
        use crate::api::test_support::test_state;

        let state = test_state();
        let stats = platform_stats(State(state)).await.unwrap();
        assert_eq!(stats.0.total_orders, 0);
        assert_eq!(stats.0.trees_planted, 0);
    }
}
