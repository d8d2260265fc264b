//! Derived statistics views
//!
//! Computed client-side by reducing a lightweight projection of all rows in
//! a family; the sync layer patches these counters in place after create and
//! delete so dashboards stay consistent without a refetch. All decrements
//! are floored at zero.

use super::{GalleryCategory, PaymentStatus, ProductCategory, ServiceStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn decrement(map: &mut BTreeMap<String, u64>, key: &str) {
    if let Some(count) = map.get_mut(key) {
        *count = count.saturating_sub(1);
    }
}

/// Aggregates over the services collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub cancelled: u64,
    pub paid: u64,
    pub payment_pending: u64,
    pub overdue: u64,
    /// Sum of stored totals across all services
    pub total_revenue: Decimal,
    /// Sum of stored totals across services marked paid
    pub collected_revenue: Decimal,
    pub by_equipment: BTreeMap<String, u64>,
}

impl ServiceStats {
    pub fn record_service(
        &mut self,
        status: ServiceStatus,
        payment: PaymentStatus,
        total_cost: Decimal,
        equipment_type: &str,
    ) {
        self.total += 1;
        match status {
            ServiceStatus::Completed => self.completed += 1,
            ServiceStatus::Pending => self.pending += 1,
            ServiceStatus::Cancelled => self.cancelled += 1,
        }
        match payment {
            PaymentStatus::Paid => self.paid += 1,
            PaymentStatus::Pending => self.payment_pending += 1,
            PaymentStatus::Overdue => self.overdue += 1,
        }
        self.total_revenue += total_cost;
        if payment == PaymentStatus::Paid {
            self.collected_revenue += total_cost;
        }
        *self
            .by_equipment
            .entry(equipment_type.to_string())
            .or_default() += 1;
    }

    pub fn remove_service(
        &mut self,
        status: ServiceStatus,
        payment: PaymentStatus,
        total_cost: Decimal,
        equipment_type: &str,
    ) {
        self.total = self.total.saturating_sub(1);
        match status {
            ServiceStatus::Completed => self.completed = self.completed.saturating_sub(1),
            ServiceStatus::Pending => self.pending = self.pending.saturating_sub(1),
            ServiceStatus::Cancelled => self.cancelled = self.cancelled.saturating_sub(1),
        }
        match payment {
            PaymentStatus::Paid => self.paid = self.paid.saturating_sub(1),
            PaymentStatus::Pending => self.payment_pending = self.payment_pending.saturating_sub(1),
            PaymentStatus::Overdue => self.overdue = self.overdue.saturating_sub(1),
        }
        self.total_revenue = (self.total_revenue - total_cost).max(Decimal::ZERO);
        if payment == PaymentStatus::Paid {
            self.collected_revenue = (self.collected_revenue - total_cost).max(Decimal::ZERO);
        }
        decrement(&mut self.by_equipment, equipment_type);
    }
}

/// Aggregates over the gallery collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GalleryStats {
    pub total: u64,
    pub featured: u64,
    /// Sum of all ratings; divide by `total` for the average
    pub rating_sum: u64,
    pub by_category: BTreeMap<String, u64>,
}

impl GalleryStats {
    pub fn record_item(&mut self, category: GalleryCategory, rating: u8, featured: bool) {
        self.total += 1;
        if featured {
            self.featured += 1;
        }
        self.rating_sum += u64::from(rating);
        *self.by_category.entry(category.as_str().to_string()).or_default() += 1;
    }

    pub fn remove_item(&mut self, category: GalleryCategory, rating: u8, featured: bool) {
        self.total = self.total.saturating_sub(1);
        if featured {
            self.featured = self.featured.saturating_sub(1);
        }
        self.rating_sum = self.rating_sum.saturating_sub(u64::from(rating));
        decrement(&mut self.by_category, category.as_str());
    }

    pub fn average_rating(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.rating_sum as f64 / self.total as f64
        }
    }
}

/// Aggregates over the shop catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShopStats {
    pub total: u64,
    pub in_stock: u64,
    pub featured: u64,
    /// Sum of `price * stock_quantity` over the catalog
    pub inventory_value: Decimal,
    pub by_category: BTreeMap<String, u64>,
}

impl ShopStats {
    pub fn record_product(
        &mut self,
        category: ProductCategory,
        price: Decimal,
        stock_quantity: u32,
        in_stock: bool,
        featured: bool,
    ) {
        self.total += 1;
        if in_stock {
            self.in_stock += 1;
        }
        if featured {
            self.featured += 1;
        }
        self.inventory_value += price * Decimal::from(stock_quantity);
        *self.by_category.entry(category.as_str().to_string()).or_default() += 1;
    }

    pub fn remove_product(
        &mut self,
        category: ProductCategory,
        price: Decimal,
        stock_quantity: u32,
        in_stock: bool,
        featured: bool,
    ) {
        self.total = self.total.saturating_sub(1);
        if in_stock {
            self.in_stock = self.in_stock.saturating_sub(1);
        }
        if featured {
            self.featured = self.featured.saturating_sub(1);
        }
        self.inventory_value =
            (self.inventory_value - price * Decimal::from(stock_quantity)).max(Decimal::ZERO);
        decrement(&mut self.by_category, category.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_counters_round_trip() {
        let mut stats = ServiceStats::default();
        stats.record_service(
            ServiceStatus::Completed,
            PaymentStatus::Paid,
            Decimal::from(1500),
            "imaging",
        );
        stats.record_service(
            ServiceStatus::Pending,
            PaymentStatus::Pending,
            Decimal::from(300),
            "imaging",
        );
        assert_eq!(stats.total, 2);
        assert_eq!(stats.total_revenue, Decimal::from(1800));
        assert_eq!(stats.collected_revenue, Decimal::from(1500));
        assert_eq!(stats.by_equipment.get("imaging"), Some(&2));

        stats.remove_service(
            ServiceStatus::Completed,
            PaymentStatus::Paid,
            Decimal::from(1500),
            "imaging",
        );
        assert_eq!(stats.total, 1);
        assert_eq!(stats.collected_revenue, Decimal::ZERO);
        assert_eq!(stats.by_equipment.get("imaging"), Some(&1));
    }

    #[test]
    fn decrements_floor_at_zero() {
        let mut stats = GalleryStats::default();
        stats.remove_item(GalleryCategory::Equipment, 5, true);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.featured, 0);
        assert_eq!(stats.rating_sum, 0);
    }

    #[test]
    fn shop_inventory_value_tracks_stock() {
        let mut stats = ShopStats::default();
        stats.record_product(ProductCategory::Imaging, Decimal::from(200), 3, true, false);
        assert_eq!(stats.inventory_value, Decimal::from(600));
        stats.remove_product(ProductCategory::Imaging, Decimal::from(200), 3, true, false);
        assert_eq!(stats.inventory_value, Decimal::ZERO);
        assert_eq!(stats.in_stock, 0);
    }

    #[test]
    fn average_rating() {
        let mut stats = GalleryStats::default();
        assert_eq!(stats.average_rating(), 0.0);
        stats.record_item(GalleryCategory::BeforeAfter, 4, false);
        stats.record_item(GalleryCategory::Equipment, 5, false);
        assert!((stats.average_rating() - 4.5).abs() < f64::EPSILON);
    }
}
