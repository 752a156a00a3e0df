//! Filter-aggregate pipeline.
//!
//! Turns a product/region selection into the four views the dashboard draws:
//! the matching rows, totals per product, totals per region, and a dense
//! product x region grid. Pure: the same selection over the same records
//! always yields the same views.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::data::{is_known_product, is_known_region, SalesRecord, PRODUCTS, REGIONS};

/// Label -> summed sales. Only labels present in the input appear.
pub type Totals = BTreeMap<String, i64>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub products: BTreeSet<String>,
    pub regions: BTreeSet<String>,
}

impl Selection {
    pub fn new<P, R, S, T>(products: P, regions: R) -> Self
    where
        P: IntoIterator<Item = S>,
        R: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            products: products.into_iter().map(Into::into).collect(),
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    /// Every declared product and region.
    pub fn all() -> Self {
        Self::new(PRODUCTS, REGIONS)
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.products.contains(&record.product) && self.regions.contains(&record.region)
    }

    /// Selected labels outside the declared sets. They match no row.
    pub fn unknown_labels(&self) -> Vec<&str> {
        let products = self.products.iter().filter(|p| !is_known_product(p));
        let regions = self.regions.iter().filter(|r| !is_known_region(r));
        products.chain(regions).map(String::as_str).collect()
    }
}

/// Dense product x region grid. Rows follow `products`, columns follow
/// `regions`; pairs with no rows hold 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    pub products: Vec<String>,
    pub regions: Vec<String>,
    pub cells: Vec<Vec<i64>>,
}

impl HeatmapGrid {
    pub fn value(&self, product: &str, region: &str) -> i64 {
        let row = self.products.iter().position(|p| p == product);
        let col = self.regions.iter().position(|r| r == region);
        match (row, col) {
            (Some(i), Some(j)) => self.cells[i][j],
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells holding a non-zero total.
    pub fn populated(&self) -> usize {
        self.cells.iter().flatten().filter(|v| **v != 0).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedViews {
    pub filtered: Vec<SalesRecord>,
    pub product_totals: Totals,
    pub region_totals: Totals,
    pub heatmap: HeatmapGrid,
}

impl DerivedViews {
    pub fn total_sales(&self) -> i64 {
        self.filtered.iter().map(|r| r.sales).sum()
    }
}

pub fn filter_records(selection: &Selection, records: &[SalesRecord]) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect()
}

pub fn totals_by<F>(records: &[SalesRecord], key: F) -> Totals
where
    F: Fn(&SalesRecord) -> &str,
{
    let mut totals = Totals::new();
    for r in records {
        *totals.entry(key(r).to_string()).or_insert(0) += r.sales;
    }
    totals
}

/// Distinct labels in first-seen order, then stably reordered by their
/// position in `declared` (labels outside it go last).
fn observed_labels<F>(records: &[SalesRecord], key: F, declared: &[&str]) -> Vec<String>
where
    F: Fn(&SalesRecord) -> &str,
{
    let mut seen: Vec<String> = Vec::new();
    for r in records {
        let k = key(r);
        if !seen.iter().any(|s| s == k) {
            seen.push(k.to_string());
        }
    }
    seen.sort_by_key(|l| {
        declared
            .iter()
            .position(|d| d == l)
            .unwrap_or(declared.len())
    });
    seen
}

pub fn heatmap(records: &[SalesRecord]) -> HeatmapGrid {
    let products = observed_labels(records, |r| r.product.as_str(), &PRODUCTS);
    let regions = observed_labels(records, |r| r.region.as_str(), &REGIONS);
    let mut cells = vec![vec![0i64; regions.len()]; products.len()];
    for r in records {
        let i = products.iter().position(|p| *p == r.product);
        let j = regions.iter().position(|g| *g == r.region);
        if let (Some(i), Some(j)) = (i, j) {
            cells[i][j] += r.sales;
        }
    }
    HeatmapGrid {
        products,
        regions,
        cells,
    }
}

/// Filter `records` by `selection` and derive all four views.
pub fn update(selection: &Selection, records: &[SalesRecord]) -> DerivedViews {
    let filtered = filter_records(selection, records);
    let product_totals = totals_by(&filtered, |r| r.product.as_str());
    let region_totals = totals_by(&filtered, |r| r.region.as_str());
    let heatmap = heatmap(&filtered);
    DerivedViews {
        filtered,
        product_totals,
        region_totals,
        heatmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(day: u32, sales: i64, product: &str, region: &str) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            sales,
            product: product.to_string(),
            region: region.to_string(),
        }
    }

    #[test]
    fn test_filter_is_conjunction() {
        let rows = vec![
            rec(1, 600, "Product A", "North"),
            rec(2, 700, "Product A", "South"),
            rec(3, 800, "Product B", "North"),
        ];
        let sel = Selection::new(["Product A"], ["North"]);
        let out = filter_records(&sel, &rows);
        assert_eq!(out, vec![rows[0].clone()]);
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let sel = Selection::new(["Product A", "Product A"], ["North", "North", "East"]);
        assert_eq!(sel.products.len(), 1);
        assert_eq!(sel.regions.len(), 2);
    }

    #[test]
    fn test_unknown_labels() {
        let sel = Selection::new(["Product A", "Gadget"], ["Mars", "North"]);
        assert_eq!(sel.unknown_labels(), vec!["Gadget", "Mars"]);
        assert!(Selection::all().unknown_labels().is_empty());
    }

    #[test]
    fn test_totals_are_sparse() {
        let rows = vec![rec(1, 600, "Product C", "West"), rec(2, 900, "Product C", "East")];
        let totals = totals_by(&rows, |r| r.product.as_str());
        assert_eq!(totals.len(), 1);
        assert_eq!(totals["Product C"], 1500);
        assert!(!totals.contains_key("Product A"));
    }

    #[test]
    fn test_heatmap_zero_fills_missing_pairs() {
        let rows = vec![
            rec(1, 600, "Product B", "East"),
            rec(2, 700, "Product A", "North"),
            rec(3, 50, "Product A", "North"),
        ];
        let grid = heatmap(&rows);
        assert_eq!(grid.products, vec!["Product A", "Product B"]);
        assert_eq!(grid.regions, vec!["North", "East"]);
        assert_eq!(grid.cells, vec![vec![750, 0], vec![0, 600]]);
        assert_eq!(grid.value("Product B", "North"), 0);
        assert_eq!(grid.value("Product C", "West"), 0);
        assert_eq!(grid.populated(), 2);
    }

    #[test]
    fn test_heatmap_unknown_labels_sort_last() {
        let rows = vec![rec(1, 600, "Gadget", "Mars"), rec(2, 700, "Product C", "South")];
        let grid = heatmap(&rows);
        assert_eq!(grid.products, vec!["Product C", "Gadget"]);
        assert_eq!(grid.regions, vec!["South", "Mars"]);
    }

    #[test]
    fn test_update_empty_input() {
        let views = update(&Selection::all(), &[]);
        assert!(views.filtered.is_empty());
        assert!(views.product_totals.is_empty());
        assert!(views.region_totals.is_empty());
        assert!(views.heatmap.is_empty());
        assert_eq!(views.total_sales(), 0);
    }
}
