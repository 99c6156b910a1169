use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product catalog for the sales stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    Laptop,
    Tablet,
    Phone,
}

/// All known products, in catalog order.
pub const PRODUCTS: [Product; 3] = [Product::Laptop, Product::Tablet, Product::Phone];

impl Product {
    /// Returns the catalog name for this product.
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Laptop => "Laptop",
            Product::Tablet => "Tablet",
            Product::Phone => "Phone",
        }
    }

    /// Parses a catalog name back into a Product.
    ///
    /// # Returns
    /// Returns `None` if the name is not a known product.
    pub fn parse(name: &str) -> Option<Self> {
        PRODUCTS.iter().copied().find(|p| p.as_str() == name)
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sales region catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

/// All known regions, in catalog order.
pub const REGIONS: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];

impl Region {
    /// Returns the catalog name for this region.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
        }
    }

    /// Parses a catalog name back into a Region.
    ///
    /// # Returns
    /// Returns `None` if the name is not a known region.
    pub fn parse(name: &str) -> Option<Self> {
        REGIONS.iter().copied().find(|r| r.as_str() == name)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single transactional sales record.
///
/// Records are created by the generator, persisted by the uploader, and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique record id
    pub id: Uuid,
    /// Instant the sale occurred
    pub timestamp: DateTime<Utc>,
    /// Product sold
    pub product: Product,
    /// Region of the sale
    pub region: Region,
    /// Units sold (1..=10)
    pub quantity: u32,
    /// Revenue in currency units, rounded to 2 decimal places
    pub revenue: f64,
}

impl TransactionRecord {
    /// Creates a new TransactionRecord.
    pub fn new(
        id: Uuid,
        timestamp: DateTime<Utc>,
        product: Product,
        region: Region,
        quantity: u32,
        revenue: f64,
    ) -> Self {
        TransactionRecord {
            id,
            timestamp,
            product,
            region,
            quantity,
            revenue,
        }
    }
}
