use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    options::{OptionGroup, SelectedOptions},
    status::OrderStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MenuCategory {
    Starters,
    Mains,
    Seafood,
    Desserts,
}

impl MenuCategory {
    /// Display order on the menu.
    pub const ALL: [MenuCategory; 4] = [
        MenuCategory::Starters,
        MenuCategory::Mains,
        MenuCategory::Seafood,
        MenuCategory::Desserts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Starters => "starters",
            MenuCategory::Mains => "mains",
            MenuCategory::Seafood => "seafood",
            MenuCategory::Desserts => "desserts",
        }
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MenuCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown menu category `{s}`"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "299.00")]
    pub price: Decimal,
    pub category: MenuCategory,
    pub image: Option<String>,
    pub options: Vec<OptionGroup>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    #[schema(value_type = String, example = "897.00")]
    pub total_amount: Decimal,
    #[schema(value_type = String, example = "1058.46")]
    pub total_with_tax: Decimal,
    pub special_instructions: String,
    pub pickup_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub name: String,
    /// False once the menu item has been removed from the catalog.
    pub available: bool,
    pub quantity: i32,
    #[schema(value_type = Object)]
    pub selected_options: SelectedOptions,
    #[schema(value_type = String, example = "598.00")]
    pub item_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "19:30:00")]
    pub time: NaiveTime,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
}
