use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::options::OptionGroup,
    models::{MenuCategory, MenuItem},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuSection {
    pub category: MenuCategory,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Menu {
    pub categories: Vec<MenuSection>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub category: MenuCategory,
    pub image: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
}

/// Fields left out are unchanged; `options`, when given, replaces all groups.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub category: Option<MenuCategory>,
    pub image: Option<String>,
    pub options: Option<Vec<OptionGroup>>,
}
