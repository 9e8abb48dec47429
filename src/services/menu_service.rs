use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    domain::{
        cart::CatalogEntry,
        options::OptionGroup,
        pricing::{MAX_MENU_PRICE, MAX_OPTION_COST, round_money},
    },
    dto::menu::{CreateMenuItemRequest, Menu, MenuSection, UpdateMenuItemRequest},
    entity::{
        menu_item_options::{
            ActiveModel as OptionActive, Column as OptionCol, Entity as MenuItemOptions,
            Model as OptionModel,
        },
        menu_items::{ActiveModel, Column, Entity as MenuItems, Model as MenuItemModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{MenuCategory, MenuItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Menu item and option names share the `VARCHAR(100)` limit.
pub const MAX_NAME_LEN: usize = 100;

pub async fn list_menu(state: &AppState) -> AppResult<ApiResponse<Menu>> {
    let items = MenuItems::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;
    let mut groups = load_option_groups(&state.orm, items.iter().map(|item| item.id)).await?;

    let mut by_category: HashMap<MenuCategory, Vec<MenuItem>> = HashMap::new();
    for item in items {
        let options = groups.remove(&item.id).unwrap_or_default();
        let item = menu_item_from_entity(item, options)?;
        by_category.entry(item.category).or_default().push(item);
    }

    let categories = MenuCategory::ALL
        .into_iter()
        .filter_map(|category| {
            by_category
                .remove(&category)
                .map(|items| MenuSection { category, items })
        })
        .collect();

    Ok(ApiResponse::success(
        "Menu",
        Menu { categories },
        Some(Meta::empty()),
    ))
}

pub async fn get_menu_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<MenuItem>> {
    let item = MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Menu item"))?;
    let options = load_item_options(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Menu item",
        menu_item_from_entity(item, options)?,
        None,
    ))
}

/// Reads a menu item under a share lock so it cannot be deleted while a cart
/// line is written against it.
pub async fn catalog_entry(txn: &DatabaseTransaction, id: Uuid) -> AppResult<Option<CatalogEntry>> {
    let Some(item) = MenuItems::find_by_id(id).lock_shared().one(txn).await? else {
        return Ok(None);
    };
    let option_groups = load_item_options(txn, id).await?;
    Ok(Some(CatalogEntry {
        id: item.id,
        name: item.name,
        price: item.price,
        option_groups,
    }))
}

pub async fn create_menu_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_staff(user)?;
    let name = required_name(&payload.name)?;
    let price = checked_price(payload.price)?;
    validate_option_groups(&payload.options)?;

    let txn = state.orm.begin().await?;
    ensure_name_free(&txn, &name, None).await?;

    let item = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(price),
        category: Set(payload.category.as_str().to_string()),
        image: Set(payload.image),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;
    replace_options(&txn, item.id, &payload.options).await?;
    let options = load_item_options(&txn, item.id).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_create",
        "menu_items",
        serde_json::json!({ "menu_item_id": item.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_from_entity(item, options)?,
        None,
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = MenuItems::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Menu item"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = required_name(&name)?;
        ensure_name_free(&txn, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(checked_price(price)?);
    }
    if let Some(category) = payload.category {
        active.category = Set(category.as_str().to_string());
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    let item = active.update(&txn).await?;

    if let Some(options) = &payload.options {
        validate_option_groups(options)?;
        replace_options(&txn, id, options).await?;
    }
    let options = load_item_options(&txn, id).await?;
    txn.commit().await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_update",
        "menu_items",
        serde_json::json!({ "menu_item_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item updated",
        menu_item_from_entity(item, options)?,
        None,
    ))
}

/// Lines referring to the item keep their name and frozen total.
pub async fn delete_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = MenuItems::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Menu item"));
    }

    record_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_delete",
        "menu_items",
        serde_json::json!({ "menu_item_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item deleted",
        serde_json::json!({}),
        None,
    ))
}

fn menu_item_from_entity(model: MenuItemModel, options: Vec<OptionGroup>) -> AppResult<MenuItem> {
    let category = model
        .category
        .parse::<MenuCategory>()
        .map_err(|err| AppError::Internal(anyhow::anyhow!(err)))?;
    Ok(MenuItem {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category,
        image: model.image,
        options,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn option_group_from_entity(model: OptionModel) -> AppResult<OptionGroup> {
    Ok(OptionGroup {
        name: model.name,
        choices: serde_json::from_value(model.choices)?,
        required: model.required,
        additional_cost: model.additional_cost,
    })
}

async fn load_item_options<C: ConnectionTrait>(conn: &C, menu_item_id: Uuid) -> AppResult<Vec<OptionGroup>> {
    MenuItemOptions::find()
        .filter(OptionCol::MenuItemId.eq(menu_item_id))
        .order_by_asc(OptionCol::Position)
        .all(conn)
        .await?
        .into_iter()
        .map(option_group_from_entity)
        .collect()
}

async fn load_option_groups<C: ConnectionTrait>(
    conn: &C,
    ids: impl Iterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, Vec<OptionGroup>>> {
    let ids: Vec<Uuid> = ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = MenuItemOptions::find()
        .filter(OptionCol::MenuItemId.is_in(ids))
        .order_by_asc(OptionCol::MenuItemId)
        .order_by_asc(OptionCol::Position)
        .all(conn)
        .await?;

    let mut groups: HashMap<Uuid, Vec<OptionGroup>> = HashMap::new();
    for row in rows {
        let menu_item_id = row.menu_item_id;
        groups
            .entry(menu_item_id)
            .or_default()
            .push(option_group_from_entity(row)?);
    }
    Ok(groups)
}

async fn replace_options(
    txn: &DatabaseTransaction,
    menu_item_id: Uuid,
    options: &[OptionGroup],
) -> AppResult<()> {
    MenuItemOptions::delete_many()
        .filter(OptionCol::MenuItemId.eq(menu_item_id))
        .exec(txn)
        .await?;

    for (position, group) in options.iter().enumerate() {
        OptionActive {
            id: Set(Uuid::new_v4()),
            menu_item_id: Set(menu_item_id),
            name: Set(group.name.trim().to_string()),
            choices: Set(serde_json::to_value(&group.choices)?),
            required: Set(group.required),
            additional_cost: Set(round_money(group.additional_cost)),
            position: Set(position as i32),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn ensure_name_free(txn: &DatabaseTransaction, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = MenuItems::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(txn).await?.is_some() {
        return Err(AppError::Conflict(format!("menu item `{name}` already exists")));
    }
    Ok(())
}

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn checked_price(price: Decimal) -> AppResult<Decimal> {
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    let price = round_money(price);
    if price > MAX_MENU_PRICE {
        return Err(AppError::BadRequest(format!(
            "price must not exceed {MAX_MENU_PRICE}"
        )));
    }
    Ok(price)
}

fn validate_option_groups(groups: &[OptionGroup]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for group in groups {
        let name = group.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("option name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "option `{name}` must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if !seen.insert(name) {
            return Err(AppError::BadRequest(format!("duplicate option `{name}`")));
        }
        if group.choices.is_empty() {
            return Err(AppError::BadRequest(format!("option `{name}` has no choices")));
        }
        if group.additional_cost.is_sign_negative() {
            return Err(AppError::BadRequest(format!(
                "option `{name}` has a negative additional cost"
            )));
        }
        if round_money(group.additional_cost) > MAX_OPTION_COST {
            return Err(AppError::BadRequest(format!(
                "option `{name}` costs more than {MAX_OPTION_COST}"
            )));
        }
    }
    Ok(())
}
