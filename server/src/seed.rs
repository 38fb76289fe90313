//! Demo fixtures: one account per portal plus a small product catalog.

use anyhow::Result;
use chrono::Utc;
use entity::product;
use entity::user::Role;
use platform_db::{DbPool, NewUser};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::info;
use uuid::Uuid;

pub async fn seed(pool: &DbPool) -> Result<()> {
    seed_users(pool).await?;
    seed_products(pool).await?;
    info!("demo fixtures seeded");
    Ok(())
}

async fn seed_users(pool: &DbPool) -> Result<()> {
    let demo = [
        ("store_admin", "admin@lanepoint.test", "Avery Admin", Role::Admin, true),
        ("floor_manager", "manager@lanepoint.test", "Morgan Manager", Role::Manager, true),
        ("till_one", "cashier@lanepoint.test", "Casey Cashier", Role::Cashier, true),
        ("stockroom", "employee@lanepoint.test", "Emery Employee", Role::Employee, true),
        ("dairy_supplier", "supplier@lanepoint.test", "Sam Supplier", Role::Supplier, true),
        ("loyal_customer", "customer@lanepoint.test", "Charlie Customer", Role::Customer, true),
        // Left pending so the approval flow has something to approve.
        ("cashier_jane", "jane@lanepoint.test", "Jane Doe", Role::Cashier, false),
    ];
    for (username, email, display_name, role, is_active) in demo {
        let password_hash = platform_authn::hash_password(&format!("{username}-pass"))
            .map_err(|err| anyhow::anyhow!("seed password hash failed: {err}"))?;
        platform_db::create_user(
            pool,
            NewUser {
                username: username.into(),
                email: email.into(),
                display_name: display_name.into(),
                role,
                password_hash,
                is_active,
                phone: None,
                department: None,
                shift: None,
                employee_code: None,
            },
        )
        .await?;
    }
    Ok(())
}

async fn seed_products(pool: &DbPool) -> Result<()> {
    let catalog = [
        ("DAIRY-001", "Butter 250g", "dairy", 450_i64, 40, true),
        ("DAIRY-002", "Milk 1L", "dairy", 189, 120, true),
        ("DAIRY-003", "Yogurt 500g", "dairy", 99, 0, false),
        ("BAKERY-001", "Sourdough Loaf", "bakery", 549, 20, true),
        ("PRODUCE-001", "Bananas 1kg", "produce", 79, 200, true),
    ];
    let now: DateTimeWithTimeZone = Utc::now().into();
    for (sku, name, category, price_cents, stock_qty, is_active) in catalog {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku.into()),
            name: Set(name.into()),
            category: Set(category.into()),
            price_cents: Set(price_cents),
            stock_qty: Set(stock_qty),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(pool)
        .await?;
    }
    Ok(())
}
