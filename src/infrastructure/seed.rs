use crate::entities::{countries, currencies, prelude::*};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::info;

const CURRENCIES: &[(&str, &str, &str, i32)] = &[
    ("COP", "Peso colombiano", "$", 0),
    ("MXN", "Peso mexicano", "$", 2),
    ("USD", "US Dollar", "US$", 2),
    ("EUR", "Euro", "€", 2),
];

const COUNTRIES: &[(&str, &str, &str)] = &[
    ("CO", "Colombia", "COP"),
    ("MX", "México", "MXN"),
    ("US", "United States", "USD"),
    ("ES", "España", "EUR"),
];

/// Inserts the default currencies and countries into empty tables
pub async fn seed_reference_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    if Currencies::find().count(db).await? == 0 {
        info!("🌱 Seeding currencies...");
        Currencies::insert_many(CURRENCIES.iter().map(|(code, name, symbol, digits)| {
            currencies::ActiveModel {
                id: Set(code.to_string()),
                name: Set(name.to_string()),
                symbol: Set(symbol.to_string()),
                decimal_digits: Set(*digits),
            }
        }))
        .exec(db)
        .await?;
    }

    if Countries::find().count(db).await? == 0 {
        info!("🌱 Seeding countries...");
        Countries::insert_many(COUNTRIES.iter().map(|(code, name, currency)| {
            countries::ActiveModel {
                id: Set(code.to_string()),
                name: Set(name.to_string()),
                currency_id: Set(Some(currency.to_string())),
            }
        }))
        .exec(db)
        .await?;
    }

    Ok(())
}
