pub mod prelude;

pub mod countries;
pub mod currencies;
pub mod invoices;
pub mod producers;
