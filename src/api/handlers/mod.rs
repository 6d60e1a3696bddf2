pub mod form;
pub mod health;
pub mod invoices;
pub mod producers;
pub mod reference;
