pub use super::countries::Entity as Countries;
pub use super::currencies::Entity as Currencies;
pub use super::invoices::Entity as Invoices;
pub use super::producers::Entity as Producers;
