//! Payment, merchant and customer records plus the storage traits the
//! lifecycle service is written against.

pub mod repository;
pub mod types;

pub use repository::{CustomerRepository, MerchantRepository, PaymentRepository};
pub use types::{
    CreatePaymentRequest, Customer, Merchant, Pagination, Payment, PaymentMethod, PaymentStatus,
};
