pub mod send_transaction_service;
pub mod service_info;
pub mod tpu_connection;
pub mod tpu_info;

#[macro_use]
extern crate log;
