pub mod accessory;
pub mod customer;
pub mod equipment;
pub mod interaction;
