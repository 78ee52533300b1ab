pub mod company;
pub mod inventory;
pub mod product;
pub mod sale;
pub mod supplier;
pub mod warehouse;
