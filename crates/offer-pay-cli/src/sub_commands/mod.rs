pub mod create_offer;
pub mod pay;
